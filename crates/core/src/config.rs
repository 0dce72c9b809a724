//! Configuration loading.
//!
//! Values come from the environment (including a `.env` file). Every geometry
//! tunable has a default, so only OCR needs anything set.

use crate::error::{Result, StitchError};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_MIN_SELECTION_SIZE: f64 = 0.025;
pub const DEFAULT_SEPARATOR_HEIGHT: f64 = 0.05;
pub const DEFAULT_FIT_PADDING: f64 = 1.8;
pub const DEFAULT_ROTATION_SMOOTHING: f64 = 1.0;
pub const DEFAULT_ROTATE_SENSITIVITY: f64 = 0.01;
pub const DEFAULT_SEPARATOR_TOKEN: &str = "###";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Needed only when running OCR through Gemini.
    pub gemini_api_key: Option<String>,
    pub model_name: String,
    /// Smallest accepted selection edge, in world units.
    pub min_selection_size: f64,
    /// World-space height of the marker inserted between stacked groups.
    pub separator_height: f64,
    /// Frame extent relative to the composite after a stitch.
    pub fit_padding: f64,
    /// Fraction of the remaining angle applied per step. `1.0` snaps.
    pub rotation_smoothing: f64,
    /// Radians of rotation per pointer pixel in rotate mode.
    pub rotate_sensitivity: f64,
    pub separator_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            min_selection_size: DEFAULT_MIN_SELECTION_SIZE,
            separator_height: DEFAULT_SEPARATOR_HEIGHT,
            fit_padding: DEFAULT_FIT_PADDING,
            rotation_smoothing: DEFAULT_ROTATION_SMOOTHING,
            rotate_sensitivity: DEFAULT_ROTATE_SENSITIVITY,
            separator_token: DEFAULT_SEPARATOR_TOKEN.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let defaults = Self::default();
        let config = Self {
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model_name: env::var("GEMINI_MODEL").unwrap_or(defaults.model_name),
            min_selection_size: parse_var(
                "STITCH_MIN_SELECTION_SIZE",
                defaults.min_selection_size,
            )?,
            separator_height: parse_var("STITCH_SEPARATOR_HEIGHT", defaults.separator_height)?,
            fit_padding: parse_var("STITCH_FIT_PADDING", defaults.fit_padding)?,
            rotation_smoothing: parse_var(
                "STITCH_ROTATION_SMOOTHING",
                defaults.rotation_smoothing,
            )?,
            rotate_sensitivity: parse_var(
                "STITCH_ROTATE_SENSITIVITY",
                defaults.rotate_sensitivity,
            )?,
            separator_token: env::var("STITCH_SEPARATOR_TOKEN").unwrap_or(defaults.separator_token),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the API key or the error the OCR path should surface.
    pub fn require_api_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or_else(|| StitchError::MissingEnvVar("GEMINI_API_KEY".to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.min_selection_size.is_finite() && self.min_selection_size >= 0.0) {
            return Err(StitchError::config("min selection size must be non-negative"));
        }
        if !(self.separator_height.is_finite() && self.separator_height >= 0.0) {
            return Err(StitchError::config("separator height must be non-negative"));
        }
        if !(self.fit_padding.is_finite() && self.fit_padding > 0.0) {
            return Err(StitchError::config("fit padding must be positive"));
        }
        if !(self.rotation_smoothing > 0.0 && self.rotation_smoothing <= 1.0) {
            return Err(StitchError::config("rotation smoothing must be in (0, 1]"));
        }
        if !self.rotate_sensitivity.is_finite() {
            return Err(StitchError::config("rotate sensitivity must be finite"));
        }
        if self.separator_token.trim().is_empty() {
            return Err(StitchError::config("separator token must not be blank"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| StitchError::config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.config.gemini_api_key = Some(key.to_string()).filter(|k| !k.is_empty());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model_name = model.to_string();
        self
    }

    pub fn with_min_selection_size(mut self, size: f64) -> Self {
        self.config.min_selection_size = size;
        self
    }

    pub fn with_separator_height(mut self, height: f64) -> Self {
        self.config.separator_height = height;
        self
    }

    pub fn with_fit_padding(mut self, padding: f64) -> Self {
        self.config.fit_padding = padding;
        self
    }

    pub fn with_rotation_smoothing(mut self, smoothing: f64) -> Self {
        self.config.rotation_smoothing = smoothing;
        self
    }

    pub fn with_rotate_sensitivity(mut self, sensitivity: f64) -> Self {
        self.config.rotate_sensitivity = sensitivity;
        self
    }

    pub fn with_separator_token(mut self, token: &str) -> Self {
        self.config.separator_token = token.to_string();
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
