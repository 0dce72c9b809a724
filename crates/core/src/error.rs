//! Error types for the region-stitch-core library.
//!
//! Only conditions worth reporting upstream are errors. Rejected gestures and
//! no-op stitches are expected and frequent, so they are reported through
//! status enums ([`crate::selection::GestureOutcome`],
//! [`crate::compositor::StitchOutcome`]) instead.

use crate::selection::GroupId;
use thiserror::Error;

/// Errors that can occur within the region-stitch-core library.
#[derive(Error, Debug)]
pub enum StitchError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// `union` was asked to fold an empty list of solids.
    #[error("Cannot union an empty list of solids")]
    EmptyUnion,

    /// Every populated group cropped to zero volume against the image.
    #[error("Nothing to merge: no selection overlaps the image")]
    NothingToMerge,

    /// An operation that needs a composite was called before stitching.
    #[error("The image has not been stitched yet")]
    NotStitched,

    /// A group has no cropped region to map or render.
    #[error("Group {0} has no cropped region")]
    MissingRegion(GroupId),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// A mapped pixel rectangle has zero area after clamping.
    #[error("Selection area is empty or invalid")]
    EmptySelection,

    /// The text recognition collaborator failed.
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StitchError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a text recognition error with the given message.
    pub fn recognition(msg: impl Into<String>) -> Self {
        Self::Recognition(msg.into())
    }
}

/// A convenient alias for Result with [`StitchError`].
pub type Result<T> = std::result::Result<T, StitchError>;
