//! Per-image editing session.
//!
//! [`StitchSession`] is the context object that owns the scene, the group
//! store and the input components, and hands each of them what it needs
//! on every call. Input arrives through [`StitchSession::handle_pointer`]
//! and the rotate modifier; everything runs synchronously on the caller's
//! thread.

use crate::camera::Viewport;
use crate::compositor::{Compositor, StitchOutcome};
use crate::config::Config;
use crate::error::{Result, StitchError};
use crate::image_processing::{ImageProcessor, RenderedComposite};
use crate::mapper::{CoordinateMapper, PixelPoint, PixelRect};
use crate::persistence::{GroupRecord, ImageRecord};
use crate::projector::Projector;
use crate::recognition::{build_prompt, split_recognized_text};
use crate::rotation::{RotationController, RotationState};
use crate::scene::{Scene, SourceImage};
use crate::selection::{GestureOutcome, GroupId, PointerButton, SelectionDrawer};
use crate::settings::Settings;
use crate::store::SelectionGroupStore;
use glam::DVec2;
use image::DynamicImage;
use std::time::Instant;

/// Pointer input as delivered by the input routing layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down {
        x: f64,
        y: f64,
        button: PointerButton,
        /// The pointer is over a UI surface rather than the image.
        over_ui: bool,
    },
    Move {
        x: f64,
        y: f64,
        /// Horizontal movement since the previous event, in pixels.
        dx: f64,
    },
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputOutcome {
    Gesture(GestureOutcome),
    /// Radians applied to the image and pending selections.
    Rotated(f64),
    Ignored,
}

/// Pixel mapping of one stacked group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupPixels {
    pub group: GroupId,
    pub footprint: Vec<PixelPoint>,
    pub rect: Option<PixelRect>,
}

pub struct StitchSession {
    config: Config,
    scene: Scene,
    store: SelectionGroupStore,
    drawer: SelectionDrawer,
    rotation: RotationController,
    compositor: Compositor,
    started: Instant,
}

impl StitchSession {
    /// # Errors
    ///
    /// Returns [`StitchError::Config`] if `viewport` has no positive area.
    pub fn new(source: SourceImage, viewport: Viewport, config: Config) -> Result<Self> {
        let drawer = SelectionDrawer::new(Projector::default(), config.min_selection_size);
        Self::with_drawer(source, viewport, config, drawer)
    }

    /// Session whose selection tint jitter is reproducible.
    pub fn seeded(
        source: SourceImage,
        viewport: Viewport,
        config: Config,
        seed: u64,
    ) -> Result<Self> {
        let drawer =
            SelectionDrawer::seeded(Projector::default(), config.min_selection_size, seed);
        Self::with_drawer(source, viewport, config, drawer)
    }

    fn with_drawer(
        source: SourceImage,
        viewport: Viewport,
        config: Config,
        drawer: SelectionDrawer,
    ) -> Result<Self> {
        viewport.validate()?;
        Ok(Self {
            scene: Scene::new(source, viewport),
            store: SelectionGroupStore::new(),
            drawer,
            rotation: RotationController::new(config.rotation_smoothing, config.rotate_sensitivity),
            compositor: Compositor::new(config.separator_height, config.fit_padding),
            started: Instant::now(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &SelectionGroupStore {
        &self.store
    }

    pub fn drawer(&self) -> &SelectionDrawer {
        &self.drawer
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation.state()
    }

    pub fn is_joined(&self) -> bool {
        self.store.is_joined()
    }

    /// Switches to a new image and clears all per-image state.
    pub fn load_image(&mut self, source: SourceImage) {
        self.scene.load(source);
        self.clear_state();
        log::info!(
            "loaded {}x{} image",
            self.scene.source().pixel_width(),
            self.scene.source().pixel_height()
        );
    }

    /// Drops selections, rotation, composite and the join lock.
    pub fn reset(&mut self) {
        self.scene.restore_source();
        self.clear_state();
        log::debug!("session reset");
    }

    fn clear_state(&mut self) {
        self.store.clear();
        self.rotation.reset();
        self.drawer.cancel();
        self.started = Instant::now();
    }

    /// Switches the drawing surface size. Invalid sizes are refused and the
    /// previous viewport is kept.
    pub fn resize_viewport(&mut self, viewport: Viewport) -> Result<()> {
        viewport.validate()?;
        self.scene.viewport = viewport;
        Ok(())
    }

    pub fn set_active_group(&mut self, group: GroupId) -> bool {
        self.store.set_active(group)
    }

    pub fn set_rotate_modifier(&mut self, held: bool) {
        if held {
            self.rotation.begin_rotate_mode();
        } else {
            self.rotation.end_rotate_mode();
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> InputOutcome {
        match event {
            PointerEvent::Down { x, y, button, over_ui } => {
                InputOutcome::Gesture(self.drawer.pointer_down(
                    DVec2::new(x, y),
                    button,
                    over_ui,
                    self.rotation.is_active(),
                    &self.store,
                    &self.scene.camera,
                    self.scene.viewport,
                ))
            }
            PointerEvent::Move { x, y, dx } => {
                if self.rotation.is_active() && !self.drawer.is_drawing() {
                    let Some(image) = self.scene.image_solid_mut() else {
                        return InputOutcome::Ignored;
                    };
                    let applied = self.rotation.apply_delta(dx, image, self.store.pending_mut());
                    return InputOutcome::Rotated(applied);
                }
                let screen = DVec2::new(x, y);
                match self.drawer.pointer_move(screen, &self.scene.camera, self.scene.viewport) {
                    GestureOutcome::Ignored => InputOutcome::Ignored,
                    outcome => InputOutcome::Gesture(outcome),
                }
            }
            PointerEvent::Up => match self.drawer.pointer_up(&mut self.store) {
                GestureOutcome::Ignored => InputOutcome::Ignored,
                outcome => InputOutcome::Gesture(outcome),
            },
        }
    }

    /// Rotates the image and pending selections by `angle` radians.
    ///
    /// Ignored once the image has been stitched.
    pub fn rotate_by(&mut self, angle: f64) -> f64 {
        let Some(image) = self.scene.image_solid_mut() else {
            return 0.0;
        };
        self.rotation.rotate_by(angle, image, self.store.pending_mut())
    }

    /// Per-frame update; advances a smoothed rotation.
    pub fn tick(&mut self) -> f64 {
        let Some(image) = self.scene.image_solid_mut() else {
            return 0.0;
        };
        self.rotation.tick(image, self.store.pending_mut())
    }

    pub fn stitch(&mut self) -> Result<StitchOutcome> {
        if self.drawer.is_drawing() && !self.store.is_joined() {
            self.drawer.cancel();
        }
        self.compositor.stitch(&mut self.store, &mut self.scene)
    }

    /// Pixel footprint of every stacked group, in stacking order.
    pub fn pixel_regions(&self) -> Result<Vec<GroupPixels>> {
        let composite = self.scene.composite().ok_or(StitchError::NotStitched)?;
        let mapper = CoordinateMapper::new(self.scene.source());
        composite
            .order()
            .iter()
            .map(|&group| {
                let region = self
                    .store
                    .group(group)
                    .cropped()
                    .ok_or(StitchError::MissingRegion(group))?;
                let footprint = mapper.map_region(region);
                Ok(GroupPixels {
                    group,
                    rect: PixelRect::from_points(&footprint),
                    footprint,
                })
            })
            .collect()
    }

    /// Renders the composite from the original pixels with visible
    /// separators, for the recognizer.
    pub fn render_snapshot(&self, original: &DynamicImage) -> Result<RenderedComposite> {
        let rects = self
            .pixel_regions()?
            .into_iter()
            .map(|pixels| pixels.rect.ok_or(StitchError::MissingRegion(pixels.group)))
            .collect::<Result<Vec<_>>>()?;

        let scale = f64::from(original.height()) / self.scene.source().world_height();
        let separator_px = (self.compositor.separator_height() * scale).round() as u32;
        let angle = self.rotation.state().current;
        ImageProcessor::render_composite(original, &rects, separator_px, angle)
    }

    pub fn separator_token(&self) -> &str {
        &self.config.separator_token
    }

    pub fn recognition_prompt(&self, settings: &Settings) -> String {
        build_prompt(&settings.ocr_prompt, &self.config.separator_token)
    }

    /// Splits recognized text on the separator token and assigns one
    /// segment per stacked group.
    pub fn distribute_text(&mut self, text: &str) -> Result<()> {
        let order = self
            .scene
            .composite()
            .ok_or(StitchError::NotStitched)?
            .order()
            .to_vec();
        let segments = split_recognized_text(text, &self.config.separator_token, &order);
        for (group, segment) in GroupId::ALL.into_iter().zip(segments) {
            self.store.set_text(group, segment);
        }
        Ok(())
    }

    /// Explicit setter for a group's text, for edits made outside the core.
    pub fn set_group_text(&mut self, group: GroupId, text: impl Into<String>) -> bool {
        self.store.set_text(group, text)
    }

    /// Builds the record handed to the persistence collaborator.
    pub fn finish(&self, settings: &Settings) -> ImageRecord {
        let mapper = CoordinateMapper::new(self.scene.source());
        let groups = self
            .store
            .groups()
            .map(|group| {
                let footprint = group
                    .cropped()
                    .map(|region| mapper.map_region(region))
                    .unwrap_or_default();
                GroupRecord {
                    group: group.id(),
                    tag: settings.tag(group.id()).to_string(),
                    text: group.text().get().to_string(),
                    rect: PixelRect::from_points(&footprint),
                    footprint,
                }
            })
            .collect();

        ImageRecord {
            rotation_angle: self.rotation.state().current,
            elapsed_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            groups,
        }
    }
}
