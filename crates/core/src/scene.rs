//! The displayed image, the composite that replaces it, and the view.

use crate::camera::{Camera, Viewport};
use crate::compositor::CompositeResult;
use crate::error::{Result, StitchError};
use crate::geometry::{Aabb, Solid};
use glam::DVec3;
use image::DynamicImage;

/// Thickness of the image slab in world units.
pub const IMAGE_DEPTH: f64 = 0.02;

/// World-space height the image is displayed at.
pub const DEFAULT_WORLD_HEIGHT: f64 = 2.0;

/// The source image as supplied by the image source: native pixel size plus
/// its world-space footprint, centred on the origin.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceImage {
    pixel_width: u32,
    pixel_height: u32,
    world_height: f64,
}

impl SourceImage {
    pub fn new(pixel_width: u32, pixel_height: u32) -> Result<Self> {
        Self::with_world_height(pixel_width, pixel_height, DEFAULT_WORLD_HEIGHT)
    }

    pub fn with_world_height(
        pixel_width: u32,
        pixel_height: u32,
        world_height: f64,
    ) -> Result<Self> {
        if pixel_width == 0 || pixel_height == 0 {
            return Err(StitchError::image(format!(
                "source image has zero size ({pixel_width}x{pixel_height})"
            )));
        }
        if !(world_height > 0.0) {
            return Err(StitchError::config("world height must be positive"));
        }
        Ok(Self {
            pixel_width,
            pixel_height,
            world_height,
        })
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        Self::new(image.width(), image.height())
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn world_width(&self) -> f64 {
        self.world_height * f64::from(self.pixel_width) / f64::from(self.pixel_height)
    }

    pub fn world_height(&self) -> f64 {
        self.world_height
    }

    /// Source pixels per world unit (same on both axes).
    pub fn pixels_per_unit(&self) -> f64 {
        f64::from(self.pixel_height) / self.world_height
    }

    /// A fresh, unrotated solid for the image.
    pub fn solid(&self) -> Solid {
        Solid::cuboid(
            DVec3::ZERO,
            DVec3::new(self.world_width(), self.world_height, IMAGE_DEPTH),
        )
    }

    /// The image's bounding box in its own local space.
    pub fn local_bounds(&self) -> Aabb {
        let half = DVec3::new(self.world_width(), self.world_height, IMAGE_DEPTH) * 0.5;
        Aabb { min: -half, max: half }
    }
}

/// What the viewport is showing.
#[derive(Clone, Debug)]
enum Displayed {
    /// The (possibly rotated) source image.
    Source(Solid),
    /// The stitched composite.
    Composite(CompositeResult),
}

/// Scene state passed explicitly to the components that need it.
#[derive(Clone, Debug)]
pub struct Scene {
    source: SourceImage,
    displayed: Displayed,
    pub camera: Camera,
    pub viewport: Viewport,
}

impl Scene {
    /// Shows `source` unrotated, fitted to fill the viewport.
    pub fn new(source: SourceImage, viewport: Viewport) -> Self {
        let mut scene = Self {
            displayed: Displayed::Source(source.solid()),
            source,
            camera: Camera::default(),
            viewport,
        };
        scene.fit_to_source();
        scene
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Solid currently shown: the image or the composite.
    pub fn displayed_solid(&self) -> &Solid {
        match &self.displayed {
            Displayed::Source(solid) => solid,
            Displayed::Composite(composite) => composite.solid(),
        }
    }

    pub fn composite(&self) -> Option<&CompositeResult> {
        match &self.displayed {
            Displayed::Composite(composite) => Some(composite),
            Displayed::Source(_) => None,
        }
    }

    /// The image solid while it is still displayed and editable.
    pub(crate) fn image_solid_mut(&mut self) -> Option<&mut Solid> {
        match &mut self.displayed {
            Displayed::Source(solid) => Some(solid),
            Displayed::Composite(_) => None,
        }
    }

    pub(crate) fn display_composite(&mut self, composite: CompositeResult) {
        self.displayed = Displayed::Composite(composite);
    }

    /// Replaces the source and restores the unrotated image.
    pub fn load(&mut self, source: SourceImage) {
        self.source = source;
        self.restore_source();
    }

    /// Drops any composite or rotation and shows the image again.
    pub fn restore_source(&mut self) {
        self.displayed = Displayed::Source(self.source.solid());
        self.fit_to_source();
    }

    fn fit_to_source(&mut self) {
        let bounds = self.source.local_bounds();
        self.camera.fit(&bounds, self.viewport, 1.0);
    }
}
