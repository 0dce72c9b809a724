//! Camera and viewport state.
//!
//! The camera always looks down −Z at the image plane. Screen space has a
//! top-left origin; world space is Y-up.

use crate::error::{Result, StitchError};
use crate::geometry::Aabb;
use glam::{DMat4, DVec3};

const DEFAULT_DISTANCE: f64 = 10.0;
const NEAR: f64 = 0.01;
const FAR: f64 = 1000.0;

/// Size of the drawing surface in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Fails unless both dimensions are finite and positive.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if positive(self.width) && positive(self.height) {
            Ok(())
        } else {
            Err(StitchError::config(format!(
                "viewport must have a positive size, got {}x{}",
                self.width, self.height
            )))
        }
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 { self.width / self.height } else { 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Parallel projection showing `2 * half_height` world units vertically.
    Orthographic { half_height: f64 },
    /// Perspective projection with a vertical field of view in radians.
    Perspective { fov_y: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self::orthographic(1.0)
    }
}

impl Camera {
    pub fn orthographic(half_height: f64) -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, DEFAULT_DISTANCE),
            projection: Projection::Orthographic { half_height },
        }
    }

    pub fn perspective(fov_y: f64) -> Self {
        Self {
            position: DVec3::new(0.0, 0.0, DEFAULT_DISTANCE),
            projection: Projection::Perspective { fov_y },
        }
    }

    pub fn view(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.position - DVec3::Z, DVec3::Y)
    }

    pub fn projection_matrix(&self, viewport: Viewport) -> DMat4 {
        let aspect = viewport.aspect();
        match self.projection {
            Projection::Orthographic { half_height } => {
                let half_width = half_height * aspect;
                DMat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    NEAR,
                    FAR,
                )
            }
            Projection::Perspective { fov_y } => DMat4::perspective_rh(fov_y, aspect, NEAR, FAR),
        }
    }

    pub fn view_projection(&self, viewport: Viewport) -> DMat4 {
        self.projection_matrix(viewport) * self.view()
    }

    /// Centres on `bounds` and sizes the frustum so that `padding` times the
    /// dominant extent spans the view.
    pub fn fit(&mut self, bounds: &Aabb, viewport: Viewport, padding: f64) {
        let center = bounds.center();
        let extent = bounds.height().max(bounds.width() / viewport.aspect()) * padding;
        if !(extent > 0.0) {
            return;
        }

        self.position.x = center.x;
        self.position.y = center.y;
        match &mut self.projection {
            Projection::Orthographic { half_height } => {
                *half_height = extent * 0.5;
                self.position.z = self.position.z.max(bounds.max.z + DEFAULT_DISTANCE);
            }
            Projection::Perspective { fov_y } => {
                self.position.z = center.z + (extent * 0.5) / (*fov_y * 0.5).tan();
            }
        }
        log::debug!("camera fit to {:?} (extent {extent:.4})", center);
    }
}
