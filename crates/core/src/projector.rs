//! Screen-to-world projection onto the selection plane.

use crate::camera::{Camera, Viewport};
use glam::{DVec2, DVec3};

/// Z of the plane selections are drawn on, just in front of the image.
pub const SELECTION_PLANE_Z: f64 = 0.01;

/// Maps pointer positions to points on a fixed world plane.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    plane_z: f64,
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(SELECTION_PLANE_Z)
    }
}

impl Projector {
    pub fn new(plane_z: f64) -> Self {
        Self { plane_z }
    }

    /// Projects a screen position (top-left origin, pixels) onto the plane.
    ///
    /// The camera must have a non-degenerate projection.
    pub fn project(&self, screen: DVec2, viewport: Viewport, camera: &Camera) -> DVec3 {
        let ndc_x = screen.x / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / viewport.height * 2.0;

        let inverse = camera.view_projection(viewport).inverse();
        let near = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc_x, ndc_y, 1.0));

        let dz = far.z - near.z;
        if dz.abs() < f64::EPSILON {
            return DVec3::new(near.x, near.y, self.plane_z);
        }
        let t = (self.plane_z - near.z) / dz;
        let hit = near + (far - near) * t;
        DVec3::new(hit.x, hit.y, self.plane_z)
    }
}
