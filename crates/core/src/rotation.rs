//! Rotation of the image together with every pending selection.
//!
//! Each step rotates the image solid and all unmerged selections about the
//! image centre by the same quaternion, so they never drift apart before
//! cropping. Cropped regions are never handed to the controller.

use crate::geometry::Solid;
use crate::selection::Selection;
use glam::DQuat;

const SETTLE_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    /// Angle applied to the geometry so far, in radians.
    pub current: f64,
    /// Angle the controller is heading towards.
    pub target: f64,
}

impl RotationState {
    pub fn is_settled(&self) -> bool {
        (self.target - self.current).abs() <= SETTLE_EPSILON
    }
}

pub struct RotationController {
    state: RotationState,
    active: bool,
    smoothing: f64,
    sensitivity: f64,
}

impl RotationController {
    /// `smoothing` is the fraction of the remaining angle applied per step;
    /// `1.0` snaps to the target immediately.
    pub fn new(smoothing: f64, sensitivity: f64) -> Self {
        Self {
            state: RotationState::default(),
            active: false,
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
            sensitivity,
        }
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn begin_rotate_mode(&mut self) {
        self.active = true;
    }

    pub fn end_rotate_mode(&mut self) {
        self.active = false;
    }

    /// Turns a horizontal pointer delta into a target change and steps
    /// towards it. Returns the angle applied to the geometry.
    pub fn apply_delta<'a>(
        &mut self,
        pointer_dx: f64,
        image: &mut Solid,
        pending: impl IntoIterator<Item = &'a mut Selection>,
    ) -> f64 {
        if !self.active || !pointer_dx.is_finite() {
            return 0.0;
        }
        self.state.target += pointer_dx * self.sensitivity;
        self.step(image, pending)
    }

    /// Sets a new target `angle` radians away and steps towards it.
    pub fn rotate_by<'a>(
        &mut self,
        angle: f64,
        image: &mut Solid,
        pending: impl IntoIterator<Item = &'a mut Selection>,
    ) -> f64 {
        if !angle.is_finite() {
            return 0.0;
        }
        self.state.target += angle;
        self.step(image, pending)
    }

    /// Advances an unsettled rotation by one smoothing step.
    pub fn tick<'a>(
        &mut self,
        image: &mut Solid,
        pending: impl IntoIterator<Item = &'a mut Selection>,
    ) -> f64 {
        if self.state.is_settled() {
            return 0.0;
        }
        self.step(image, pending)
    }

    pub fn reset(&mut self) {
        self.state = RotationState::default();
        self.active = false;
    }

    fn step<'a>(
        &mut self,
        image: &mut Solid,
        pending: impl IntoIterator<Item = &'a mut Selection>,
    ) -> f64 {
        let remaining = self.state.target - self.state.current;
        let delta = if self.smoothing >= 1.0 || remaining.abs() <= SETTLE_EPSILON {
            remaining
        } else {
            remaining * self.smoothing
        };
        if delta == 0.0 {
            return 0.0;
        }

        let pivot = image.placement().translation;
        let rotation = DQuat::from_rotation_z(delta);
        image.rotate_about(pivot, rotation);
        for selection in pending {
            selection.rotate_about(pivot, rotation);
        }
        self.state.current += delta;
        log::debug!("rotated by {delta:.5} rad (now {:.5})", self.state.current);
        delta
    }
}
