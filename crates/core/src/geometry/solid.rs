//! Prismatic solids and their world placement.

use super::polygon::ConvexPolygon;
use glam::{DQuat, DVec2, DVec3};

/// Solids thinner or smaller than this count as zero-volume.
pub const VOLUME_EPSILON: f64 = 1e-12;

/// Rigid transform from a solid's local space into world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub rotation: DQuat,
    pub translation: DVec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Placement {
    pub const IDENTITY: Placement = Placement {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation,
        }
    }

    pub fn transform_point(&self, local: DVec3) -> DVec3 {
        self.rotation * local + self.translation
    }

    pub fn inverse_transform_point(&self, world: DVec3) -> DVec3 {
        self.rotation.inverse() * (world - self.translation)
    }

    /// Rotates the whole placement about a world-space pivot.
    pub fn rotated_about(&self, pivot: DVec3, rotation: DQuat) -> Self {
        Self {
            rotation: (rotation * self.rotation).normalize(),
            translation: pivot + rotation * (self.translation - pivot),
        }
    }

    /// Signed rotation about the view (Z) axis, in radians.
    pub fn angle_z(&self) -> f64 {
        let (axis, angle) = self.rotation.to_axis_angle();
        if axis.z < 0.0 { -angle } else { angle }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Whether `other` lies inside `self` in X and Y, within `tolerance`.
    pub fn contains_xy(&self, other: &Aabb, tolerance: f64) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
    }
}

/// A volumetric region: disjoint convex footprint pieces extruded over a
/// local z interval and placed in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Solid {
    pieces: Vec<ConvexPolygon>,
    z_min: f64,
    z_max: f64,
    placement: Placement,
}

impl Solid {
    /// Box of `size` centred at world position `center`, unrotated.
    pub fn cuboid(center: DVec3, size: DVec3) -> Self {
        let half = size.abs() * 0.5;
        let footprint = ConvexPolygon::from_vertices(
            ConvexPolygon::from_rect(-half.truncate(), half.truncate())
                .vertices()
                .to_vec(),
        );
        Self {
            pieces: footprint.into_iter().collect(),
            z_min: -half.z,
            z_max: half.z,
            placement: Placement::from_translation(center),
        }
    }

    pub(crate) fn from_parts(
        pieces: Vec<ConvexPolygon>,
        z_min: f64,
        z_max: f64,
        placement: Placement,
    ) -> Self {
        Self {
            pieces,
            z_min,
            z_max,
            placement,
        }
    }

    pub fn pieces(&self) -> &[ConvexPolygon] {
        &self.pieces
    }

    pub(crate) fn into_pieces(self) -> Vec<ConvexPolygon> {
        self.pieces
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn z_range(&self) -> (f64, f64) {
        (self.z_min, self.z_max)
    }

    pub fn depth(&self) -> f64 {
        (self.z_max - self.z_min).max(0.0)
    }

    pub fn footprint_area(&self) -> f64 {
        self.pieces.iter().map(ConvexPolygon::area).sum()
    }

    pub fn volume(&self) -> f64 {
        self.footprint_area() * self.depth()
    }

    pub fn is_empty(&self) -> bool {
        self.volume() <= VOLUME_EPSILON
    }

    /// Bounding box in the solid's own local space.
    pub fn local_bounds(&self) -> Option<Aabb> {
        let (z_min, z_max) = (self.z_min, self.z_max);
        Aabb::from_points(self.pieces.iter().flat_map(|piece| {
            piece.vertices().iter().flat_map(move |v| {
                [v.extend(z_min), v.extend(z_max)]
            })
        }))
    }

    /// Bounding box of the placed solid in world space.
    pub fn world_bounds(&self) -> Option<Aabb> {
        let (z_min, z_max) = (self.z_min, self.z_max);
        let placement = self.placement;
        Aabb::from_points(self.pieces.iter().flat_map(|piece| {
            piece.vertices().iter().flat_map(move |v| {
                [
                    placement.transform_point(v.extend(z_min)),
                    placement.transform_point(v.extend(z_max)),
                ]
            })
        }))
    }

    pub fn translate(&mut self, delta: DVec3) {
        self.placement.translation += delta;
    }

    pub fn rotate_about(&mut self, pivot: DVec3, rotation: DQuat) {
        self.placement = self.placement.rotated_about(pivot, rotation);
    }

    /// Re-expresses the footprint and z interval in another local frame.
    ///
    /// Both placements must only rotate about Z, so footprints stay planar.
    pub(crate) fn pieces_in_frame(&self, frame: &Placement) -> (Vec<ConvexPolygon>, f64, f64) {
        if *frame == self.placement {
            return (self.pieces.clone(), self.z_min, self.z_max);
        }

        let to_frame =
            |local: DVec3| frame.inverse_transform_point(self.placement.transform_point(local));
        let pieces = self
            .pieces
            .iter()
            .map(|piece| piece.map(|v| to_frame(v.extend(0.0)).truncate()))
            .collect();
        let z_a = to_frame(DVec2::ZERO.extend(self.z_min)).z;
        let z_b = to_frame(DVec2::ZERO.extend(self.z_max)).z;
        (pieces, z_a.min(z_b), z_a.max(z_b))
    }
}
