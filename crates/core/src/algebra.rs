//! Boolean operations over solids.
//!
//! Inputs are consumed where the result replaces them, so intermediate
//! solids are dropped as the fold advances.

use crate::error::{Result, StitchError};
use crate::geometry::{ConvexPolygon, Solid};

pub struct RegionAlgebra;

impl RegionAlgebra {
    /// Folds boolean union over `solids`, left to right.
    ///
    /// The result lives in the first solid's frame. Overlapping input is
    /// counted once, so the footprint stays a set of disjoint pieces.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::EmptyUnion`] when `solids` is empty.
    pub fn union<I>(solids: I) -> Result<Solid>
    where
        I: IntoIterator<Item = Solid>,
    {
        let mut solids = solids.into_iter();
        let mut acc = solids.next().ok_or(StitchError::EmptyUnion)?;
        for next in solids {
            acc = Self::union_pair(acc, next);
        }
        Ok(acc)
    }

    fn union_pair(acc: Solid, next: Solid) -> Solid {
        let frame = *acc.placement();
        let (acc_z_min, acc_z_max) = acc.z_range();
        let (incoming, z_min, z_max) = next.pieces_in_frame(&frame);
        let mut pieces = acc.into_pieces();

        for piece in incoming {
            let mut fragments = vec![piece];
            for existing in &pieces {
                fragments = fragments
                    .iter()
                    .flat_map(|fragment| fragment.subtract(existing))
                    .collect();
                if fragments.is_empty() {
                    break;
                }
            }
            pieces.extend(fragments);
        }

        Solid::from_parts(
            pieces,
            acc_z_min.min(z_min),
            acc_z_max.max(z_max),
            frame,
        )
    }

    /// Volume common to `a` and `b`, expressed in `b`'s frame.
    ///
    /// The result may be empty; see [`RegionAlgebra::crop`].
    pub fn intersect(a: &Solid, b: &Solid) -> Solid {
        let frame = *b.placement();
        let (a_pieces, a_z_min, a_z_max) = a.pieces_in_frame(&frame);
        let (b_z_min, b_z_max) = b.z_range();
        let z_min = a_z_min.max(b_z_min);
        let z_max = a_z_max.min(b_z_max);

        if z_max <= z_min {
            return Solid::from_parts(Vec::new(), z_min, z_min, frame);
        }

        let pieces: Vec<ConvexPolygon> = a_pieces
            .iter()
            .flat_map(|pa| b.pieces().iter().filter_map(move |pb| pa.clip(pb)))
            .collect();

        Solid::from_parts(pieces, z_min, z_max, frame)
    }

    /// Crops `region` to `reference`, or `None` when nothing overlaps.
    pub fn crop(region: &Solid, reference: &Solid) -> Option<Solid> {
        let cropped = Self::intersect(region, reference);
        if cropped.is_empty() {
            None
        } else {
            Some(cropped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};

    fn slab(x: f64, y: f64, w: f64, h: f64) -> Solid {
        Solid::cuboid(DVec3::new(x, y, 0.0), DVec3::new(w, h, 0.1))
    }

    #[test]
    fn union_of_nothing_is_an_error() {
        let err = RegionAlgebra::union(Vec::<Solid>::new()).unwrap_err();
        assert!(matches!(err, StitchError::EmptyUnion));
    }

    #[test]
    fn union_counts_overlap_once() {
        let merged =
            RegionAlgebra::union([slab(0.0, 0.0, 2.0, 2.0), slab(1.0, 1.0, 2.0, 2.0)]).unwrap();
        assert!((merged.footprint_area() - 7.0).abs() < 1e-9);
        let bounds = merged.world_bounds().unwrap();
        assert!((bounds.height() - 3.0).abs() < 1e-9);
        assert!((bounds.width() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_identical_solids_is_idempotent() {
        let merged =
            RegionAlgebra::union([slab(0.0, 0.0, 1.0, 1.0), slab(0.0, 0.0, 1.0, 1.0)]).unwrap();
        assert!((merged.footprint_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn union_keeps_first_frame() {
        let first = slab(5.0, 0.0, 1.0, 1.0);
        let frame = *first.placement();
        let merged = RegionAlgebra::union([first, slab(0.0, 0.0, 1.0, 1.0)]).unwrap();
        assert_eq!(*merged.placement(), frame);
        let bounds = merged.world_bounds().unwrap();
        assert!((bounds.min.x + 0.5).abs() < 1e-9);
        assert!((bounds.max.x - 5.5).abs() < 1e-9);
    }

    #[test]
    fn intersect_crops_to_reference() {
        let image = slab(0.0, 0.0, 2.0, 2.0);
        let region = slab(0.9, 0.0, 0.4, 0.4);
        let cropped = RegionAlgebra::crop(&region, &image).unwrap();
        let bounds = cropped.world_bounds().unwrap();
        assert!((bounds.max.x - 1.0).abs() < 1e-9);
        assert!((bounds.min.x - 0.7).abs() < 1e-9);
        assert!(image.world_bounds().unwrap().contains_xy(&bounds, 1e-9));
    }

    #[test]
    fn intersect_result_lives_in_reference_frame() {
        let mut image = slab(0.0, 0.0, 4.0, 4.0);
        image.rotate_about(DVec3::ZERO, DQuat::from_rotation_z(0.4));
        let cropped = RegionAlgebra::intersect(&slab(0.0, 0.0, 1.0, 1.0), &image);
        assert_eq!(cropped.placement(), image.placement());
        assert!((cropped.footprint_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn crop_outside_reference_is_none() {
        let image = slab(0.0, 0.0, 2.0, 2.0);
        assert!(RegionAlgebra::crop(&slab(5.0, 5.0, 1.0, 1.0), &image).is_none());
    }

    #[test]
    fn crop_with_disjoint_depth_is_none() {
        let image = slab(0.0, 0.0, 2.0, 2.0);
        let floating = Solid::cuboid(DVec3::new(0.0, 0.0, 1.0), DVec3::new(1.0, 1.0, 0.1));
        assert!(RegionAlgebra::crop(&floating, &image).is_none());
    }
}
