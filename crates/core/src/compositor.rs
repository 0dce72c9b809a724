//! The stitch protocol: union each group, crop it to the image, stack the
//! crops with separators between them and show the combined result.
//!
//! Everything is computed before any state is touched, so an aborted stitch
//! leaves the store, the scene and the camera exactly as they were.

use crate::algebra::RegionAlgebra;
use crate::error::{Result, StitchError};
use crate::geometry::{Aabb, Placement, Solid};
use crate::scene::Scene;
use crate::selection::{GroupId, SELECTION_DEPTH};
use crate::store::SelectionGroupStore;
use glam::DVec3;

/// One group's selections after union and crop.
#[derive(Clone, Debug)]
pub struct CroppedRegion {
    group: GroupId,
    solid: Solid,
    reference: Placement,
    height: f64,
    stacked: Solid,
}

impl CroppedRegion {
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Cropped geometry where it overlapped the image, before stacking.
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    /// Placement of the image the region was cropped against.
    pub fn reference(&self) -> &Placement {
        &self.reference
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The region as moved into the composite.
    pub fn stacked(&self) -> &Solid {
        &self.stacked
    }
}

/// Delimiter placed between two consecutive stacked groups.
#[derive(Clone, Debug)]
pub struct SeparatorMarker {
    pub above: GroupId,
    pub below: GroupId,
    pub solid: Solid,
    pub height: f64,
}

/// All stacked regions unioned into the solid that replaces the image.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    solid: Solid,
    order: Vec<GroupId>,
    separators: Vec<SeparatorMarker>,
    bounds: Aabb,
}

impl CompositeResult {
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    /// Groups in stacking order, top to bottom.
    pub fn order(&self) -> &[GroupId] {
        &self.order
    }

    pub fn separators(&self) -> &[SeparatorMarker] {
        &self.separators
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StitchSummary {
    /// Groups that made it into the composite, in stacking order.
    pub stacked: Vec<GroupId>,
    /// Populated groups whose selections missed the image entirely.
    pub dropped: Vec<GroupId>,
    pub total_height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StitchOutcome {
    Stitched(StitchSummary),
    /// A previous stitch already locked this image.
    AlreadyJoined,
    /// No group holds a selection.
    NothingSelected,
}

pub struct Compositor {
    separator_height: f64,
    fit_padding: f64,
}

impl Compositor {
    pub fn new(separator_height: f64, fit_padding: f64) -> Self {
        Self {
            separator_height,
            fit_padding,
        }
    }

    pub fn separator_height(&self) -> f64 {
        self.separator_height
    }

    /// Merges every populated group into one composite.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::NothingToMerge`] when no group overlaps the
    /// image. State is left untouched in that case.
    pub fn stitch(
        &self,
        store: &mut SelectionGroupStore,
        scene: &mut Scene,
    ) -> Result<StitchOutcome> {
        if store.is_joined() {
            return Ok(StitchOutcome::AlreadyJoined);
        }
        let populated = store.populated();
        if populated.is_empty() {
            return Ok(StitchOutcome::NothingSelected);
        }

        let reference = scene.displayed_solid();
        let mut crops = Vec::with_capacity(populated.len());
        let mut dropped = Vec::new();
        for &group in &populated {
            let solids = store
                .group(group)
                .selections()
                .iter()
                .map(|s| s.solid().clone());
            let merged = RegionAlgebra::union(solids)?;
            match RegionAlgebra::crop(&merged, reference) {
                Some(cropped) => crops.push((group, cropped)),
                None => {
                    log::warn!("group {group} does not overlap the image; dropping it");
                    dropped.push(group);
                }
            }
        }
        if crops.is_empty() {
            return Err(StitchError::NothingToMerge);
        }

        let reference = *reference.placement();
        let (regions, separators) = self.stack(crops, reference);
        let composite = RegionAlgebra::union(regions.iter().map(|r| r.stacked.clone()))?;
        let bounds = composite
            .world_bounds()
            .ok_or(StitchError::NothingToMerge)?;

        let summary = StitchSummary {
            stacked: regions.iter().map(CroppedRegion::group).collect(),
            dropped,
            total_height: bounds.height(),
        };
        let composite = CompositeResult {
            solid: composite,
            order: summary.stacked.clone(),
            separators,
            bounds,
        };

        scene.camera.fit(&bounds, scene.viewport, self.fit_padding);
        scene.display_composite(composite);
        store.commit_merge(regions);

        log::info!(
            "stitched groups {:?} into a composite {:.4} units tall",
            summary.stacked,
            summary.total_height
        );
        Ok(StitchOutcome::Stitched(summary))
    }

    /// Stacks crops top to bottom: each region's vertical centre goes to
    /// `offset + height / 2` below the top, with a separator between
    /// consecutive regions.
    fn stack(
        &self,
        crops: Vec<(GroupId, Solid)>,
        reference: Placement,
    ) -> (Vec<CroppedRegion>, Vec<SeparatorMarker>) {
        let measured: Vec<(GroupId, Solid, Aabb)> = crops
            .into_iter()
            .filter_map(|(group, solid)| {
                let bounds = solid.world_bounds()?;
                Some((group, solid, bounds))
            })
            .collect();

        let (min_x, max_x) = measured.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), (_, _, b)| (lo.min(b.min.x), hi.max(b.max.x)),
        );

        let mut offset = 0.0;
        let mut regions = Vec::with_capacity(measured.len());
        let mut separators = Vec::new();
        let mut previous: Option<GroupId> = None;

        for (group, solid, bounds) in measured {
            if let Some(above) = previous {
                let center = DVec3::new(
                    (min_x + max_x) * 0.5,
                    -(offset + self.separator_height * 0.5),
                    0.0,
                );
                let size = DVec3::new(max_x - min_x, self.separator_height, SELECTION_DEPTH);
                separators.push(SeparatorMarker {
                    above,
                    below: group,
                    solid: Solid::cuboid(center, size),
                    height: self.separator_height,
                });
                offset += self.separator_height;
            }

            let height = bounds.height();
            let mut stacked = solid.clone();
            stacked.translate(DVec3::new(0.0, -(offset + height * 0.5) - bounds.center().y, 0.0));
            offset += height;

            regions.push(CroppedRegion {
                group,
                solid,
                reference,
                height,
                stacked,
            });
            previous = Some(group);
        }

        (regions, separators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Viewport;
    use crate::scene::SourceImage;

    fn scene() -> Scene {
        Scene::new(SourceImage::new(2000, 1600).unwrap(), Viewport::new(1000.0, 800.0))
    }

    #[test]
    fn empty_store_is_a_no_op() {
        let mut store = SelectionGroupStore::new();
        let mut scene = scene();
        let camera = scene.camera;
        let outcome = Compositor::new(0.05, 1.8).stitch(&mut store, &mut scene).unwrap();
        assert_eq!(outcome, StitchOutcome::NothingSelected);
        assert!(scene.composite().is_none());
        assert_eq!(scene.camera, camera);
        assert!(!store.is_joined());
    }

    #[test]
    fn stack_places_regions_top_down_with_separators() {
        let compositor = Compositor::new(0.1, 1.8);
        let crops = vec![
            (
                GroupId::new(0).unwrap(),
                Solid::cuboid(DVec3::new(0.3, 0.5, 0.0), DVec3::new(1.0, 0.4, 0.02)),
            ),
            (
                GroupId::new(2).unwrap(),
                Solid::cuboid(DVec3::new(-0.2, -0.6, 0.0), DVec3::new(0.5, 0.2, 0.02)),
            ),
        ];
        let (regions, separators) = compositor.stack(crops, Placement::IDENTITY);

        assert_eq!(separators.len(), 1);
        assert_eq!(separators[0].above, GroupId::new(0).unwrap());
        assert_eq!(separators[0].below, GroupId::new(2).unwrap());

        let first = regions[0].stacked().world_bounds().unwrap();
        let second = regions[1].stacked().world_bounds().unwrap();
        assert!((first.max.y - 0.0).abs() < 1e-9);
        assert!((first.min.y + 0.4).abs() < 1e-9);
        assert!((second.max.y + 0.5).abs() < 1e-9);
        assert!((second.min.y + 0.7).abs() < 1e-9);
        // Horizontal placement is untouched.
        assert!((first.center().x - 0.3).abs() < 1e-9);
        assert!((regions[0].height() - 0.4).abs() < 1e-9);
    }
}
