//! Mapping of cropped regions back onto the source image's pixel grid.
//!
//! A region's footprint corners travel world -> image local -> normalized
//! `[0, 1]²` -> source pixels, then Y is reflected about the image's
//! vertical midpoint because world space is Y-up and pixel rows run down.

use crate::compositor::CroppedRegion;
use crate::geometry::{Placement, Solid};
use crate::scene::SourceImage;
use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PixelRect {
    pub fn from_points(points: &[PixelPoint]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |r, p| Self {
            min_x: r.min_x.min(p.x),
            min_y: r.min_y.min(p.y),
            max_x: r.max_x.max(p.x),
            max_y: r.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

pub struct CoordinateMapper<'a> {
    source: &'a SourceImage,
}

impl<'a> CoordinateMapper<'a> {
    pub fn new(source: &'a SourceImage) -> Self {
        Self { source }
    }

    /// Footprint corners of a cropped region, sorted by x then y.
    pub fn map_region(&self, region: &CroppedRegion) -> Vec<PixelPoint> {
        self.footprint(region.solid(), region.reference())
    }

    /// Footprint corners of `region` in source pixels, sorted by x then y.
    ///
    /// `reference` is the image placement the region was cropped against.
    /// Only valid for geometry that has not been rotated since the crop.
    pub fn footprint(&self, region: &Solid, reference: &Placement) -> Vec<PixelPoint> {
        let Some(local) = region.local_bounds() else {
            return Vec::new();
        };
        let z = local.max.z;
        let corners = [
            DVec2::new(local.min.x, local.min.y),
            DVec2::new(local.max.x, local.min.y),
            DVec2::new(local.max.x, local.max.y),
            DVec2::new(local.min.x, local.max.y),
        ];

        let image = self.source.local_bounds();
        let size = image.size();
        let width = f64::from(self.source.pixel_width());
        let height = f64::from(self.source.pixel_height());

        let mut points: Vec<PixelPoint> = corners
            .into_iter()
            .map(|corner| {
                let world = region.placement().transform_point(corner.extend(z));
                let local = reference.inverse_transform_point(world);
                let u = (local.x - image.min.x) / size.x;
                let v = (local.y - image.min.y) / size.y;
                PixelPoint {
                    x: u * width,
                    y: flip_y(v * height, height),
                }
            })
            .collect();

        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        points
    }

    pub fn pixel_rect(&self, region: &CroppedRegion) -> Option<PixelRect> {
        PixelRect::from_points(&self.map_region(region))
    }
}

/// Reflects `y` about the vertical midpoint of an image `height` tall.
fn flip_y(y: f64, height: f64) -> f64 {
    height - y
}
