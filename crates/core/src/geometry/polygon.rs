//! Convex polygons in a solid's local XY plane.
//!
//! Footprints are kept as sets of disjoint convex pieces. Clipping and
//! difference against another convex polygon are done edge by edge with
//! half-plane splits, which keeps every piece convex.

use glam::DVec2;

/// Pieces with less area than this are treated as degenerate and dropped.
pub const AREA_EPSILON: f64 = 1e-12;

const SIDE_EPSILON: f64 = 1e-12;
const MERGE_EPSILON: f64 = 1e-12;

/// A convex polygon with counter-clockwise vertices (Y-up).
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexPolygon {
    vertices: Vec<DVec2>,
}

impl ConvexPolygon {
    /// Axis-aligned rectangle spanning two corners in any order.
    pub fn from_rect(a: DVec2, b: DVec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            vertices: vec![
                min,
                DVec2::new(max.x, min.y),
                max,
                DVec2::new(min.x, max.y),
            ],
        }
    }

    /// Builds a polygon from convex vertices, fixing the winding.
    ///
    /// Returns `None` when the vertices enclose no area.
    pub fn from_vertices(mut vertices: Vec<DVec2>) -> Option<Self> {
        vertices.dedup_by(|a, b| a.distance_squared(*b) <= MERGE_EPSILON);
        while vertices.len() > 1
            && vertices[0].distance_squared(vertices[vertices.len() - 1]) <= MERGE_EPSILON
        {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return None;
        }
        let area = signed_area(&vertices);
        if area.abs() <= AREA_EPSILON {
            return None;
        }
        if area < 0.0 {
            vertices.reverse();
        }
        Some(Self { vertices })
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Minimum and maximum corners of the polygon's bounding rectangle.
    pub fn bounds(&self) -> (DVec2, DVec2) {
        self.vertices.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), v| (min.min(*v), max.max(*v)),
        )
    }

    /// Applies an orientation-preserving map to every vertex.
    pub fn map(&self, f: impl Fn(DVec2) -> DVec2) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Portion of `self` that lies inside the convex `clip` polygon.
    pub fn clip(&self, clip: &ConvexPolygon) -> Option<ConvexPolygon> {
        let mut current = self.clone();
        for (a, b) in clip.edges() {
            current = current.split(a, b).0?;
        }
        Some(current)
    }

    /// `self` minus `other`, as disjoint convex pieces.
    pub fn subtract(&self, other: &ConvexPolygon) -> Vec<ConvexPolygon> {
        if self.clip(other).is_none() {
            return vec![self.clone()];
        }

        let mut pieces = Vec::new();
        let mut rest = self.clone();
        for (a, b) in other.edges() {
            let (inside, outside) = rest.split(a, b);
            pieces.extend(outside);
            match inside {
                Some(inside) => rest = inside,
                None => return pieces,
            }
        }
        // Whatever is left lies inside `other`.
        pieces
    }

    fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Splits along the directed line `a -> b` into (left, right) parts.
    ///
    /// For a counter-clockwise clip polygon the left side is its interior.
    fn split(&self, a: DVec2, b: DVec2) -> (Option<ConvexPolygon>, Option<ConvexPolygon>) {
        let dir = b - a;
        let side = |p: DVec2| dir.perp_dot(p - a);

        let mut left = Vec::with_capacity(self.vertices.len() + 2);
        let mut right = Vec::with_capacity(self.vertices.len() + 2);

        for (p, q) in self.edges() {
            let sp = side(p);
            let sq = side(q);

            if sp >= -SIDE_EPSILON {
                left.push(p);
            }
            if sp <= SIDE_EPSILON {
                right.push(p);
            }

            let crosses = (sp > SIDE_EPSILON && sq < -SIDE_EPSILON)
                || (sp < -SIDE_EPSILON && sq > SIDE_EPSILON);
            if crosses {
                let t = sp / (sp - sq);
                let hit = p + (q - p) * t;
                left.push(hit);
                right.push(hit);
            }
        }

        (
            ConvexPolygon::from_vertices(left),
            ConvexPolygon::from_vertices(right),
        )
    }
}

fn signed_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}
