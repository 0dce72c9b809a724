//! Geometric primitives shared by the selection engine.
//!
//! Every rotation in the engine is about the view axis, so solids are
//! modelled as 2D convex footprints extruded along Z. That keeps boolean
//! operations exact while still behaving like true volumes.

mod polygon;
mod solid;

pub use polygon::{AREA_EPSILON, ConvexPolygon};
pub use solid::{Aabb, Placement, Solid, VOLUME_EPSILON};
