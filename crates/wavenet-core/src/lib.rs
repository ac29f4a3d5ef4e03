//! # Wavenet Core
//!
//! Layout database for photonic circuits: integer-grid geometric primitives,
//! placement transformations, hierarchical cells, technology layers, region
//! merging and an R-tree spatial index.
//!
//! The netlist, verification and configuration crates are built on top of it.

pub mod geometry;
pub mod cell;
pub mod database;
pub mod layer;
pub mod region;
pub mod spatial;

pub use database::{LayoutDatabase, LayoutError, ShapeRef};
pub use cell::{Cell, CellId, CellInstance, InstanceId, Shape, Transform};
pub use layer::{Layer, LayerId, Technology};
pub use geometry::{BBox, Coord, DPoint, GeomPrimitive, Path, Point, Polygon, Rect, Text, Vector};
pub use region::Region;
pub use spatial::{SpatialEntry, SpatialIndex};
