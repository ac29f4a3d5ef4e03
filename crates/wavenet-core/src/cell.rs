use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{round_coord, BBox, DPoint, GeomPrimitive, Point};
use crate::LayerId;

/// Unique cell identifier.
pub type CellId = Uuid;

/// Unique identifier of a placed instance.
pub type InstanceId = Uuid;

/// A placement transformation: magnification, mirror, rotation, then
/// displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation offset in database units.
    pub offset: DPoint,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f64,
    /// Mirror about the X axis (applied before rotation).
    pub mirror_x: bool,
    /// Magnification (typically 1.0).
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset: DPoint::new(0.0, 0.0),
            rotation: 0.0,
            mirror_x: false,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn new(offset: DPoint, rotation: f64, mirror_x: bool, scale: f64) -> Self {
        Self {
            offset,
            rotation,
            mirror_x,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            offset: DPoint::new(x, y),
            ..Default::default()
        }
    }

    pub fn rotate(degrees: f64) -> Self {
        Self {
            rotation: degrees,
            ..Default::default()
        }
    }

    /// Apply to a point in floating database units.
    pub fn apply_d(&self, point: &DPoint) -> DPoint {
        let mut x = point.x * self.scale;
        let mut y = point.y * self.scale;

        if self.mirror_x {
            y = -y;
        }

        let (sin_r, cos_r) = rotation_sin_cos(self.rotation);
        let rx = x * cos_r - y * sin_r;
        let ry = x * sin_r + y * cos_r;
        x = rx + self.offset.x;
        y = ry + self.offset.y;

        DPoint::new(x, y)
    }

    /// Apply to a grid point, rounding the result back onto the grid.
    pub fn apply(&self, point: &Point) -> Point {
        let d = self.apply_d(&DPoint::new(point.x as f64, point.y as f64));
        Point::new(round_coord(d.x), round_coord(d.y))
    }

    /// Compose two transformations so that the result applies `child` first
    /// and then `parent`.
    ///
    /// Not commutative: in a placement hierarchy, `parent` is the
    /// transformation of the enclosing instance.
    pub fn cascade(parent: &Transform, child: &Transform) -> Transform {
        let child_rotation = if parent.mirror_x {
            -child.rotation
        } else {
            child.rotation
        };
        Transform {
            offset: parent.apply_d(&child.offset),
            rotation: normalize_degrees(parent.rotation + child_rotation),
            mirror_x: parent.mirror_x ^ child.mirror_x,
            scale: parent.scale * child.scale,
        }
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mirror = if self.mirror_x { "m" } else { "r" };
        write!(
            f,
            "{}{} *{} {},{}",
            mirror, self.rotation, self.scale, self.offset.x, self.offset.y
        )
    }
}

/// Normalize an angle into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    if (d - 360.0).abs() < 1e-12 {
        0.0
    } else {
        d
    }
}

/// Sine and cosine with exact values at multiples of 90 degrees, so
/// Manhattan placements stay on the grid.
fn rotation_sin_cos(degrees: f64) -> (f64, f64) {
    let d = normalize_degrees(degrees);
    if d == 0.0 {
        (0.0, 1.0)
    } else if d == 90.0 {
        (1.0, 0.0)
    } else if d == 180.0 {
        (0.0, -1.0)
    } else if d == 270.0 {
        (-1.0, 0.0)
    } else {
        d.to_radians().sin_cos()
    }
}

/// A reference to a subcell placed within a parent cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellInstance {
    pub id: InstanceId,
    pub cell_id: CellId,
    pub instance_name: String,
    pub transform: Transform,
}

impl CellInstance {
    pub fn new(cell_id: CellId, instance_name: &str, transform: Transform) -> Self {
        Self {
            id: Uuid::new_v4(),
            cell_id,
            instance_name: instance_name.to_string(),
            transform,
        }
    }
}

/// A primitive placed on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub layer_id: LayerId,
    pub geometry: GeomPrimitive,
}

impl Shape {
    pub fn new(layer_id: LayerId, geometry: GeomPrimitive) -> Self {
        Self { layer_id, geometry }
    }
}

/// A layout cell containing shapes and subcell references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: String,
    pub shapes: Vec<Shape>,
    pub instances: Vec<CellInstance>,
    pub modified: bool,
}

impl Cell {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            shapes: Vec::new(),
            instances: Vec::new(),
            modified: false,
        }
    }

    pub fn add_shape(&mut self, layer_id: LayerId, geom: GeomPrimitive) {
        self.shapes.push(Shape::new(layer_id, geom));
        self.modified = true;
    }

    /// Place `cell_id` in this cell and return the new instance's id.
    pub fn add_instance(&mut self, instance: CellInstance) -> InstanceId {
        let id = instance.id;
        self.instances.push(instance);
        self.modified = true;
        id
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&CellInstance> {
        self.instances.iter().find(|i| i.id == *id)
    }

    /// Compute the bounding box of all shapes in this cell (not including subcells).
    pub fn local_bbox(&self) -> Option<BBox> {
        self.shapes
            .iter()
            .filter_map(|s| s.geometry.bbox())
            .reduce(|acc, bb| acc.union(&bb))
    }

    /// Get all shapes on a specific layer.
    pub fn shapes_on_layer(&self, layer_id: LayerId) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(move |s| s.layer_id == layer_id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_cell_add_shape() {
        let mut cell = Cell::new("test_cell");
        cell.add_shape(0, GeomPrimitive::Rect(Rect::new(0, 0, 100, 50)));
        assert_eq!(cell.shape_count(), 1);
        assert!(cell.modified);
    }

    #[test]
    fn test_cell_bbox() {
        let mut cell = Cell::new("test_cell");
        cell.add_shape(0, GeomPrimitive::Rect(Rect::new(0, 0, 100, 50)));
        cell.add_shape(1, GeomPrimitive::Rect(Rect::new(50, 25, 200, 75)));
        let bb = cell.local_bbox().unwrap();
        assert_eq!(bb.min, Point::new(0, 0));
        assert_eq!(bb.max, Point::new(200, 75));
        assert_eq!(cell.shapes_on_layer(1).count(), 1);
    }

    #[test]
    fn test_transform_translate() {
        let t = Transform::translate(10.0, 20.0);
        assert_eq!(t.apply(&Point::new(5, 5)), Point::new(15, 25));
    }

    #[test]
    fn test_transform_mirror_then_rotate() {
        let t = Transform::new(DPoint::new(0.0, 0.0), 90.0, true, 1.0);
        // mirror: (3, 1) -> (3, -1); rotate 90: (1, 3)
        assert_eq!(t.apply(&Point::new(3, 1)), Point::new(1, 3));
    }

    #[test]
    fn test_cascade_matches_sequential_application() {
        let t1 = Transform::new(DPoint::new(100.0, -40.0), 90.0, true, 1.0);
        let t2 = Transform::new(DPoint::new(-7.0, 12.0), 270.0, false, 2.0);
        let t3 = Transform::new(DPoint::new(3.0, 3.0), 180.0, true, 1.0);
        let points = [Point::new(0, 0), Point::new(13, -5), Point::new(-250, 75)];
        for p in points {
            let sequential = t2.apply(&t1.apply(&p));
            assert_eq!(Transform::cascade(&t2, &t1).apply(&p), sequential);
            let sequential = t3.apply(&t2.apply(&p));
            assert_eq!(Transform::cascade(&t3, &t2).apply(&p), sequential);
        }
    }

    #[test]
    fn test_cascade_identity() {
        let t = Transform::new(DPoint::new(520.0, 130.0), 180.0, true, 1.0);
        assert_eq!(Transform::cascade(&t, &Transform::identity()), t);
    }
}
