use serde::{Deserialize, Serialize};

use crate::cell::Transform;

/// Integer coordinate in database units.
pub type Coord = i64;

/// A 2D point in layout coordinates (database units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Midpoint of two points, rounded to the database grid.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new(
            round_coord((self.x + other.x) as f64 * 0.5),
            round_coord((self.y + other.y) as f64 * 0.5),
        )
    }

    /// Convert to micrometres using the technology's database unit.
    pub fn to_dpoint(&self, dbu: f64) -> DPoint {
        DPoint::new(self.x as f64 * dbu, self.y as f64 * dbu)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }
}

impl std::ops::Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: Vector) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// The difference between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: Coord,
    pub y: Coord,
}

impl Vector {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Direction of the vector in degrees, in the range (-180, 180].
    pub fn angle_degrees(&self) -> f64 {
        (self.y as f64).atan2(self.x as f64).to_degrees()
    }

    pub fn length(&self) -> f64 {
        ((self.x as f64).powi(2) + (self.y as f64).powi(2)).sqrt()
    }
}

/// A 2D point in physical coordinates (micrometres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DPoint {
    pub x: f64,
    pub y: f64,
}

impl DPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Snap a position held in floating database units onto the grid.
    pub fn round(&self) -> Point {
        Point::new(round_coord(self.x), round_coord(self.y))
    }
}

impl std::fmt::Display for DPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

pub(crate) fn round_coord(v: f64) -> Coord {
    v.round() as Coord
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    /// Grow the box by `d` on every side.
    pub fn enlarged(&self, d: Coord) -> Self {
        Self {
            min: self.min.translate(-d, -d),
            max: self.max.translate(d, d),
        }
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The box in micrometres as `[min_x, min_y, max_x, max_y]`.
    pub fn to_micron_array(&self, dbu: f64) -> [f64; 4] {
        [
            self.min.x as f64 * dbu,
            self.min.y as f64 * dbu,
            self.max.x as f64 * dbu,
            self.max.y as f64 * dbu,
        ]
    }
}

/// A box defined by lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub lower_left: Point,
    pub upper_right: Point,
}

impl Rect {
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self {
            lower_left: Point::new(x1.min(x2), y1.min(y2)),
            upper_right: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(self.lower_left, self.upper_right)
    }

    pub fn center(&self) -> Point {
        self.bbox().center()
    }

    pub fn width(&self) -> Coord {
        self.upper_right.x - self.lower_left.x
    }

    pub fn height(&self) -> Coord {
        self.upper_right.y - self.lower_left.y
    }

    pub fn area(&self) -> Coord {
        self.width() * self.height()
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.bbox().contains_point(p)
    }

    pub fn to_polygon(&self) -> Polygon {
        let (ll, ur) = (self.lower_left, self.upper_right);
        Polygon::new(vec![
            ll,
            Point::new(ur.x, ll.y),
            ur,
            Point::new(ll.x, ur.y),
        ])
    }

    /// Transform the corners and take their bounding box. Exact for
    /// Manhattan rotations.
    pub fn transformed(&self, trans: &Transform) -> Self {
        let corners: Vec<Point> = self
            .to_polygon()
            .vertices
            .iter()
            .map(|p| trans.apply(p))
            .collect();
        let bbox = BBox::from_points(&corners).unwrap_or(self.bbox());
        Self {
            lower_left: bbox.min,
            upper_right: bbox.max,
        }
    }
}

/// A polygon defined by its hull and optional holes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self {
            vertices,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(vertices: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { vertices, holes }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    pub fn transformed(&self, trans: &Transform) -> Self {
        Self {
            vertices: self.vertices.iter().map(|p| trans.apply(p)).collect(),
            holes: self
                .holes
                .iter()
                .map(|hole| hole.iter().map(|p| trans.apply(p)).collect())
                .collect(),
        }
    }

    /// Unsigned area of the hull minus the holes (shoelace formula).
    pub fn area(&self) -> f64 {
        let ring_area = |ring: &[Point]| -> f64 {
            let n = ring.len();
            if n < 3 {
                return 0.0;
            }
            let twice: i128 = (0..n)
                .map(|i| {
                    let a = ring[i];
                    let b = ring[(i + 1) % n];
                    a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
                })
                .sum();
            (twice as f64 / 2.0).abs()
        };
        ring_area(&self.vertices) - self.holes.iter().map(|h| ring_area(h)).sum::<f64>()
    }
}

/// A path (waveguide or pin marker) defined by a centerline and width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point>,
    pub width: Coord,
}

impl Path {
    pub fn new(points: Vec<Point>, width: Coord) -> Self {
        Self { points, width }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points).map(|bb| bb.enlarged(self.width / 2))
    }

    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    pub fn transformed(&self, trans: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| trans.apply(p)).collect(),
            width: round_coord(self.width as f64 * trans.scale.abs()),
        }
    }

    /// Swept outline of each segment. The path's two ends are flat; at each
    /// bend both adjoining segments run on by half the width, giving a
    /// square join with no notch on the outside of the corner. Zero-length
    /// segments are dropped.
    pub fn polygons(&self) -> Vec<Polygon> {
        let half = self.width as f64 / 2.0;
        let segments: Vec<(Point, Point)> = self
            .points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|(a, b)| a != b)
            .collect();
        let last = segments.len().saturating_sub(1);
        segments
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| {
                let d = b - a;
                let len = d.length();
                // unit direction and normal, scaled to half the width
                let (ux, uy) = (d.x as f64 / len * half, d.y as f64 / len * half);
                let (nx, ny) = (-uy, ux);
                let lead = if i > 0 { 1.0 } else { 0.0 };
                let trail = if i < last { 1.0 } else { 0.0 };
                let corner = |p: Point, along: f64, side: f64| {
                    Point::new(
                        round_coord(p.x as f64 + along * ux + side * nx),
                        round_coord(p.y as f64 + along * uy + side * ny),
                    )
                };
                Polygon::new(vec![
                    corner(a, -lead, -1.0),
                    corner(b, trail, -1.0),
                    corner(b, trail, 1.0),
                    corner(a, -lead, 1.0),
                ])
            })
            .collect()
    }
}

/// A text annotation, used for pin names and device metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub string: String,
    pub position: Point,
}

impl Text {
    pub fn new(string: &str, position: Point) -> Self {
        Self {
            string: string.to_string(),
            position,
        }
    }

    pub fn transformed(&self, trans: &Transform) -> Self {
        Self {
            string: self.string.clone(),
            position: trans.apply(&self.position),
        }
    }
}

/// A geometric primitive in the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeomPrimitive {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
    Text(Text),
}

impl GeomPrimitive {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            GeomPrimitive::Rect(r) => Some(r.bbox()),
            GeomPrimitive::Polygon(p) => p.bbox(),
            GeomPrimitive::Path(p) => p.bbox(),
            GeomPrimitive::Text(t) => Some(BBox::new(t.position, t.position)),
        }
    }

    pub fn transformed(&self, trans: &Transform) -> Self {
        match self {
            GeomPrimitive::Rect(r) => GeomPrimitive::Rect(r.transformed(trans)),
            GeomPrimitive::Polygon(p) => GeomPrimitive::Polygon(p.transformed(trans)),
            GeomPrimitive::Path(p) => GeomPrimitive::Path(p.transformed(trans)),
            GeomPrimitive::Text(t) => GeomPrimitive::Text(t.transformed(trans)),
        }
    }

    /// Area-bearing outline(s) of the primitive. Text has none.
    pub fn polygons(&self) -> Vec<Polygon> {
        match self {
            GeomPrimitive::Rect(r) => vec![r.to_polygon()],
            GeomPrimitive::Polygon(p) => vec![p.clone()],
            GeomPrimitive::Path(p) => p.polygons(),
            GeomPrimitive::Text(_) => Vec::new(),
        }
    }
}
