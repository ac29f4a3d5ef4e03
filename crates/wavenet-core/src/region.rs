use geo::{BooleanOps, Coord as GeoCoord, LineString, MultiPolygon};

use crate::geometry::{round_coord, Path, Point, Polygon};

/// A set of polygons that can be merged into non-overlapping outlines.
///
/// Shapes are collected first and unioned on demand by [`Region::merged`].
#[derive(Debug, Clone, Default)]
pub struct Region {
    polygons: Vec<geo::Polygon<f64>>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, polygon: &Polygon) {
        if polygon.vertices.len() >= 3 {
            self.polygons.push(to_geo_polygon(polygon));
        }
    }

    /// Insert the swept outline of a path.
    pub fn insert_path(&mut self, path: &Path) {
        for poly in path.polygons() {
            self.insert(&poly);
        }
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Union all inserted shapes and return the merged polygons.
    pub fn merged(&self) -> Vec<Polygon> {
        let merged = self
            .polygons
            .iter()
            .fold(MultiPolygon::new(Vec::new()), |acc, poly| {
                acc.union(&MultiPolygon::new(vec![poly.clone()]))
            });
        log::debug!(
            "Merged {} shapes into {} polygons",
            self.polygons.len(),
            merged.0.len()
        );
        merged.0.iter().map(from_geo_polygon).collect()
    }
}

pub fn to_geo_polygon(polygon: &Polygon) -> geo::Polygon<f64> {
    let ring = |pts: &[Point]| -> LineString<f64> {
        LineString::from(
            pts.iter()
                .map(|p| GeoCoord {
                    x: p.x as f64,
                    y: p.y as f64,
                })
                .collect::<Vec<_>>(),
        )
    };
    geo::Polygon::new(
        ring(&polygon.vertices),
        polygon.holes.iter().map(|h| ring(h)).collect(),
    )
}

pub fn from_geo_polygon(polygon: &geo::Polygon<f64>) -> Polygon {
    let ring = |ls: &LineString<f64>| -> Vec<Point> {
        let mut pts: Vec<Point> = ls
            .coords()
            .map(|c| Point::new(round_coord(c.x), round_coord(c.y)))
            .collect();
        // geo rings are closed; drop the repeated first point
        if pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        pts
    };
    Polygon::with_holes(
        ring(polygon.exterior()),
        polygon.interiors().iter().map(ring).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_overlapping_boxes_merge() {
        let mut region = Region::new();
        region.insert(&Rect::new(0, 0, 10, 10).to_polygon());
        region.insert(&Rect::new(5, 0, 20, 10).to_polygon());
        let merged = region.merged();
        assert_eq!(merged.len(), 1);
        let bb = merged[0].bbox().unwrap();
        assert_eq!(bb.min, Point::new(0, 0));
        assert_eq!(bb.max, Point::new(20, 10));
        assert!((merged[0].area() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_boxes_stay_separate() {
        let mut region = Region::new();
        region.insert(&Rect::new(0, 0, 10, 10).to_polygon());
        region.insert(&Rect::new(30, 30, 40, 40).to_polygon());
        assert_eq!(region.merged().len(), 2);
    }

    #[test]
    fn test_path_joins_region() {
        let mut region = Region::new();
        region.insert(&Rect::new(0, -5, 10, 5).to_polygon());
        region.insert_path(&Path::new(vec![Point::new(10, 0), Point::new(30, 0)], 4));
        let merged = region.merged();
        assert_eq!(merged.len(), 1);
        assert!((merged[0].area() - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_region() {
        assert!(Region::new().merged().is_empty());
    }
}
