use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Point};

/// An entry in the R-tree spatial index, referencing an item by its index.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    /// Index into the caller's item vector.
    pub index: usize,
    /// Bounding box of the item.
    pub bbox: BBox,
}

impl SpatialEntry {
    /// An entry for a point-like item such as a pin center.
    pub fn at_point(index: usize, point: Point) -> Self {
        Self {
            index,
            bbox: BBox::new(point, point),
        }
    }
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index for point and box queries.
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build the index from a list of bounding boxes.
    pub fn build(entries: Vec<SpatialEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    /// Find all entries whose bounding box contains the given point.
    pub fn query_point(&self, point: &Point) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_point([point.x, point.y]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    /// Find all entries whose bounding box touches the given box.
    pub fn query_bbox(&self, bbox: &BBox) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    /// Find all entries within `tolerance` (per axis) of a point.
    pub fn query_near(&self, point: &Point, tolerance: i64) -> Vec<&SpatialEntry> {
        self.query_bbox(&BBox::new(*point, *point).enlarged(tolerance))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_queries_include_abutting_boxes() {
        let outline = |index, x0, x1| SpatialEntry {
            index,
            bbox: BBox::new(Point::new(x0, -1000), Point::new(x1, 1000)),
        };
        let index = SpatialIndex::build(vec![outline(0, 0, 10_000), outline(1, 10_000, 20_000), outline(2, 30_000, 40_000)]);

        let hits = index.query_point(&Point::new(10_000, 0));
        assert_eq!(hits.len(), 2);

        let hits = index.query_bbox(&BBox::new(Point::new(35_000, 0), Point::new(36_000, 10)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 2);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_point_query_inside_and_outside() {
        let index = SpatialIndex::build(vec![
            SpatialEntry { index: 0, bbox: BBox::new(Point::new(0, 0), Point::new(100, 100)) },
            SpatialEntry { index: 1, bbox: BBox::new(Point::new(50, 50), Point::new(200, 200)) },
        ]);
        let indices = |p: Point| {
            let mut v: Vec<usize> = index.query_point(&p).iter().map(|e| e.index).collect();
            v.sort();
            v
        };
        assert_eq!(indices(Point::new(10, 10)), vec![0]);
        assert_eq!(indices(Point::new(75, 60)), vec![0, 1]);
        assert_eq!(indices(Point::new(200, 200)), vec![1]);
        assert!(indices(Point::new(-1, 50)).is_empty());
    }

    #[test]
    fn test_query_near_points() {
        let index = SpatialIndex::build(vec![
            SpatialEntry::at_point(0, Point::new(1000, 0)),
            SpatialEntry::at_point(1, Point::new(1001, 1)),
            SpatialEntry::at_point(2, Point::new(1100, 0)),
        ]);
        let mut hits: Vec<usize> = index
            .query_near(&Point::new(1000, 0), 2)
            .iter()
            .map(|e| e.index)
            .collect();
        hits.sort();
        assert_eq!(hits, vec![0, 1]);
    }
}
