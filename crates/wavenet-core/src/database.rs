use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cell::{Cell, CellId, Shape, Transform};
use crate::layer::Technology;
use crate::LayerId;

/// Instances nested deeper than this are treated as a recursive hierarchy.
pub const MAX_HIERARCHY_DEPTH: usize = 64;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Cell {0} is not defined in the layout")]
    UnknownCell(CellId),

    #[error("Cell hierarchy below '{0}' is too deep (recursive instance?)")]
    HierarchyTooDeep(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A shape reached through the cell hierarchy, together with the accumulated
/// transformation into the coordinates of the cell the walk started from.
#[derive(Debug, Clone)]
pub struct ShapeRef<'a> {
    pub shape: &'a Shape,
    pub trans: Transform,
    pub cell_id: CellId,
}

/// The central layout database that holds all cells and the technology.
#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutDatabase {
    /// Database identifier.
    pub id: Uuid,
    /// Layout name.
    pub name: String,
    /// Active technology (database unit and named layers).
    pub technology: Technology,
    /// All cells indexed by ID.
    cells: HashMap<CellId, Cell>,
    /// Top-level cell (entry point for hierarchy).
    pub top_cell: Option<CellId>,
}

impl LayoutDatabase {
    pub fn new(name: &str, technology: Technology) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            technology,
            cells: HashMap::new(),
            top_cell: None,
        }
    }

    pub fn dbu(&self) -> f64 {
        self.technology.dbu
    }

    // ── Cell management ──────────────────────────────────────────────

    pub fn add_cell(&mut self, cell: Cell) -> CellId {
        let id = cell.id;
        self.cells.insert(id, cell);
        if self.top_cell.is_none() {
            self.top_cell = Some(id);
        }
        id
    }

    pub fn get_cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn cell(&self, id: &CellId) -> Result<&Cell, LayoutError> {
        self.cells.get(id).ok_or(LayoutError::UnknownCell(*id))
    }

    pub fn find_cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.cells.values().find(|c| c.name == name)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn all_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    // ── Hierarchical shape queries ───────────────────────────────────

    /// Collect every shape on `layer_id` in `cell_id` and its subcells, each
    /// with the transformation that maps it into `cell_id`'s coordinates.
    pub fn begin_shapes_rec(
        &self,
        cell_id: &CellId,
        layer_id: LayerId,
    ) -> Result<Vec<ShapeRef<'_>>, LayoutError> {
        let mut out = Vec::new();
        self.collect_shapes(cell_id, layer_id, Transform::identity(), 0, &mut out)?;
        Ok(out)
    }

    fn collect_shapes<'a>(
        &'a self,
        cell_id: &CellId,
        layer_id: LayerId,
        trans: Transform,
        depth: usize,
        out: &mut Vec<ShapeRef<'a>>,
    ) -> Result<(), LayoutError> {
        let cell = self.cell(cell_id)?;
        if depth > MAX_HIERARCHY_DEPTH {
            return Err(LayoutError::HierarchyTooDeep(cell.name.clone()));
        }

        out.extend(cell.shapes_on_layer(layer_id).map(|shape| ShapeRef {
            shape,
            trans,
            cell_id: *cell_id,
        }));

        for inst in &cell.instances {
            let child_trans = Transform::cascade(&trans, &inst.transform);
            self.collect_shapes(&inst.cell_id, layer_id, child_trans, depth + 1, out)?;
        }
        Ok(())
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellInstance;
    use crate::geometry::{GeomPrimitive, Point, Rect};

    #[test]
    fn test_database_create() {
        let db = LayoutDatabase::new("test_project", Technology::default());
        assert_eq!(db.name, "test_project");
        assert_eq!(db.cell_count(), 0);
        assert!(db.top_cell.is_none());
    }

    #[test]
    fn test_add_and_find_cell() {
        let mut db = LayoutDatabase::new("test", Technology::default());
        let id = db.add_cell(Cell::new("ring_resonator"));
        assert_eq!(db.cell_count(), 1);
        assert!(db.get_cell(&id).is_some());
        assert_eq!(db.find_cell_by_name("ring_resonator").unwrap().name, "ring_resonator");
        assert_eq!(db.top_cell, Some(id));
    }

    #[test]
    fn test_begin_shapes_rec_accumulates_transforms() {
        let mut db = LayoutDatabase::new("test", Technology::default());

        let mut leaf = Cell::new("leaf");
        leaf.add_shape(1, GeomPrimitive::Rect(Rect::new(0, 0, 10, 10)));
        leaf.add_shape(2, GeomPrimitive::Rect(Rect::new(0, 0, 99, 99)));
        let leaf_id = leaf.id;

        let mut mid = Cell::new("mid");
        mid.add_instance(CellInstance::new(leaf_id, "l0", Transform::translate(100.0, 0.0)));
        let mid_id = mid.id;

        let mut top = Cell::new("top");
        top.add_shape(1, GeomPrimitive::Rect(Rect::new(-5, -5, 5, 5)));
        top.add_instance(CellInstance::new(mid_id, "m0", Transform::rotate(90.0)));
        let top_id = top.id;

        db.add_cell(top);
        db.add_cell(mid);
        db.add_cell(leaf);

        let shapes = db.begin_shapes_rec(&top_id, 1).unwrap();
        assert_eq!(shapes.len(), 2);
        let leaf_ref = shapes.iter().find(|s| s.cell_id == leaf_id).unwrap();
        // translate by 100 in x, then rotate by 90 degrees
        assert_eq!(leaf_ref.trans.apply(&Point::new(0, 0)), Point::new(0, 100));
    }

    #[test]
    fn test_begin_shapes_rec_unknown_child() {
        let mut db = LayoutDatabase::new("test", Technology::default());
        let mut top = Cell::new("top");
        top.add_instance(CellInstance::new(Uuid::new_v4(), "ghost", Transform::identity()));
        let top_id = db.add_cell(top);
        assert!(matches!(
            db.begin_shapes_rec(&top_id, 1),
            Err(LayoutError::UnknownCell(_))
        ));
    }

    #[test]
    fn test_recursive_hierarchy_is_an_error() {
        let mut db = LayoutDatabase::new("test", Technology::default());
        let mut top = Cell::new("loop");
        let top_id = top.id;
        top.add_instance(CellInstance::new(top_id, "self", Transform::identity()));
        db.add_cell(top);
        assert!(matches!(
            db.begin_shapes_rec(&top_id, 1),
            Err(LayoutError::HierarchyTooDeep(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_technology() {
        let mut db = LayoutDatabase::new("chip", Technology::default());
        db.add_cell(Cell::new("top"));
        let json = db.to_json().unwrap();
        let back = LayoutDatabase::from_json(&json).unwrap();
        assert_eq!(back.technology.layer("DevRec"), Some(68));
        assert_eq!(back.cell_count(), 1);
    }
}
