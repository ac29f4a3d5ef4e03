use serde::{Deserialize, Serialize};

use crate::database::LayoutError;
use crate::geometry::Coord;

/// Layer identifier used by shapes.
pub type LayerId = u32;

/// A named technology layer and its GDS layer/datatype pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub gds: (u16, u16),
}

impl Layer {
    pub fn new(id: LayerId, name: &str, gds: (u16, u16)) -> Self {
        Self {
            id,
            name: name.to_string(),
            gds,
        }
    }
}

/// Process technology: its name, database unit and named layers.
///
/// Extraction looks layers up by name: `Waveguide` for waveguide cores,
/// `PinRec` for pins and their labels, `DevRec` for component outlines and
/// metadata, and the optional `FbrTgt` for fibre targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    /// Micrometres per database unit.
    pub dbu: f64,
    layers: Vec<Layer>,
}

impl Technology {
    pub fn new(name: &str, dbu: f64) -> Self {
        Self {
            name: name.to_string(),
            dbu,
            layers: Vec::new(),
        }
    }

    /// Builder form of [`Technology::add_layer`]; a layer whose name is
    /// already taken replaces the earlier one.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.add_layer(layer);
        self
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.retain(|l| l.name != layer.name);
        self.layers.push(layer);
    }

    /// Look up a layer id by its technology name (e.g. "Waveguide", "PinRec").
    pub fn layer(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().find(|l| l.name == name).map(|l| l.id)
    }

    pub fn layer_by_gds(&self, gds: (u16, u16)) -> Option<&Layer> {
        self.layers.iter().find(|l| l.gds == gds)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Convert micrometres to database units.
    pub fn to_dbu(&self, microns: f64) -> Coord {
        (microns / self.dbu).round() as Coord
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Technology {
    /// A generic silicon photonics stack on a 1 nm grid.
    fn default() -> Self {
        Self::new("generic", 0.001)
            .with_layer(Layer::new(1, "Waveguide", (1, 0)))
            .with_layer(Layer::new(10, "PinRec", (1, 10)))
            .with_layer(Layer::new(68, "DevRec", (68, 0)))
            .with_layer(Layer::new(81, "FbrTgt", (81, 0)))
    }
}
