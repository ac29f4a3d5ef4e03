use serde::{Deserialize, Serialize};

use wavenet_core::{
    CellId, DPoint, GeomPrimitive, InstanceId, LayoutDatabase, Path, Point, Polygon, Region,
    Transform, Vector,
};

use crate::error::NetlistError;
use crate::extract::PinFinder;
use crate::model::{model_key, ModelRegistry};
use crate::params::{parse_params, Params};
use crate::pin::{Pin, PinType};

/// Length by which pin paths are extended past the component outline, in
/// micrometres, so simulation regions overlap the neighbouring structure.
pub const PIN_EXTENSION_UM: f64 = 1.0;

/// Component index, unique within a netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ComponentId(pub usize);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to construct a [`Component`].
#[derive(Debug, Clone, Default)]
pub struct ComponentInit {
    pub idx: ComponentId,
    /// Component (model) name.
    pub component: String,
    /// Basic name, mostly relevant for PCells.
    pub basic_name: Option<String>,
    /// Library cell name.
    pub cell_name: Option<String>,
    pub cell: Option<CellId>,
    pub instance: Option<InstanceId>,
    pub instance_name: Option<String>,
    pub trans: Transform,
    /// Compact model library.
    pub library: Option<String>,
    /// Spice parameters, space-separated `key=value`.
    pub params: Option<String>,
    pub pins: Vec<Pin>,
    /// DevRec outline in layout coordinates.
    pub polygon: Polygon,
    /// DevRec outline in the component cell's own coordinates.
    pub devrec_polygon: Option<Polygon>,
}

/// A placed layout component with its pins and model metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub idx: ComponentId,
    pub component: String,
    pub basic_name: Option<String>,
    pub cell_name: Option<String>,
    pub cell: Option<CellId>,
    pub instance: Option<InstanceId>,
    pub instance_name: Option<String>,
    pub trans: Transform,
    pub library: Option<String>,
    pub params: Option<String>,
    pub devrec_polygon: Option<Polygon>,
    pins: Vec<Pin>,
    polygon: Polygon,
    center: Point,
    dcenter: DPoint,
    dbu: f64,
}

impl Component {
    /// Build a component. `dbu` is the technology's micrometres per database
    /// unit, used for [`Component::dcenter`].
    pub fn new(init: ComponentInit, dbu: f64) -> Self {
        let mut component = Self {
            idx: init.idx,
            component: init.component,
            basic_name: init.basic_name,
            cell_name: init.cell_name,
            cell: init.cell,
            instance: init.instance,
            instance_name: init.instance_name,
            trans: init.trans,
            library: init.library,
            params: init.params,
            devrec_polygon: init.devrec_polygon,
            pins: Vec::new(),
            polygon: Polygon::new(Vec::new()),
            center: Point::default(),
            dcenter: DPoint::default(),
            dbu,
        };
        component.set_polygon(init.polygon);
        for pin in init.pins {
            component.add_pin(pin);
        }
        component
    }

    // ── Pins ─────────────────────────────────────────────────────────

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }

    pub fn pin(&self, index: usize) -> Option<&Pin> {
        self.pins.get(index)
    }

    pub fn npins(&self) -> usize {
        self.pins.len()
    }

    /// Take ownership of a pin and return its index in this component.
    pub fn add_pin(&mut self, mut pin: Pin) -> usize {
        pin.set_component(self.idx);
        self.pins.push(pin);
        self.pins.len() - 1
    }

    pub fn pins_of_type(&self, pin_type: PinType) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(move |p| p.pin_type() == pin_type)
    }

    /// Ask the layout collaborator for this component's pins.
    pub fn find_pins<F: PinFinder + ?Sized>(&self, finder: &F) -> Result<Vec<Pin>, NetlistError> {
        finder.find_pins_component(self)
    }

    pub(crate) fn set_idx(&mut self, idx: ComponentId) {
        self.idx = idx;
        for pin in &mut self.pins {
            pin.set_component(idx);
        }
    }

    // ── Geometry ─────────────────────────────────────────────────────

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Replace the DevRec outline; the center follows.
    pub fn set_polygon(&mut self, polygon: Polygon) {
        self.center = polygon.bbox().map(|bb| bb.center()).unwrap_or_default();
        self.dcenter = self.center.to_dpoint(self.dbu);
        self.polygon = polygon;
    }

    /// Center of the DevRec outline's bounding box, in database units.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Center in micrometres.
    pub fn dcenter(&self) -> DPoint {
        self.dcenter
    }

    /// Move the component: outline, pins and placement together.
    pub fn transform(&mut self, trans: &Transform) -> &mut Self {
        let polygon = self.polygon.transformed(trans);
        self.set_polygon(polygon);
        for pin in &mut self.pins {
            pin.transform(trans);
        }
        self.trans = Transform::cascade(trans, &self.trans);
        self
    }

    /// Waveguide outline of the component cell, merged into non-overlapping
    /// polygons in the cell's coordinates.
    ///
    /// With `include_pins`, each pin path is extended outward by
    /// [`PIN_EXTENSION_UM`] and merged in as well. The layout is not modified.
    pub fn get_polygons(
        &self,
        layout: &LayoutDatabase,
        include_pins: bool,
    ) -> Result<Vec<Polygon>, NetlistError> {
        let cell = self.cell.ok_or(NetlistError::NoCell(self.idx))?;
        let tech = &layout.technology;
        let waveguide = tech
            .layer("Waveguide")
            .ok_or(NetlistError::MissingLayer("Waveguide"))?;

        let mut region = Region::new();
        for s in layout.begin_shapes_rec(&cell, waveguide)? {
            for poly in s.shape.geometry.polygons() {
                region.insert(&poly.transformed(&s.trans));
            }
        }

        if include_pins {
            let pin_layer = tech.layer("PinRec").ok_or(NetlistError::MissingLayer("PinRec"))?;
            let extension = tech.to_dbu(PIN_EXTENSION_UM);
            for s in layout.begin_shapes_rec(&cell, pin_layer)? {
                if let GeomPrimitive::Path(path) = &s.shape.geometry {
                    match extend_pin_path(&path.transformed(&s.trans), extension) {
                        Some(extended) => region.insert_path(&extended),
                        None => log::warn!(
                            "Skipping pin path with {} points in component {}",
                            path.points.len(),
                            self.component
                        ),
                    }
                }
            }
        }

        Ok(region.merged())
    }

    // ── Model metadata ───────────────────────────────────────────────

    pub fn params_dict(&self) -> Result<Params, NetlistError> {
        match self.params.as_deref() {
            Some(params) => parse_params(params),
            None => Ok(Params::new()),
        }
    }

    /// Whether the simulator has a compact model for this component.
    pub fn has_model<R: ModelRegistry + ?Sized>(&self, technology: &str, registry: &R) -> bool {
        let key = model_key(self.library.as_deref(), &self.component, technology);
        registry.contains_model(&key)
    }

    /// Diagnostic report, pins grouped by type.
    pub fn display<R: ModelRegistry + ?Sized>(&self, technology: &str, registry: &R) -> String {
        let group = |pin_type: PinType| -> String {
            let entries: Vec<String> = self
                .pins_of_type(pin_type)
                .map(|p| {
                    format!(
                        "[{}, {}, {}]",
                        p.pin_name.as_deref().unwrap_or("?"),
                        p.center(),
                        p.net()
                    )
                })
                .collect();
            format!("[{}]", entries.join(", "))
        };
        let text = format!(
            "- basic_name: {}, component: {}-{} / {}; transformation: {}; center position: {}; \
             number of pins: {}; optical pins: {}; electrical pins: {}; optical IO pins: {}; \
             has compact model: {}; params: {}.",
            self.basic_name.as_deref().unwrap_or("-"),
            self.component,
            self.idx,
            self.instance_name.as_deref().unwrap_or("-"),
            self.trans,
            self.dcenter,
            self.npins(),
            group(PinType::Optical),
            group(PinType::Electrical),
            group(PinType::OpticalIo),
            self.has_model(technology, registry),
            self.params.as_deref().unwrap_or("")
        );
        log::debug!("{text}");
        text
    }
}

/// Push the outer end of a 2-point pin path further out by `extension`
/// along the pin direction.
fn extend_pin_path(path: &Path, extension: i64) -> Option<Path> {
    let [p0, p1] = path.points.as_slice() else {
        return None;
    };
    // direction pointing back into the component
    let inward = (*p0 - *p1).angle_degrees().to_radians();
    let step = Vector::new(
        (inward.cos() * extension as f64).round() as i64,
        (inward.sin() * extension as f64).round() as i64,
    );
    Some(Path::new(vec![*p0, *p1 - step], path.width))
}
