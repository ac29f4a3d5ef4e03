//! Layout traversal: recognise components and their pins in a layout, and
//! group coincident pins into nets.

use wavenet_core::{
    BBox, CellId, Coord, GeomPrimitive, LayerId, LayoutDatabase, Polygon, SpatialEntry,
    SpatialIndex, Text, Transform,
};

use crate::component::{Component, ComponentInit};
use crate::error::NetlistError;
use crate::net::{NetId, NetType, PinRef};
use crate::netlist::Netlist;
use crate::pin::{Pin, PinType};

const LIBRARY_PREFIX: &str = "Lumerical_INTERCONNECT_library=";
const COMPONENT_PREFIX: &str = "Lumerical_INTERCONNECT_component=";
const SPICE_PREFIX: &str = "Spice_param:";

/// Source of a component's pins, typically the layout it was found in.
pub trait PinFinder {
    /// Pins of `component`, in layout coordinates.
    fn find_pins_component(&self, component: &Component) -> Result<Vec<Pin>, NetlistError>;
}

/// Finds components and pins in a layout using the technology's PinRec,
/// DevRec and (optional) FbrTgt layers.
pub struct LayoutExtractor<'a> {
    layout: &'a LayoutDatabase,
    pin_layer: LayerId,
    devrec_layer: LayerId,
    fiber_layer: Option<LayerId>,
}

impl<'a> LayoutExtractor<'a> {
    pub fn new(layout: &'a LayoutDatabase) -> Result<Self, NetlistError> {
        let tech = &layout.technology;
        Ok(Self {
            layout,
            pin_layer: tech.layer("PinRec").ok_or(NetlistError::MissingLayer("PinRec"))?,
            devrec_layer: tech.layer("DevRec").ok_or(NetlistError::MissingLayer("DevRec"))?,
            fiber_layer: tech.layer("FbrTgt"),
        })
    }

    /// Pins of a cell, in that cell's coordinates.
    ///
    /// Paths on PinRec become optical pins, boxes electrical pins, and shapes
    /// on FbrTgt optical I/O pins. A PinRec text inside a pin's bounding box
    /// names it. Optical paths without exactly two points are skipped.
    pub fn find_pins(&self, cell: &CellId) -> Result<Vec<Pin>, NetlistError> {
        let pin_shapes: Vec<GeomPrimitive> = self
            .layout
            .begin_shapes_rec(cell, self.pin_layer)?
            .iter()
            .map(|s| s.shape.geometry.transformed(&s.trans))
            .collect();
        let labels: Vec<&Text> = pin_shapes
            .iter()
            .filter_map(|g| match g {
                GeomPrimitive::Text(t) => Some(t),
                _ => None,
            })
            .collect();
        let label_in = |bbox: Option<BBox>| {
            bbox.and_then(|bbox| {
                labels
                    .iter()
                    .find(|t| bbox.contains_point(&t.position))
                    .map(|t| t.string.as_str())
            })
        };

        let mut pins = Vec::new();
        for geom in &pin_shapes {
            let pin = match geom {
                GeomPrimitive::Path(path) => Pin::optical(path.clone(), label_in(path.bbox())),
                GeomPrimitive::Rect(rect) => Pin::electrical(*rect, label_in(Some(rect.bbox()))),
                _ => continue,
            };
            match pin {
                Ok(pin) => pins.push(pin),
                Err(e @ NetlistError::InvalidPinPath { .. }) => {
                    log::warn!("Skipping pin in cell {cell}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(fiber_layer) = self.fiber_layer {
            for s in self.layout.begin_shapes_rec(cell, fiber_layer)? {
                let polygon: Option<Polygon> = match &s.shape.geometry {
                    GeomPrimitive::Polygon(p) => Some(p.transformed(&s.trans)),
                    GeomPrimitive::Rect(r) => Some(r.to_polygon().transformed(&s.trans)),
                    _ => None,
                };
                if let Some(polygon) = polygon {
                    let name = label_in(polygon.bbox());
                    pins.push(Pin::optical_io(polygon, name)?);
                }
            }
        }

        log::debug!("Found {} pins in cell {cell}", pins.len());
        Ok(pins)
    }

    /// Every placed component below `top`, with its pins in `top`'s
    /// coordinates. A cell is a component when it carries a DevRec shape;
    /// other cells are searched through.
    pub fn find_components(&self, top: &CellId) -> Result<Netlist, NetlistError> {
        let mut netlist = Netlist::new();
        let cell = self.layout.cell(top)?;
        for inst in &cell.instances {
            self.collect_components(&inst.cell_id, inst, &inst.transform, 0, &mut netlist)?;
        }
        log::info!(
            "Found {} components in cell '{}'",
            netlist.component_count(),
            cell.name
        );
        Ok(netlist)
    }

    fn collect_components(
        &self,
        cell_id: &CellId,
        inst: &wavenet_core::CellInstance,
        trans: &Transform,
        depth: usize,
        netlist: &mut Netlist,
    ) -> Result<(), NetlistError> {
        let cell = self.layout.cell(cell_id)?;
        if depth > wavenet_core::database::MAX_HIERARCHY_DEPTH {
            return Err(wavenet_core::LayoutError::HierarchyTooDeep(cell.name.clone()).into());
        }

        let devrec = cell.shapes_on_layer(self.devrec_layer).find_map(|s| match &s.geometry {
            GeomPrimitive::Polygon(p) => Some(p.clone()),
            GeomPrimitive::Rect(r) => Some(r.to_polygon()),
            _ => None,
        });

        let Some(devrec) = devrec else {
            for child in &cell.instances {
                let child_trans = Transform::cascade(trans, &child.transform);
                self.collect_components(&child.cell_id, child, &child_trans, depth + 1, netlist)?;
            }
            return Ok(());
        };

        let mut init = ComponentInit {
            component: cell.name.clone(),
            basic_name: Some(cell.name.clone()),
            cell_name: Some(cell.name.clone()),
            cell: Some(*cell_id),
            instance: Some(inst.id),
            instance_name: Some(inst.instance_name.clone()),
            trans: *trans,
            polygon: devrec.transformed(trans),
            devrec_polygon: Some(devrec),
            ..Default::default()
        };
        for s in cell.shapes_on_layer(self.devrec_layer) {
            if let GeomPrimitive::Text(t) = &s.geometry {
                apply_devrec_label(&mut init, &t.string);
            }
        }
        init.pins = self
            .find_pins(cell_id)?
            .into_iter()
            .map(|p| p.transformed(trans))
            .collect();

        netlist.add_component(Component::new(init, self.layout.dbu()));
        Ok(())
    }
}

impl PinFinder for LayoutExtractor<'_> {
    fn find_pins_component(&self, component: &Component) -> Result<Vec<Pin>, NetlistError> {
        let cell = component.cell.ok_or(NetlistError::NoCell(component.idx))?;
        Ok(self
            .find_pins(&cell)?
            .into_iter()
            .map(|p| p.transformed(&component.trans))
            .collect())
    }
}

fn apply_devrec_label(init: &mut ComponentInit, label: &str) {
    if let Some(library) = label.strip_prefix(LIBRARY_PREFIX) {
        init.library = Some(library.trim().to_string());
    } else if let Some(component) = label.strip_prefix(COMPONENT_PREFIX) {
        init.component = component.trim().to_string();
    } else if let Some(params) = label.strip_prefix(SPICE_PREFIX) {
        init.params = Some(params.trim().to_string());
    }
}

// ── Net identification ────────────────────────────────────────────────

/// Outcome of [`identify_nets`].
#[derive(Debug, Clone, Default)]
pub struct NetReport {
    /// Nets created, in id order.
    pub created: Vec<NetId>,
    /// Groups of coincident pins that could not form a valid net.
    pub rejected: Vec<Vec<PinRef>>,
    /// Optical nets whose two pins do not face each other.
    pub misaligned: Vec<NetId>,
}

/// Reject pin counts a net of the given type cannot have: optical nets join
/// exactly two pins, other nets at least two.
pub fn check_net_arity(net_type: NetType, pins: usize) -> Result<(), NetlistError> {
    match net_type {
        NetType::Optical if pins != 2 => Err(NetlistError::OpticalNetArity(pins)),
        _ if pins < 2 => Err(NetlistError::UnderfilledNet { net_type, pins }),
        _ => Ok(()),
    }
}

/// Rebuild all nets: pins of the same type whose centers lie within
/// `tolerance` database units of each other are connected.
///
/// Optical pins pair up only across two different components; larger or
/// same-component optical groups are rejected. Optical I/O pins are never
/// netted.
pub fn identify_nets(netlist: &mut Netlist, tolerance: Coord) -> NetReport {
    netlist.clear_nets();

    let candidates: Vec<(PinRef, PinType, wavenet_core::Point)> = netlist
        .pins()
        .filter(|(_, p)| p.pin_type() != PinType::OpticalIo)
        .map(|(r, p)| (r, p.pin_type(), p.center()))
        .collect();
    let index = SpatialIndex::build(
        candidates
            .iter()
            .enumerate()
            .map(|(i, c)| SpatialEntry::at_point(i, c.2))
            .collect(),
    );

    let mut report = NetReport::default();
    let mut visited = vec![false; candidates.len()];
    for start in 0..candidates.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let pin_type = candidates[start].1;

        let mut group = vec![start];
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for hit in index.query_near(&candidates[i].2, tolerance) {
                let j = hit.index;
                if !visited[j] && candidates[j].1 == pin_type {
                    visited[j] = true;
                    group.push(j);
                    stack.push(j);
                }
            }
        }
        if group.len() < 2 {
            continue;
        }
        group.sort_unstable();
        let refs: Vec<PinRef> = group.iter().map(|&i| candidates[i].0).collect();
        let net_type = NetType::from(pin_type);

        if let Err(e) = check_net_arity(net_type, refs.len()) {
            log::warn!("Rejected pin group at {}: {e}", candidates[start].2);
            report.rejected.push(refs);
            continue;
        }
        if net_type == NetType::Optical && refs[0].component == refs[1].component {
            log::warn!(
                "Rejected optical pins of component {} connected to themselves",
                refs[0].component
            );
            report.rejected.push(refs);
            continue;
        }

        let aligned = net_type != NetType::Optical
            || matches!(
                (netlist.pin(refs[0]), netlist.pin(refs[1])),
                (Some(a), Some(b)) if a.faces(b)
            );
        let id = netlist.add_net(net_type, refs);
        if !aligned {
            log::warn!("Optical net {id} joins pins that do not face each other");
            report.misaligned.push(id);
        }
        report.created.push(id);
    }

    log::info!(
        "Identified {} nets ({} rejected groups)",
        report.created.len(),
        report.rejected.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavenet_core::{Cell, CellInstance, DPoint, Path, Point, Rect, Technology};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A straight waveguide cell from x=0 to x=10um with pins at both ends.
    fn waveguide_cell(tech: &Technology) -> Cell {
        let pinrec = tech.layer("PinRec").unwrap();
        let devrec = tech.layer("DevRec").unwrap();
        let wg = tech.layer("Waveguide").unwrap();
        let mut cell = Cell::new("ebeam_wg");
        cell.add_shape(wg, GeomPrimitive::Rect(Rect::new(0, -250, 10_000, 250)));
        cell.add_shape(devrec, GeomPrimitive::Rect(Rect::new(0, -1000, 10_000, 1000)));
        cell.add_shape(devrec, GeomPrimitive::Text(Text::new(&format!("{LIBRARY_PREFIX}Design kits/EBeam"), Point::new(0, 0))));
        cell.add_shape(devrec, GeomPrimitive::Text(Text::new(&format!("{SPICE_PREFIX}wg_length=10u wg_width=0.5u"), Point::new(0, 0))));
        cell.add_shape(pinrec, GeomPrimitive::Path(Path::new(vec![Point::new(10, 0), Point::new(-10, 0)], 500)));
        cell.add_shape(pinrec, GeomPrimitive::Text(Text::new("opt1", Point::new(0, 0))));
        cell.add_shape(
            pinrec,
            GeomPrimitive::Path(Path::new(vec![Point::new(9_990, 0), Point::new(10_010, 0)], 500)),
        );
        cell.add_shape(pinrec, GeomPrimitive::Text(Text::new("opt2", Point::new(10_000, 0))));
        cell
    }

    fn chain_layout(count: usize) -> (LayoutDatabase, CellId) {
        let tech = Technology::default();
        let wg = waveguide_cell(&tech);
        let wg_id = wg.id;
        let mut layout = LayoutDatabase::new("chip", tech);
        let mut top = Cell::new("top");
        for i in 0..count {
            top.add_instance(CellInstance::new(
                wg_id,
                &format!("wg{i}"),
                Transform::translate(i as f64 * 10_000.0, 0.0),
            ));
        }
        let top_id = layout.add_cell(top);
        layout.add_cell(wg);
        (layout, top_id)
    }

    #[test]
    fn test_find_pins_names_and_types() {
        init_logger();
        let (layout, top) = chain_layout(1);
        let wg_id = layout.get_cell(&top).unwrap().instances[0].cell_id;
        let extractor = LayoutExtractor::new(&layout).unwrap();
        let pins = extractor.find_pins(&wg_id).unwrap();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].pin_name.as_deref(), Some("opt1"));
        assert!((pins[0].rotation() - 180.0).abs() < 1e-9);
        assert_eq!(pins[1].pin_name.as_deref(), Some("opt2"));
        assert_eq!(pins[1].center(), Point::new(10_000, 0));
    }

    #[test]
    fn test_find_pins_skips_invalid_paths() {
        let tech = Technology::default();
        let pinrec = tech.layer("PinRec").unwrap();
        let mut cell = Cell::new("broken");
        cell.add_shape(
            pinrec,
            GeomPrimitive::Path(Path::new(vec![Point::new(0, 0), Point::new(5, 0), Point::new(9, 0)], 500)),
        );
        cell.add_shape(pinrec, GeomPrimitive::Rect(Rect::new(0, 0, 100, 100)));
        let mut layout = LayoutDatabase::new("chip", tech);
        let id = layout.add_cell(cell);
        let pins = LayoutExtractor::new(&layout).unwrap().find_pins(&id).unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].pin_type(), PinType::Electrical);
    }

    #[test]
    fn test_find_components_reads_devrec_metadata() {
        let (layout, top) = chain_layout(2);
        let netlist = LayoutExtractor::new(&layout).unwrap().find_components(&top).unwrap();
        assert_eq!(netlist.component_count(), 2);

        let second = &netlist.components()[1];
        assert_eq!(second.component, "ebeam_wg");
        assert_eq!(second.library.as_deref(), Some("Design kits/EBeam"));
        assert_eq!(second.params_dict().unwrap()["wg_length"].as_f64(), Some(10.0));
        assert_eq!(second.center(), Point::new(15_000, 0));
        assert_eq!(second.pins()[0].center(), Point::new(10_000, 0));
        assert_eq!(second.pins()[0].component(), Some(second.idx));
    }

    #[test]
    fn test_pin_finder_matches_extracted_pins() {
        let (layout, top) = chain_layout(2);
        let extractor = LayoutExtractor::new(&layout).unwrap();
        let netlist = extractor.find_components(&top).unwrap();
        let second = &netlist.components()[1];
        let found = second.find_pins(&extractor).unwrap();
        let centers: Vec<Point> = found.iter().map(|p| p.center()).collect();
        let expected: Vec<Point> = second.pins().iter().map(|p| p.center()).collect();
        assert_eq!(centers, expected);
    }

    #[test]
    fn test_identify_nets_chain() {
        init_logger();
        let (layout, top) = chain_layout(3);
        let mut netlist = LayoutExtractor::new(&layout).unwrap().find_components(&top).unwrap();
        let report = identify_nets(&mut netlist, 1);
        assert_eq!(report.created.len(), 2);
        assert!(report.rejected.is_empty());
        assert!(report.misaligned.is_empty());
        for net in netlist.nets() {
            assert_eq!(net.net_type, NetType::Optical);
            assert_eq!(net.pins.len(), 2);
        }
        assert_eq!(
            netlist.to_text(),
            "ebeam_wg_0 NC_0_0 N$0\nebeam_wg_1 N$0 N$1\nebeam_wg_2 N$1 NC_2_1\n"
        );
    }

    #[test]
    fn test_identify_nets_rejects_three_optical_pins() {
        let tech = Technology::default();
        let wg = waveguide_cell(&tech);
        let wg_id = wg.id;
        let mut layout = LayoutDatabase::new("chip", tech);
        let mut top = Cell::new("top");
        top.add_instance(CellInstance::new(wg_id, "a", Transform::identity()));
        top.add_instance(CellInstance::new(wg_id, "b", Transform::translate(10_000.0, 0.0)));
        // a third waveguide whose left pin lands on the same spot
        top.add_instance(CellInstance::new(
            wg_id,
            "c",
            Transform::new(DPoint::new(10_000.0, 0.0), 90.0, false, 1.0),
        ));
        let top_id = layout.add_cell(top);
        layout.add_cell(wg);

        let mut netlist = LayoutExtractor::new(&layout).unwrap().find_components(&top_id).unwrap();
        let report = identify_nets(&mut netlist, 1);
        assert!(report.created.is_empty());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].len(), 3);
        assert!(netlist.pins().all(|(_, p)| !p.is_connected()));
    }

    #[test]
    fn test_identify_nets_flags_misaligned_pair() {
        let tech = Technology::default();
        let wg = waveguide_cell(&tech);
        let wg_id = wg.id;
        let mut layout = LayoutDatabase::new("chip", tech);
        let mut top = Cell::new("top");
        top.add_instance(CellInstance::new(wg_id, "a", Transform::identity()));
        top.add_instance(CellInstance::new(
            wg_id,
            "b",
            Transform::new(DPoint::new(10_000.0, 0.0), 90.0, false, 1.0),
        ));
        let top_id = layout.add_cell(top);
        layout.add_cell(wg);

        let mut netlist = LayoutExtractor::new(&layout).unwrap().find_components(&top_id).unwrap();
        let report = identify_nets(&mut netlist, 1);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.misaligned, report.created);
    }

    #[test]
    fn test_electrical_nets_join_many_pins() {
        let mut netlist = Netlist::new();
        for _ in 0..3 {
            netlist.add_component(Component::new(
                ComponentInit {
                    component: "heater".to_string(),
                    pins: vec![Pin::electrical(Rect::new(-5, -5, 5, 5), Some("elec1")).unwrap()],
                    ..Default::default()
                },
                0.001,
            ));
        }
        let report = identify_nets(&mut netlist, 0);
        assert_eq!(report.created.len(), 1);
        assert_eq!(netlist.nets()[0].pins.len(), 3);
        assert_eq!(netlist.nets()[0].net_type, NetType::Electrical);
    }

    #[test]
    fn test_check_net_arity() {
        assert!(check_net_arity(NetType::Optical, 2).is_ok());
        assert!(check_net_arity(NetType::Optical, 3).is_err());
        assert!(check_net_arity(NetType::Optical, 1).is_err());
        assert!(check_net_arity(NetType::Electrical, 5).is_ok());
        assert!(check_net_arity(NetType::Electrical, 2).is_ok());
        assert!(matches!(
            check_net_arity(NetType::Electrical, 1),
            Err(NetlistError::UnderfilledNet { pins: 1, .. })
        ));
        assert!(check_net_arity(NetType::Electrical, 0).is_err());
    }

    #[test]
    fn test_missing_layers() {
        let layout = LayoutDatabase::new("chip", Technology::new("bare", 0.001));
        assert!(matches!(
            LayoutExtractor::new(&layout),
            Err(NetlistError::MissingLayer("PinRec"))
        ));
    }
}
