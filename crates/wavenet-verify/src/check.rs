//! Connectivity checks over an extracted netlist.

use geo::algorithm::{area::Area, bool_ops::BooleanOps};

use wavenet_core::region::to_geo_polygon;
use wavenet_core::{BBox, LayoutDatabase, Point, SpatialEntry, SpatialIndex};
use wavenet_netlist::{
    check_net_arity, ModelRegistry, Net, NetType, NetlistError, Netlist, Pin, PinType,
};

use crate::violation::{Violation, ViolationType};

/// Run every check and return the violations, errors first.
///
/// Nets are taken as they are; run [`wavenet_netlist::identify_nets`]
/// beforehand to connect coincident pins.
pub fn verify<R: ModelRegistry + ?Sized>(
    netlist: &Netlist,
    layout: &LayoutDatabase,
    registry: &R,
) -> Vec<Violation> {
    let dbu = layout.dbu();
    let mut violations = Vec::new();
    check_disconnected_pins(netlist, dbu, &mut violations);
    check_nets(netlist, dbu, &mut violations);
    check_compact_models(netlist, &layout.technology.name, registry, dbu, &mut violations);
    check_overlaps(netlist, dbu, &mut violations);
    violations.sort_by_key(|v| v.severity);

    log::info!(
        "Verification found {} violations in {} components",
        violations.len(),
        netlist.component_count()
    );
    violations
}

fn pin_bbox(pin: &Pin) -> BBox {
    pin.shape()
        .bbox()
        .unwrap_or_else(|| BBox::new(pin.center(), pin.center()))
}

fn pin_label(pin: &Pin) -> &str {
    pin.pin_name.as_deref().unwrap_or("?")
}

fn check_disconnected_pins(netlist: &Netlist, dbu: f64, out: &mut Vec<Violation>) {
    for component in netlist.components() {
        for pin in component.pins() {
            // fibre targets connect off-chip
            if pin.is_connected() || pin.pin_type() == PinType::OpticalIo {
                continue;
            }
            out.push(Violation::new(
                ViolationType::DisconnectedPin,
                format!(
                    "{} pin '{}' of {}_{} is not connected",
                    pin.pin_type(),
                    pin_label(pin),
                    component.component,
                    component.idx
                ),
                pin_bbox(pin).to_micron_array(dbu),
                vec![component.idx.0],
            ));
        }
    }
}

fn net_bbox(netlist: &Netlist, net: &Net) -> Option<BBox> {
    net.pins
        .iter()
        .filter_map(|r| netlist.pin(*r))
        .map(pin_bbox)
        .reduce(|a, b| a.union(&b))
}

fn check_nets(netlist: &Netlist, dbu: f64, out: &mut Vec<Violation>) {
    for net in netlist.nets() {
        let mut components: Vec<usize> = net.pins.iter().map(|r| r.component.0).collect();
        components.sort_unstable();
        components.dedup();
        let bbox = net_bbox(netlist, net)
            .map(|b| b.to_micron_array(dbu))
            .unwrap_or_default();

        if let Err(e) = check_net_arity(net.net_type, net.pins.len()) {
            let kind = match e {
                NetlistError::UnderfilledNet { .. } => ViolationType::UnderfilledNet,
                _ => ViolationType::OpticalNetArity,
            };
            out.push(Violation::new(
                kind,
                format!("Net {}: {e}", net.idx),
                bbox,
                components,
            ));
            continue;
        }

        if net.net_type == NetType::Optical {
            if let (Some(a), Some(b)) = (netlist.pin(net.pins[0]), netlist.pin(net.pins[1])) {
                if !a.faces(b) {
                    out.push(Violation::new(
                        ViolationType::MisalignedPins,
                        format!(
                            "Net {} joins pins '{}' ({:.1} deg) and '{}' ({:.1} deg) that do not face each other",
                            net.idx,
                            pin_label(a),
                            a.rotation(),
                            pin_label(b),
                            b.rotation()
                        ),
                        bbox,
                        components,
                    ));
                }
            }
        }
    }
}

fn check_compact_models<R: ModelRegistry + ?Sized>(
    netlist: &Netlist,
    technology: &str,
    registry: &R,
    dbu: f64,
    out: &mut Vec<Violation>,
) {
    for component in netlist.components() {
        if component.has_model(technology, registry) {
            continue;
        }
        let bbox = component
            .polygon()
            .bbox()
            .unwrap_or_else(|| BBox::new(component.center(), component.center()));
        out.push(Violation::new(
            ViolationType::MissingCompactModel,
            format!(
                "{}_{} has no compact model{}",
                component.component,
                component.idx,
                component
                    .library
                    .as_deref()
                    .map(|l| format!(" in library '{l}'"))
                    .unwrap_or_default()
            ),
            bbox.to_micron_array(dbu),
            vec![component.idx.0],
        ));
    }
}

fn check_overlaps(netlist: &Netlist, dbu: f64, out: &mut Vec<Violation>) {
    let components = netlist.components();
    let bboxes: Vec<Option<BBox>> = components.iter().map(|c| c.polygon().bbox()).collect();
    let index = SpatialIndex::build(
        bboxes
            .iter()
            .enumerate()
            .filter_map(|(index, bbox)| bbox.map(|bbox| SpatialEntry { index, bbox }))
            .collect(),
    );

    // geo polygons are built lazily, only for pairs the boxes cannot settle
    let mut geo_polys: Vec<Option<geo::Polygon<f64>>> = vec![None; components.len()];

    for (i, bbox) in bboxes.iter().enumerate() {
        let Some(bbox) = bbox else { continue };
        for candidate in index.query_bbox(bbox) {
            let j = candidate.index;
            if j <= i {
                continue;
            }
            let other = candidate.bbox;
            let overlap = BBox::new(
                Point::new(bbox.min.x.max(other.min.x), bbox.min.y.max(other.min.y)),
                Point::new(bbox.max.x.min(other.max.x), bbox.max.y.min(other.max.y)),
            );
            // the R-tree reports abutting boxes as intersecting
            if overlap.width() <= 0 || overlap.height() <= 0 {
                continue;
            }

            for k in [i, j] {
                if geo_polys[k].is_none() {
                    geo_polys[k] = Some(to_geo_polygon(components[k].polygon()));
                }
            }
            // geo treats abutting polygons as intersecting; only shared area counts
            let area = match (&geo_polys[i], &geo_polys[j]) {
                (Some(pi), Some(pj)) => pi.intersection(pj).unsigned_area(),
                _ => 0.0,
            };
            if area <= 0.0 {
                continue;
            }

            let (a, b) = (&components[i], &components[j]);
            log::debug!("Components {} and {} overlap by {area} dbu^2", a.idx, b.idx);
            out.push(Violation::new(
                ViolationType::ComponentOverlap,
                format!(
                    "{}_{} and {}_{} overlap by {:.4} um^2",
                    a.component,
                    a.idx,
                    b.component,
                    b.idx,
                    area * dbu * dbu
                ),
                overlap.to_micron_array(dbu),
                vec![i, j],
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wavenet_core::{Path, Polygon, Rect, Technology};
    use wavenet_netlist::{identify_nets, Component, ComponentInit, PinRef};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A 10um straight waveguide placed at `x`, pins facing outwards.
    fn straight(x: i64) -> Component {
        Component::new(
            ComponentInit {
                component: "ebeam_wg".to_string(),
                library: Some("Design kits/EBeam".to_string()),
                pins: vec![
                    Pin::optical(Path::new(vec![Point::new(x + 10, 0), Point::new(x - 10, 0)], 500), Some("opt1")).unwrap(),
                    Pin::optical(
                        Path::new(vec![Point::new(x + 9_990, 0), Point::new(x + 10_010, 0)], 500),
                        Some("opt2"),
                    )
                    .unwrap(),
                ],
                polygon: Rect::new(x, -1000, x + 10_000, 1000).to_polygon(),
                ..Default::default()
            },
            0.001,
        )
    }

    fn registry() -> HashSet<String> {
        HashSet::from(["design kits::ebeam::ebeam_wg".to_string()])
    }

    fn layout() -> LayoutDatabase {
        LayoutDatabase::new("chip", Technology::default())
    }

    fn of_type(violations: &[Violation], t: ViolationType) -> Vec<&Violation> {
        violations.iter().filter(|v| v.violation_type == t).collect()
    }

    #[test]
    fn test_clean_chain_has_only_end_pins_open() {
        init_logger();
        let mut netlist = Netlist::new();
        netlist.add_component(straight(0));
        netlist.add_component(straight(10_000));
        identify_nets(&mut netlist, 1);

        let violations = verify(&netlist, &layout(), &registry());
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .all(|v| v.violation_type == ViolationType::DisconnectedPin));
        assert_eq!(violations[0].component_indices, vec![0]);
        assert_eq!(violations[1].component_indices, vec![1]);
    }

    #[test]
    fn test_abutting_components_do_not_overlap() {
        let mut netlist = Netlist::new();
        netlist.add_component(straight(0));
        netlist.add_component(straight(10_000));
        let violations = verify(&netlist, &layout(), &registry());
        assert!(of_type(&violations, ViolationType::ComponentOverlap).is_empty());
    }

    #[test]
    fn test_overlapping_components() {
        let mut netlist = Netlist::new();
        netlist.add_component(straight(0));
        netlist.add_component(straight(5_000));
        let violations = verify(&netlist, &layout(), &registry());

        let overlaps = of_type(&violations, ViolationType::ComponentOverlap);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].component_indices, vec![0, 1]);
        let bbox = overlaps[0].bbox;
        assert!((bbox[0] - 5.0).abs() < 1e-9);
        assert!((bbox[2] - 10.0).abs() < 1e-9);
        // errors sort first
        assert_eq!(violations[0].violation_type, ViolationType::ComponentOverlap);
    }

    #[test]
    fn test_bbox_overlap_without_area_overlap() {
        // two L-shaped outlines whose boxes cross but whose areas only touch
        let l_shape = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 50),
            Point::new(50, 50),
            Point::new(50, 100),
            Point::new(0, 100),
        ]);
        let square = Rect::new(50, 50, 150, 150).to_polygon();
        let mut netlist = Netlist::new();
        for polygon in [l_shape, square] {
            netlist.add_component(Component::new(
                ComponentInit {
                    component: "ebeam_wg".to_string(),
                    library: Some("Design kits/EBeam".to_string()),
                    polygon,
                    ..Default::default()
                },
                0.001,
            ));
        }
        let violations = verify(&netlist, &layout(), &registry());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_compact_model() {
        let mut netlist = Netlist::new();
        netlist.add_component(straight(0));
        let violations = verify(&netlist, &layout(), &HashSet::<String>::new());
        let missing = of_type(&violations, ViolationType::MissingCompactModel);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("Design kits/EBeam"));
        assert_eq!(missing[0].severity, crate::Severity::Info);
    }

    #[test]
    fn test_manual_nets_are_checked() {
        let mut netlist = Netlist::new();
        let a = netlist.add_component(straight(0));
        let b = netlist.add_component(straight(10_000));
        let c = netlist.add_component(straight(20_000));
        // opt1 of a points left, opt1 of b points left too
        netlist.add_net(NetType::Optical, vec![PinRef::new(a, 0), PinRef::new(b, 0)]);
        netlist.add_net(
            NetType::Optical,
            vec![PinRef::new(a, 1), PinRef::new(b, 1), PinRef::new(c, 0)],
        );
        let violations = verify(&netlist, &layout(), &registry());

        let arity = of_type(&violations, ViolationType::OpticalNetArity);
        assert_eq!(arity.len(), 1);
        assert_eq!(arity[0].component_indices, vec![0, 1, 2]);
        assert_eq!(of_type(&violations, ViolationType::MisalignedPins).len(), 1);
        assert_eq!(of_type(&violations, ViolationType::DisconnectedPin).len(), 1);
    }

    #[test]
    fn test_single_pin_electrical_net() {
        let mut netlist = Netlist::new();
        let pad = Component::new(
            ComponentInit {
                component: "ebeam_pad".to_string(),
                pins: vec![Pin::electrical(Rect::new(0, 0, 100, 100), Some("elec1")).unwrap()],
                polygon: Rect::new(0, 0, 100, 100).to_polygon(),
                ..Default::default()
            },
            0.001,
        );
        let a = netlist.add_component(pad);
        netlist.add_net(NetType::Electrical, vec![PinRef::new(a, 0)]);
        let violations = verify(&netlist, &layout(), &HashSet::<String>::new());

        let underfilled = of_type(&violations, ViolationType::UnderfilledNet);
        assert_eq!(underfilled.len(), 1);
        assert_eq!(underfilled[0].severity, crate::Severity::Error);
        assert!(of_type(&violations, ViolationType::OpticalNetArity).is_empty());
    }
}
