//! Pins: typed connection points on a component.
//!
//! An optical pin is a 2-point path whose direction gives the way light leaves
//! the component, an electrical pin is a box, and an optical I/O pin (fibre
//! target) is a polygon.

use serde::{Deserialize, Serialize};

use wavenet_core::cell::normalize_degrees;
use wavenet_core::{BBox, DPoint, Path, Point, Polygon, Rect, Transform};

use crate::component::ComponentId;
use crate::error::NetlistError;
use crate::net::NetId;

/// Angle slack, in degrees, for [`Pin::faces`].
const ANGLE_TOLERANCE: f64 = 1e-6;

/// Kind of signal a pin carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinType {
    Optical,
    Electrical,
    OpticalIo,
}

impl std::fmt::Display for PinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PinType::Optical => "optical",
            PinType::Electrical => "electrical",
            PinType::OpticalIo => "optical IO",
        };
        f.write_str(s)
    }
}

/// Pin geometry. Exactly one shape per pin, matching its [`PinType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PinShape {
    Path(Path),
    Box(Rect),
    Polygon(Polygon),
}

impl PinShape {
    fn kind(&self) -> &'static str {
        match self {
            PinShape::Path(_) => "path",
            PinShape::Box(_) => "box",
            PinShape::Polygon(_) => "polygon",
        }
    }

    pub fn bbox(&self) -> Option<BBox> {
        match self {
            PinShape::Path(p) => p.bbox(),
            PinShape::Box(b) => Some(b.bbox()),
            PinShape::Polygon(p) => p.bbox(),
        }
    }

    fn transformed(&self, trans: &Transform) -> Self {
        match self {
            PinShape::Path(p) => PinShape::Path(p.transformed(trans)),
            PinShape::Box(b) => PinShape::Box(b.transformed(trans)),
            PinShape::Polygon(p) => PinShape::Polygon(p.transformed(trans)),
        }
    }
}

/// A located, typed connection point on a component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pin_type: PinType,
    shape: PinShape,
    /// Label read from the PinRec text next to the pin.
    pub pin_name: Option<String>,
    net: NetId,
    component: Option<ComponentId>,
    /// Center in floating database units; transforms act on this so that
    /// grid snapping never accumulates.
    exact_center: DPoint,
    center: Point,
    rotation: f64,
}

impl Pin {
    /// Build a pin, deriving its center and rotation from the shape.
    ///
    /// Fails when the shape does not match the type, or when an optical path
    /// does not have exactly two points.
    pub fn new(pin_type: PinType, shape: PinShape, pin_name: Option<&str>) -> Result<Self, NetlistError> {
        let matches = matches!(
            (pin_type, &shape),
            (PinType::Optical, PinShape::Path(_))
                | (PinType::Electrical, PinShape::Box(_))
                | (PinType::OpticalIo, PinShape::Polygon(_))
        );
        if !matches {
            return Err(NetlistError::ShapeMismatch {
                pin_type,
                shape: shape.kind(),
            });
        }

        let (exact_center, rotation) = derive_location(&shape).map_err(|found| {
            log::warn!(
                "Detected invalid pin {:?}: path has {} points",
                pin_name,
                found
            );
            NetlistError::InvalidPinPath {
                name: pin_name.map(str::to_string),
                found,
            }
        })?;

        Ok(Self {
            pin_type,
            shape,
            pin_name: pin_name.map(str::to_string),
            net: NetId::DISCONNECTED,
            component: None,
            exact_center,
            center: exact_center.round(),
            rotation,
        })
    }

    pub fn optical(path: Path, pin_name: Option<&str>) -> Result<Self, NetlistError> {
        Self::new(PinType::Optical, PinShape::Path(path), pin_name)
    }

    pub fn electrical(rect: Rect, pin_name: Option<&str>) -> Result<Self, NetlistError> {
        Self::new(PinType::Electrical, PinShape::Box(rect), pin_name)
    }

    pub fn optical_io(polygon: Polygon, pin_name: Option<&str>) -> Result<Self, NetlistError> {
        Self::new(PinType::OpticalIo, PinShape::Polygon(polygon), pin_name)
    }

    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    pub fn shape(&self) -> &PinShape {
        &self.shape
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.shape {
            PinShape::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Direction in degrees (atan2 convention) for optical pins, 0 otherwise.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Whether two optical pins point in opposite directions, as a valid
    /// waveguide junction requires.
    pub fn faces(&self, other: &Pin) -> bool {
        let diff = normalize_degrees(self.rotation - other.rotation);
        (diff - 180.0).abs() <= ANGLE_TOLERANCE
    }

    pub fn net(&self) -> NetId {
        self.net
    }

    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    pub fn is_connected(&self) -> bool {
        !self.net.is_disconnected()
    }

    /// Link the pin to a net. Pass [`NetId::DISCONNECTED`] to unlink.
    pub fn connect(&mut self, net: NetId) {
        self.net = net;
    }

    pub(crate) fn set_component(&mut self, component: ComponentId) {
        self.component = Some(component);
    }

    /// Move the pin's geometry and carry its center and rotation along.
    ///
    /// Center and rotation follow the transformation itself rather than the
    /// grid-snapped shape, so applying two transformations in turn matches
    /// applying their cascade once.
    pub fn transform(&mut self, trans: &Transform) -> &mut Self {
        self.shape = self.shape.transformed(trans);
        self.exact_center = trans.apply_d(&self.exact_center);
        self.center = self.exact_center.round();
        if self.pin_type == PinType::Optical {
            let mut rotation = if trans.mirror_x { -self.rotation } else { self.rotation };
            rotation += trans.rotation;
            if trans.scale < 0.0 {
                rotation += 180.0;
            }
            self.rotation = direction_degrees(rotation);
        }
        self
    }

    /// Consuming form of [`Pin::transform`].
    pub fn transformed(mut self, trans: &Transform) -> Self {
        self.transform(trans);
        self
    }

    /// Human-readable one-line summary.
    pub fn display(&self) -> String {
        let text = self.to_string();
        log::debug!("{text}");
        text
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let component = self
            .component
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "- pin_name {}: component_idx {}, pin_type {}, rotation: {}, net: {}, ({})",
            self.pin_name.as_deref().unwrap_or("?"),
            component,
            self.pin_type,
            self.rotation,
            self.net,
            self.center
        )?;
        if let Some(path) = self.path() {
            let pts: Vec<String> = path.points.iter().map(|p| p.to_string()).collect();
            write!(f, ", path: ({}) w={}", pts.join(";"), path.width)?;
        }
        Ok(())
    }
}

/// Center (floating database units) and rotation of a pin shape. An optical
/// path with a point count other than 2 yields the offending count as the
/// error.
fn derive_location(shape: &PinShape) -> Result<(DPoint, f64), usize> {
    let mid = |a: Point, b: Point| {
        DPoint::new((a.x + b.x) as f64 * 0.5, (a.y + b.y) as f64 * 0.5)
    };
    match shape {
        PinShape::Path(path) => match path.points.as_slice() {
            [p0, p1] => Ok((mid(*p0, *p1), (*p1 - *p0).angle_degrees())),
            pts => Err(pts.len()),
        },
        PinShape::Box(rect) => Ok((mid(rect.lower_left, rect.upper_right), 0.0)),
        PinShape::Polygon(poly) => Ok((
            poly.bbox().map(|bb| mid(bb.min, bb.max)).unwrap_or_default(),
            0.0,
        )),
    }
}

/// Map an angle onto the atan2 range (-180, 180].
fn direction_degrees(degrees: f64) -> f64 {
    let d = normalize_degrees(degrees);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Print a block of pins, one per line.
pub fn display_pins(pins: &[Pin]) -> String {
    let mut text = String::from("Pins:");
    for pin in pins {
        text.push('\n');
        text.push_str(&pin.to_string());
    }
    log::debug!("{text}");
    text
}
