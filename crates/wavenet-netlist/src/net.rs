use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::netlist::Netlist;
use crate::pin::PinType;

/// Net number. Issued monotonically while nets are identified; the
/// disconnected sentinel is `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetId(pub i64);

impl NetId {
    pub const DISCONNECTED: NetId = NetId(-1);

    pub fn is_disconnected(&self) -> bool {
        *self == Self::DISCONNECTED
    }
}

impl std::fmt::Display for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetType {
    Optical,
    Electrical,
    OpticalIo,
    Disconnected,
}

impl From<PinType> for NetType {
    fn from(pin_type: PinType) -> Self {
        match pin_type {
            PinType::Optical => NetType::Optical,
            PinType::Electrical => NetType::Electrical,
            PinType::OpticalIo => NetType::OpticalIo,
        }
    }
}

/// Non-owning link from a net to a pin: the owning component and the pin's
/// position in that component's pin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub component: ComponentId,
    pub pin: usize,
}

impl PinRef {
    pub fn new(component: ComponentId, pin: usize) -> Self {
        Self { component, pin }
    }
}

/// Connectivity between pins.
///
/// Optical nets join exactly two pins, electrical nets two or more. The net
/// does not enforce this; whoever builds nets does (see
/// [`crate::extract::identify_nets`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub idx: NetId,
    pub net_type: NetType,
    pub pins: Vec<PinRef>,
}

/// The net every unconnected pin refers to.
pub static NET_DISCONNECTED: Net = Net {
    idx: NetId::DISCONNECTED,
    net_type: NetType::Disconnected,
    pins: Vec::new(),
};

impl Net {
    pub fn new(idx: NetId, net_type: NetType, pins: Vec<PinRef>) -> Self {
        Self { idx, net_type, pins }
    }

    pub fn is_disconnected(&self) -> bool {
        self.idx.is_disconnected()
    }

    /// Diagnostic dump: net number and, per pin, its name, center and owner.
    pub fn display(&self, netlist: &Netlist) -> String {
        let pins: Vec<String> = self
            .pins
            .iter()
            .map(|r| match (netlist.pin(*r), netlist.component(r.component)) {
                (Some(pin), Some(component)) => format!(
                    "[{}, {}, {}, {}]",
                    pin.pin_name.as_deref().unwrap_or("?"),
                    pin.center(),
                    component.component,
                    component.instance_name.as_deref().unwrap_or("-")
                ),
                _ => format!("[dangling {}:{}]", r.component, r.pin),
            })
            .collect();
        let text = format!("- net: {}, pins: [{}]", self.idx, pins.join(", "));
        log::debug!("{text}");
        text
    }
}
