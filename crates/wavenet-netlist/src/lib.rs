//! # Wavenet Netlist
//!
//! Connectivity model for photonic layouts. A [`Netlist`] owns components,
//! each component owns its pins, and nets link pins by [`PinRef`]. Pins not
//! on any net refer to the shared [`NET_DISCONNECTED`] sentinel.
//!
//! [`LayoutExtractor`] builds a netlist from a
//! [`wavenet_core::LayoutDatabase`] and [`identify_nets`] connects pins that
//! coincide.

pub mod component;
pub mod error;
pub mod extract;
pub mod model;
pub mod net;
pub mod netlist;
pub mod params;
pub mod pin;

pub use component::{Component, ComponentId, ComponentInit, PIN_EXTENSION_UM};
pub use error::NetlistError;
pub use extract::{check_net_arity, identify_nets, LayoutExtractor, NetReport, PinFinder};
pub use model::{model_key, CompactModelRegistry, ModelRegistry};
pub use net::{Net, NetId, NetType, PinRef, NET_DISCONNECTED};
pub use netlist::Netlist;
pub use params::{parse_params, ParamValue, Params};
pub use pin::{display_pins, Pin, PinShape, PinType};
