use thiserror::Error;

use wavenet_core::LayoutError;

use crate::component::ComponentId;
use crate::net::NetType;
use crate::pin::PinType;

#[derive(Error, Debug)]
pub enum NetlistError {
    #[error("Invalid pin{}: an optical pin path needs exactly 2 points, found {found}", fmt_name(.name))]
    InvalidPinPath { name: Option<String>, found: usize },

    #[error("A {pin_type} pin cannot be built from a {shape}")]
    ShapeMismatch { pin_type: PinType, shape: &'static str },

    #[error("Malformed parameter token '{0}' (expected key=value)")]
    MalformedParam(String),

    #[error("Invalid value '{value}' for parameter '{key}'")]
    InvalidParamValue { key: String, value: String },

    #[error("Technology has no '{0}' layer")]
    MissingLayer(&'static str),

    #[error("Component {0} has no layout cell")]
    NoCell(ComponentId),

    #[error("Optical net would join {0} pins; optical nets connect exactly 2")]
    OpticalNetArity(usize),

    #[error("{net_type:?} net joins {pins} pin(s); a net connects at least 2")]
    UnderfilledNet { net_type: NetType, pins: usize },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

fn fmt_name(name: &Option<String>) -> String {
    match name {
        Some(n) => format!(" '{n}'"),
        None => String::new(),
    }
}
