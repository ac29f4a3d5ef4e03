use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of connectivity violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationType {
    /// An optical or electrical pin that is not on any net.
    DisconnectedPin,
    /// An optical net that does not join exactly two pins.
    OpticalNetArity,
    /// A net of any other type that joins fewer than two pins.
    UnderfilledNet,
    /// Two connected optical pins that do not point at each other.
    MisalignedPins,
    /// A component with no compact model for circuit simulation.
    MissingCompactModel,
    /// Two component outlines that share area.
    ComponentOverlap,
}

/// Severity level of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl ViolationType {
    pub fn severity(self) -> Severity {
        match self {
            ViolationType::OpticalNetArity
            | ViolationType::UnderfilledNet
            | ViolationType::ComponentOverlap => Severity::Error,
            ViolationType::DisconnectedPin | ViolationType::MisalignedPins => Severity::Warning,
            ViolationType::MissingCompactModel => Severity::Info,
        }
    }
}

/// A single violation with location and description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub message: String,
    /// Bounding box of the violation region in micrometres: [min_x, min_y, max_x, max_y]
    pub bbox: [f64; 4],
    /// Indices of the components involved.
    pub component_indices: Vec<usize>,
}

impl Violation {
    pub fn new(
        violation_type: ViolationType,
        message: String,
        bbox: [f64; 4],
        component_indices: Vec<usize>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            violation_type,
            severity: violation_type.severity(),
            message,
            bbox,
            component_indices,
        }
    }
}
