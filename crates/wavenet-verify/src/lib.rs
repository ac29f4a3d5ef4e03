//! # Wavenet Verify
//!
//! Connectivity verification for extracted photonic netlists: unconnected
//! pins, malformed or misaligned optical nets, components without compact
//! models, and overlapping component outlines.

pub mod check;
pub mod violation;

pub use check::verify;
pub use violation::{Severity, Violation, ViolationType};
