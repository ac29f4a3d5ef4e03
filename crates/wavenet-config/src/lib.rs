//! # Wavenet Config
//!
//! Form state behind the waveguide and Monte Carlo configuration dialogs.
//! Rendering is left to the embedding application, which drives a dialog
//! through a [`ModalHost`].

pub mod dialog;
pub mod error;
pub mod monte_carlo;
pub mod waveguide;

pub use dialog::{DialogOutcome, ModalHost};
pub use error::ConfigError;
pub use monte_carlo::{
    CorrelatedVariation, Histograms, MonteCarloDialog, MonteCarloForm, MonteCarloParams,
    MonteCarloTechnology, Spread, WaferToWaferVariation, WaferVariation,
};
pub use waveguide::{
    CompoundWaveguide, WaveguideDialog, WaveguideForm, WaveguideLayer, WaveguideLibrary,
    WaveguideParams, WaveguideType,
};
