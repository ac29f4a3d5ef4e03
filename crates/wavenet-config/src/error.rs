use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No waveguides found for technology '{0}'")]
    NoWaveguides(String),

    #[error("Waveguide '{0}' not found")]
    UnknownWaveguide(String),

    #[error("Compound waveguide '{0}' does not define a singlemode waveguide")]
    MissingSinglemode(String),

    #[error("No Monte Carlo data available")]
    NoMonteCarloData,

    #[error("No Monte Carlo data for technology '{0}'")]
    UnknownTechnology(String),

    #[error("Field '{field}' is not a number: '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a numeric form field.
pub(crate) fn parse_field(field: &'static str, text: &str) -> Result<f64, ConfigError> {
    text.trim().parse().map_err(|_| ConfigError::InvalidField {
        field,
        value: text.to_string(),
    })
}
