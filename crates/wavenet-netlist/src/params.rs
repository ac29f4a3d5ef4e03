//! Parsing of the space-separated `key=value` parameter string that
//! components carry for their compact models.
//!
//! Values without a decimal point or exponent are integers. Values holding a
//! `[` are array literals and pass through untouched. Everything else is a
//! length: the unit suffixes `u` and `n` (either case) are textually replaced
//! by `e-6` and `e-9`, numbers in exponent form are read as metres and scaled to
//! micrometres, and plain decimals are taken as micrometres already.

use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NetlistError;

/// One parsed parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    /// A length in micrometres.
    Float(f64),
    /// An unparsed literal such as `[1,2,3]`.
    Literal(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Literal(_) => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Literal(s) => f.write_str(s),
        }
    }
}

pub type Params = IndexMap<String, ParamValue>;

/// Parse a parameter string into an insertion-ordered map.
///
/// Empty input gives an empty map. Tokens without `=`, numbers that do not
/// parse and integers beyond the `i64` range are errors.
pub fn parse_params(params: &str) -> Result<Params, NetlistError> {
    let mut out = Params::new();
    for token in params.split(' ').filter(|t| !t.is_empty()) {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| NetlistError::MalformedParam(token.to_string()))?;
        out.insert(key.to_string(), parse_value(key, value)?);
    }
    Ok(out)
}

fn parse_value(key: &str, value: &str) -> Result<ParamValue, NetlistError> {
    let invalid = || NetlistError::InvalidParamValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    let lower = value.to_lowercase();
    if !lower.contains('.') && !lower.contains('e') {
        // Suffixed integers ("5u") and bracketed literals fall through.
        if let Ok(i) = value.parse::<i64>() {
            return Ok(ParamValue::Int(i));
        }
        let digits = value.strip_prefix(&['-', '+'][..]).unwrap_or(value);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            // out of i64 range
            return Err(invalid());
        }
    }

    if value.contains('[') {
        return Ok(ParamValue::Literal(value.to_string()));
    }

    let scientific = lower.replace('u', "e-6").replace('n', "e-9");
    if !scientific.contains('e') {
        let microns = Decimal::from_str(&scientific)
            .ok()
            .and_then(|d| d.to_f64())
            .ok_or_else(invalid)?;
        return Ok(ParamValue::Float(microns));
    }

    let metres = Decimal::from_scientific(&scientific).map_err(|_| invalid())?;
    let microns = metres
        .checked_mul(Decimal::from(1_000_000))
        .and_then(|d| d.to_f64())
        .ok_or_else(invalid)?;
    Ok(ParamValue::Float(microns))
}
