//! Cell and intervention-level values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value read out of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value (integers, floats and booleans are widened to `f64`)
    Number(f64),
    /// Categorical value
    Text(String),
    /// Null cell
    Missing,
}

impl Cell {
    /// Convert to a JSON value for record previews
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Missing => serde_json::Value::Null,
        }
    }
}

/// Hashable value of the intervention column that identifies one partition
///
/// Numbers compare by bit pattern after folding `-0.0` into `0.0` and every
/// NaN into one canonical NaN, so equal-looking values land in one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    /// Numeric level (stored as normalized `f64` bits)
    Number(u64),
    /// Categorical level
    Text(String),
    /// Null intervention value
    Missing,
}

impl Level {
    /// Numeric level from an `f64`
    #[must_use]
    pub fn number(value: f64) -> Self {
        let normalized = if value == 0.0 {
            0.0
        } else if value.is_nan() {
            f64::NAN
        } else {
            value
        };
        Self::Number(normalized.to_bits())
    }

    /// Categorical level
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("<missing>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_zero_is_one_level() {
        assert_eq!(Level::number(0.0), Level::number(-0.0));
    }

    #[test]
    fn test_nan_is_one_level() {
        assert_eq!(Level::number(f64::NAN), Level::number(-f64::NAN));
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::number(1.0).to_string(), "1");
        assert_eq!(Level::number(2.5).to_string(), "2.5");
        assert_eq!(Level::text("control").to_string(), "control");
        assert_eq!(Level::Missing.to_string(), "<missing>");
    }

    #[test]
    fn test_cell_to_json() {
        assert_eq!(Cell::Number(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(Cell::Text("a".into()).to_json(), serde_json::json!("a"));
        assert_eq!(Cell::Missing.to_json(), serde_json::Value::Null);
        assert_eq!(Cell::Number(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
