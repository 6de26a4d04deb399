//! Property values and colours.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// 24-bit colour, persisted as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a JSON `[r, g, b]` triple, each channel in `0..=255`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SmolStr> {
        let Some(items) = value.as_array() else {
            return Err("expected [r, g, b]".into());
        };
        if items.len() != 3 {
            return Err(format!("expected 3 channels, got {}", items.len()).into());
        }
        let mut channels = [0u8; 3];
        for (slot, item) in channels.iter_mut().zip(items) {
            let raw = item
                .as_i64()
                .ok_or_else(|| SmolStr::new(format!("channel {item} is not an integer")))?;
            *slot = u8::try_from(raw)
                .map_err(|_| SmolStr::new(format!("channel {raw} outside 0..=255")))?;
        }
        Ok(Self::from(channels))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(value: Rgb) -> Self {
        [value.r, value.g, value.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.r, self.g, self.b)
    }
}

/// A single configured property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Color(Rgb),
    List(Vec<String>),
}

/// Property values keyed by name, in schema order.
pub type PropertyMap = IndexMap<SmolStr, PropertyValue>;

impl PropertyValue {
    /// Short type name used in violation messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Color(_) => "color",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            Self::Color(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// JSON form used in layout documents.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Bool(value) => Value::Bool(*value),
            Self::Integer(value) => Value::from(*value),
            Self::Float(value) => {
                serde_json::Number::from_f64(*value).map_or(Value::Null, Value::Number)
            }
            Self::Text(text) => Value::String(text.clone()),
            Self::Color(color) => Value::from(vec![color.r, color.g, color.b]),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Rgb> for PropertyValue {
    fn from(value: Rgb) -> Self {
        Self::Color(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[&str]> for PropertyValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|item| (*item).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_parses_three_channels() {
        let color = Rgb::from_json(&serde_json::json!([12, 0, 255])).unwrap();
        assert_eq!(color, Rgb::new(12, 0, 255));
    }

    #[test]
    fn rgb_rejects_out_of_range_and_short_triples() {
        assert!(Rgb::from_json(&serde_json::json!([256, 0, 0])).is_err());
        assert!(Rgb::from_json(&serde_json::json!([-1, 0, 0])).is_err());
        assert!(Rgb::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Rgb::from_json(&serde_json::json!("red")).is_err());
    }

    #[test]
    fn float_json_keeps_fraction() {
        assert_eq!(PropertyValue::Float(0.5).to_json(), serde_json::json!(0.5));
        assert_eq!(PropertyValue::Integer(3).as_f64(), Some(3.0));
    }
}
