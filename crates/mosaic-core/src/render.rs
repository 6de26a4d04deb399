//! Render data handed to the rasterizer.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

use crate::error::RenderFailure;
use crate::value::{PropertyMap, Rgb};

/// Text drawn in place of a widget whose own computation failed.
pub const ERROR_TEXT: &str = "ERR";
/// Colour of [`ERROR_TEXT`].
pub const ERROR_COLOR: Rgb = Rgb::RED;

/// A single render attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RenderValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Color(Rgb),
    List(Vec<RenderValue>),
}

impl From<bool> for RenderValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RenderValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for RenderValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for RenderValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RenderValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RenderValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Rgb> for RenderValue {
    fn from(value: Rgb) -> Self {
        Self::Color(value)
    }
}

impl From<Vec<RenderValue>> for RenderValue {
    fn from(value: Vec<RenderValue>) -> Self {
        Self::List(value)
    }
}

/// Ordered attribute bag describing one drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderData {
    pub primitive: SmolStr,
    pub attributes: IndexMap<SmolStr, RenderValue>,
}

impl RenderData {
    #[must_use]
    pub fn new(primitive: &str) -> Self {
        Self {
            primitive: SmolStr::new(primitive),
            attributes: IndexMap::new(),
        }
    }

    /// A `text` primitive carrying `text` as its first attribute.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::new("text").with("text", text.into())
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<RenderValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<RenderValue>) {
        self.attributes.insert(SmolStr::new(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RenderValue> {
        self.attributes.get(key)
    }

    /// The `text` attribute, when present.
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match self.get("text") {
            Some(RenderValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn color_value(&self, key: &str) -> Option<Rgb> {
        match self.get(key) {
            Some(RenderValue::Color(color)) => Some(*color),
            _ => None,
        }
    }

    /// Fixed substitute for a failed widget.
    #[must_use]
    pub fn error_sentinel() -> Self {
        Self::text(ERROR_TEXT)
            .with("color", ERROR_COLOR)
            .with("error", true)
    }

    #[must_use]
    pub fn is_error_sentinel(&self) -> bool {
        matches!(self.get("error"), Some(RenderValue::Bool(true)))
    }
}

/// Typed property access for widget behaviours.
///
/// Each accessor turns a missing or mistyped value into a [`RenderFailure`],
/// which the caller replaces with the error sentinel.
pub trait PropertyAccess {
    fn text(&self, name: &str) -> Result<&str, RenderFailure>;
    fn boolean(&self, name: &str) -> Result<bool, RenderFailure>;
    fn integer(&self, name: &str) -> Result<i64, RenderFailure>;
    fn float(&self, name: &str) -> Result<f64, RenderFailure>;
    fn color(&self, name: &str) -> Result<Rgb, RenderFailure>;
    fn list(&self, name: &str) -> Result<&[String], RenderFailure>;
}

fn missing(name: &str, expected: &str) -> RenderFailure {
    RenderFailure::new(format!("property '{name}' is not a {expected}"))
}

impl PropertyAccess for PropertyMap {
    fn text(&self, name: &str) -> Result<&str, RenderFailure> {
        self.get(name)
            .and_then(|value| value.as_str())
            .ok_or_else(|| missing(name, "string"))
    }

    fn boolean(&self, name: &str) -> Result<bool, RenderFailure> {
        self.get(name)
            .and_then(crate::value::PropertyValue::as_bool)
            .ok_or_else(|| missing(name, "boolean"))
    }

    fn integer(&self, name: &str) -> Result<i64, RenderFailure> {
        self.get(name)
            .and_then(crate::value::PropertyValue::as_i64)
            .ok_or_else(|| missing(name, "integer"))
    }

    fn float(&self, name: &str) -> Result<f64, RenderFailure> {
        self.get(name)
            .and_then(crate::value::PropertyValue::as_f64)
            .ok_or_else(|| missing(name, "number"))
    }

    fn color(&self, name: &str) -> Result<Rgb, RenderFailure> {
        self.get(name)
            .and_then(crate::value::PropertyValue::as_color)
            .ok_or_else(|| missing(name, "color"))
    }

    fn list(&self, name: &str) -> Result<&[String], RenderFailure> {
        self.get(name)
            .and_then(|value| value.as_list())
            .ok_or_else(|| missing(name, "list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order() {
        let data = RenderData::text("12:30")
            .with("color", Rgb::WHITE)
            .with("font_size", 4_i64);
        let keys: Vec<&str> = data.attributes.keys().map(SmolStr::as_str).collect();
        assert_eq!(keys, vec!["text", "color", "font_size"]);
    }

    #[test]
    fn sentinel_is_red_error_text() {
        let sentinel = RenderData::error_sentinel();
        assert!(sentinel.is_error_sentinel());
        assert_eq!(sentinel.text_value(), Some(ERROR_TEXT));
        assert_eq!(sentinel.color_value("color"), Some(ERROR_COLOR));
        assert!(!RenderData::text("ok").is_error_sentinel());
    }

    #[test]
    fn render_data_serializes_as_flat_json() {
        let data = RenderData::text("Hi").with("color", Rgb::new(1, 2, 3));
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"primitive":"text","attributes":{"text":"Hi","color":[1,2,3]}}"#
        );
    }

    #[test]
    fn access_reports_mistyped_properties() {
        let mut props = PropertyMap::new();
        props.insert("label".into(), "Go".into());
        assert_eq!(props.text("label").unwrap(), "Go");
        assert!(props.boolean("label").is_err());
        assert!(props.color("missing").is_err());
    }
}
