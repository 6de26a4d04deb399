//! Declarative property schemas and validation.
//!
//! A [`PropertySchema`] lists the configurable fields of one widget kind in
//! display order. Validation never stops at the first problem: every check
//! appends to a list of [`Violation`]s so an editor can show them all at once.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::value::{PropertyMap, PropertyValue, Rgb};

/// Declared type and bounds of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String { max_len: Option<usize> },
    Integer { min: Option<i64>, max: Option<i64> },
    Float { min: Option<f64>, max: Option<f64> },
    Boolean,
    Color,
    Select { options: Vec<SmolStr> },
    MultiSelect { options: Vec<SmolStr>, min_one: bool },
}

impl PropertyType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::Select { .. } => "select",
            Self::MultiSelect { .. } => "multiselect",
        }
    }

    /// Allowed options for select and multiselect types.
    #[must_use]
    pub fn options(&self) -> &[SmolStr] {
        match self {
            Self::Select { options } | Self::MultiSelect { options, .. } => options,
            _ => &[],
        }
    }
}

/// What went wrong with one property value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViolationKind {
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value {value} outside [{}, {}]", bound(.min), bound(.max))]
    OutOfRange {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error("value is not finite")]
    NotFinite,
    #[error("length {len} exceeds maximum {max}")]
    TooLong { len: usize, max: usize },
    #[error("invalid color: {0}")]
    InvalidColor(SmolStr),
    #[error("invalid option '{value}' (allowed: {})", .allowed.join(", "))]
    InvalidOption {
        value: SmolStr,
        allowed: Vec<SmolStr>,
    },
    #[error("at least one option must be selected")]
    EmptySelection,
    #[error("unknown property")]
    UnknownProperty,
    #[error("malformed schema: {0}")]
    MalformedSchema(SmolStr),
}

fn bound(value: &Option<f64>) -> String {
    value.map_or_else(|| "..".to_string(), |value| value.to_string())
}

/// A single validation failure, tied to the property it concerns.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{property}: {kind}")]
pub struct Violation {
    pub property: SmolStr,
    pub kind: ViolationKind,
}

impl Violation {
    #[must_use]
    pub fn new(property: impl Into<SmolStr>, kind: ViolationKind) -> Self {
        Self {
            property: property.into(),
            kind,
        }
    }
}

/// One configurable field: type, default, and editor hints.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub name: SmolStr,
    pub ty: PropertyType,
    pub default: PropertyValue,
    pub label: SmolStr,
    pub help: SmolStr,
}

impl PropertySpec {
    fn new(name: &str, ty: PropertyType, default: PropertyValue) -> Self {
        Self {
            name: SmolStr::new(name),
            ty,
            default,
            label: SmolStr::new(name),
            help: SmolStr::default(),
        }
    }

    #[must_use]
    pub fn string(name: &str, default: &str) -> Self {
        Self::new(
            name,
            PropertyType::String { max_len: None },
            PropertyValue::from(default),
        )
    }

    #[must_use]
    pub fn integer(name: &str, default: i64, min: Option<i64>, max: Option<i64>) -> Self {
        Self::new(
            name,
            PropertyType::Integer { min, max },
            PropertyValue::Integer(default),
        )
    }

    #[must_use]
    pub fn float(name: &str, default: f64, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(
            name,
            PropertyType::Float { min, max },
            PropertyValue::Float(default),
        )
    }

    #[must_use]
    pub fn boolean(name: &str, default: bool) -> Self {
        Self::new(name, PropertyType::Boolean, PropertyValue::Bool(default))
    }

    #[must_use]
    pub fn color(name: &str, default: Rgb) -> Self {
        Self::new(name, PropertyType::Color, PropertyValue::Color(default))
    }

    #[must_use]
    pub fn select(name: &str, default: &str, options: &[&str]) -> Self {
        Self::new(
            name,
            PropertyType::Select {
                options: options.iter().copied().map(SmolStr::new).collect(),
            },
            PropertyValue::from(default),
        )
    }

    #[must_use]
    pub fn multiselect(name: &str, default: &[&str], options: &[&str]) -> Self {
        Self::new(
            name,
            PropertyType::MultiSelect {
                options: options.iter().copied().map(SmolStr::new).collect(),
                min_one: false,
            },
            PropertyValue::from(default),
        )
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = SmolStr::new(label);
        self
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = SmolStr::new(help);
        self
    }

    /// Cap string length (in characters). No effect on other types.
    #[must_use]
    pub fn max_len(mut self, max: usize) -> Self {
        if let PropertyType::String { max_len } = &mut self.ty {
            *max_len = Some(max);
        }
        self
    }

    /// Require at least one selected option. No effect on other types.
    #[must_use]
    pub fn min_one(mut self) -> Self {
        if let PropertyType::MultiSelect { min_one, .. } = &mut self.ty {
            *min_one = true;
        }
        self
    }

    /// Check a typed value against this spec, appending every violation.
    pub fn check_into(&self, value: &PropertyValue, out: &mut Vec<Violation>) {
        let mut push = |kind| out.push(Violation::new(self.name.clone(), kind));
        let wrong_type = || ViolationKind::WrongType {
            expected: self.ty.name(),
            found: value.type_name(),
        };
        match (&self.ty, value) {
            (PropertyType::String { max_len }, PropertyValue::Text(text)) => {
                let len = text.chars().count();
                if let Some(max) = *max_len {
                    if len > max {
                        push(ViolationKind::TooLong { len, max });
                    }
                }
            }
            (PropertyType::Integer { min, max }, PropertyValue::Integer(raw)) => {
                let below = min.is_some_and(|min| *raw < min);
                let above = max.is_some_and(|max| *raw > max);
                if below || above {
                    push(ViolationKind::OutOfRange {
                        value: lossy(*raw),
                        min: min.map(lossy),
                        max: max.map(lossy),
                    });
                }
            }
            (PropertyType::Float { min, max }, PropertyValue::Float(raw)) => {
                if !raw.is_finite() {
                    push(ViolationKind::NotFinite);
                } else if min.is_some_and(|min| *raw < min) || max.is_some_and(|max| *raw > max) {
                    push(ViolationKind::OutOfRange {
                        value: *raw,
                        min: *min,
                        max: *max,
                    });
                }
            }
            (PropertyType::Boolean, PropertyValue::Bool(_))
            | (PropertyType::Color, PropertyValue::Color(_)) => {}
            (PropertyType::Select { options }, PropertyValue::Text(text)) => {
                if !options.iter().any(|option| option == text) {
                    push(ViolationKind::InvalidOption {
                        value: SmolStr::new(text),
                        allowed: options.clone(),
                    });
                }
            }
            (PropertyType::MultiSelect { options, min_one }, PropertyValue::List(items)) => {
                for item in items {
                    if !options.iter().any(|option| option == item) {
                        push(ViolationKind::InvalidOption {
                            value: SmolStr::new(item),
                            allowed: options.clone(),
                        });
                    }
                }
                if *min_one && items.is_empty() {
                    push(ViolationKind::EmptySelection);
                }
            }
            _ => push(wrong_type()),
        }
    }

    /// Violations for a typed value; empty when it is acceptable.
    #[must_use]
    pub fn check(&self, value: &PropertyValue) -> Vec<Violation> {
        let mut out = Vec::new();
        self.check_into(value, &mut out);
        out
    }

    /// Convert a JSON value from a layout document into a checked typed value.
    ///
    /// Float properties accept integer numbers. Any other type mismatch is a
    /// [`ViolationKind::WrongType`]; the first constraint failure is returned.
    pub fn decode(&self, json: &serde_json::Value) -> Result<PropertyValue, Violation> {
        let violation = |kind| Violation::new(self.name.clone(), kind);
        let wrong_type = || {
            violation(ViolationKind::WrongType {
                expected: self.ty.name(),
                found: json_type_name(json),
            })
        };
        let value = match &self.ty {
            PropertyType::String { .. } | PropertyType::Select { .. } => json
                .as_str()
                .map(PropertyValue::from)
                .ok_or_else(wrong_type)?,
            PropertyType::Integer { .. } => {
                json.as_i64().map(PropertyValue::Integer).ok_or_else(wrong_type)?
            }
            PropertyType::Float { .. } => {
                json.as_f64().map(PropertyValue::Float).ok_or_else(wrong_type)?
            }
            PropertyType::Boolean => json.as_bool().map(PropertyValue::Bool).ok_or_else(wrong_type)?,
            PropertyType::Color => Rgb::from_json(json)
                .map(PropertyValue::Color)
                .map_err(|reason| violation(ViolationKind::InvalidColor(reason)))?,
            PropertyType::MultiSelect { .. } => {
                let items = json.as_array().ok_or_else(wrong_type)?;
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(item.as_str().ok_or_else(wrong_type)?.to_string());
                }
                PropertyValue::List(list)
            }
        };
        match self.check(&value).into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(value),
        }
    }

    fn check_declaration(&self, out: &mut Vec<Violation>) {
        let malformed = |reason: &str| {
            Violation::new(
                self.name.clone(),
                ViolationKind::MalformedSchema(SmolStr::new(reason)),
            )
        };
        match &self.ty {
            PropertyType::Integer {
                min: Some(min),
                max: Some(max),
            } if min > max => out.push(malformed("min greater than max")),
            PropertyType::Float {
                min: Some(min),
                max: Some(max),
            } if min > max => out.push(malformed("min greater than max")),
            PropertyType::Float { min, max }
                if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) =>
            {
                out.push(malformed("NaN bound"));
            }
            PropertyType::Select { options } | PropertyType::MultiSelect { options, .. }
                if options.is_empty() =>
            {
                out.push(malformed("no options declared"));
            }
            _ => {}
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn lossy(value: i64) -> f64 {
    value as f64
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(number) if number.is_f64() => "float",
        serde_json::Value::Number(_) => "integer",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}

/// Ordered mapping from property name to its spec.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySchema {
    specs: IndexMap<SmolStr, PropertySpec>,
}

impl PropertySchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`PropertySchema::insert`].
    #[must_use]
    pub fn with(mut self, spec: PropertySpec) -> Self {
        self.insert(spec);
        self
    }

    /// Add or replace a spec; replacing keeps the original position.
    pub fn insert(&mut self, spec: PropertySpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertySpec> {
        self.specs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every default value, in schema order.
    #[must_use]
    pub fn defaults(&self) -> PropertyMap {
        self.specs
            .iter()
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect()
    }

    /// Check declarations and defaults; used when a kind is registered.
    #[must_use]
    pub fn validate_defaults(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for spec in self.specs.values() {
            spec.check_declaration(&mut out);
            spec.check_into(&spec.default, &mut out);
        }
        out
    }

    /// Check a whole property map. Unknown keys are violations; missing keys
    /// are not, since they fall back to defaults.
    #[must_use]
    pub fn validate(&self, properties: &PropertyMap) -> Vec<Violation> {
        let mut out = Vec::new();
        for (name, value) in properties {
            match self.specs.get(name) {
                Some(spec) => spec.check_into(value, &mut out),
                None => out.push(Violation::new(name.clone(), ViolationKind::UnknownProperty)),
            }
        }
        out
    }

    /// First violation for a single named value.
    pub fn check(&self, name: &str, value: &PropertyValue) -> Result<(), Violation> {
        let Some(spec) = self.specs.get(name) else {
            return Err(Violation::new(name, ViolationKind::UnknownProperty));
        };
        match spec.check(value).into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_schema() -> PropertySchema {
        PropertySchema::new()
            .with(PropertySpec::string("text", "Hello").max_len(8))
            .with(PropertySpec::integer("font_size", 12, Some(8), Some(32)))
            .with(PropertySpec::float("progress", 0.5, Some(0.0), Some(1.0)))
            .with(PropertySpec::select("unit", "C", &["C", "F"]))
            .with(PropertySpec::multiselect("metrics", &["CPU"], &["CPU", "Memory"]).min_one())
    }

    #[test]
    fn defaults_pass_their_own_constraints() {
        assert!(text_schema().validate_defaults().is_empty());
    }

    #[test]
    fn default_outside_bounds_is_reported() {
        let schema =
            PropertySchema::new().with(PropertySpec::integer("font_size", 40, Some(8), Some(32)));
        let violations = schema.validate_defaults();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].property, "font_size");
    }

    #[test]
    fn inverted_bounds_are_malformed() {
        let schema =
            PropertySchema::new().with(PropertySpec::float("ratio", 0.5, Some(1.0), Some(0.0)));
        assert!(schema
            .validate_defaults()
            .iter()
            .any(|violation| matches!(violation.kind, ViolationKind::MalformedSchema(_))));
    }

    #[test]
    fn validation_collects_every_violation() {
        let schema = text_schema();
        let mut props = schema.defaults();
        props.insert("text".into(), "far too long".into());
        props.insert("font_size".into(), 999.into());
        props.insert("unit".into(), "K".into());
        props.insert("bogus".into(), true.into());
        let violations = schema.validate(&props);
        let names: Vec<&str> = violations.iter().map(|v| v.property.as_str()).collect();
        assert_eq!(names, vec!["text", "font_size", "unit", "bogus"]);
    }

    #[test]
    fn select_violation_names_value_and_allowed_set() {
        let err = text_schema().check("unit", &"K".into()).unwrap_err();
        assert_eq!(
            err.kind,
            ViolationKind::InvalidOption {
                value: "K".into(),
                allowed: vec!["C".into(), "F".into()],
            }
        );
        assert_eq!(err.to_string(), "unit: invalid option 'K' (allowed: C, F)");
    }

    #[test]
    fn floats_reject_nan_and_infinity() {
        let schema = text_schema();
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = schema.check("progress", &PropertyValue::Float(value)).unwrap_err();
            assert_eq!(err.kind, ViolationKind::NotFinite);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let schema = text_schema();
        assert!(schema.check("font_size", &8.into()).is_ok());
        assert!(schema.check("font_size", &32.into()).is_ok());
        assert!(schema.check("progress", &1.0.into()).is_ok());
        assert!(schema.check("progress", &1.01.into()).is_err());
    }

    #[test]
    fn multiselect_checks_members_and_min_one() {
        let schema = text_schema();
        let empty = PropertyValue::List(Vec::new());
        assert_eq!(
            schema.check("metrics", &empty).unwrap_err().kind,
            ViolationKind::EmptySelection
        );
        let spec = schema.get("metrics").unwrap();
        let mixed = PropertyValue::from(&["CPU", "GPU", "Fan"][..]);
        assert_eq!(spec.check(&mixed).len(), 2);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = text_schema().check("font_size", &"big".into()).unwrap_err();
        assert_eq!(
            err.kind,
            ViolationKind::WrongType {
                expected: "integer",
                found: "string",
            }
        );
    }

    #[test]
    fn decode_accepts_integer_numbers_for_floats() {
        let schema = text_schema();
        let spec = schema.get("progress").unwrap();
        assert_eq!(
            spec.decode(&serde_json::json!(1)).unwrap(),
            PropertyValue::Float(1.0)
        );
        assert!(spec.decode(&serde_json::json!("1")).is_err());
    }

    #[test]
    fn decode_rejects_bad_colors() {
        let spec = PropertySpec::color("color", Rgb::WHITE);
        assert_eq!(
            spec.decode(&serde_json::json!([1, 2, 3])).unwrap(),
            PropertyValue::Color(Rgb::new(1, 2, 3))
        );
        let err = spec.decode(&serde_json::json!([300, 0, 0])).unwrap_err();
        assert!(matches!(err.kind, ViolationKind::InvalidColor(_)));
    }
}
