//! Declarative widget kinds loaded from `*.toml` descriptor files.
//!
//! A descriptor names the kind, declares its property schema and gives a
//! text template that is filled from the properties at render time:
//!
//! ```toml
//! [plugin]
//! kind = "Greeting"
//! version = "1.0.0"
//! category = "Display"
//!
//! [[property]]
//! name = "who"
//! type = "string"
//! default = "world"
//!
//! [[property]]
//! name = "color"
//! type = "color"
//! default = [255, 200, 0]
//!
//! [render]
//! template = "Hello {who}"
//! color = "color"
//! update_interval = 0
//! ```
//!
//! `{{` and `}}` produce literal braces.

#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mosaic_core::source::{PluginCandidate, PluginLoadError, PluginSource};
use mosaic_core::{
    PluginVersion, PropertyAccess, PropertyMap, PropertySchema, PropertySpec, PropertyType,
    PropertyValue, RenderContext, RenderData, RenderFailure, Rgb, ScreenSize, Size,
    WidgetBehavior, WidgetMetadata,
};
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::debug;

/// Descriptor file extension.
pub const DESCRIPTOR_EXTENSION: &str = "toml";

/// Plugin source over every descriptor file in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryPluginSource {
    dir: PathBuf,
}

impl DirectoryPluginSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Descriptor paths, sorted.
    pub fn paths(&self) -> Result<Vec<PathBuf>, PluginLoadError> {
        let origin = self.dir.display().to_string();
        let pattern = format!(
            "{}/*.{DESCRIPTOR_EXTENSION}",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|err| PluginLoadError::new(origin.as_str(), format!("invalid glob: {err}")))?;
        let mut paths = BTreeSet::new();
        for entry in entries {
            let path = entry.map_err(|err| PluginLoadError::new(origin.as_str(), err))?;
            if path.is_file() {
                paths.insert(path);
            }
        }
        Ok(paths.into_iter().collect())
    }
}

impl PluginSource for DirectoryPluginSource {
    fn describe(&self) -> SmolStr {
        SmolStr::new(self.dir.display().to_string())
    }

    fn candidates(&mut self) -> Vec<Result<PluginCandidate, PluginLoadError>> {
        let paths = match self.paths() {
            Ok(paths) => paths,
            Err(err) => return vec![Err(err)],
        };
        debug!(dir = %self.dir.display(), files = paths.len(), "scanning plugin descriptors");
        paths.iter().map(|path| load_descriptor(path)).collect()
    }
}

/// Read and compile one descriptor file.
pub fn load_descriptor(path: &Path) -> Result<PluginCandidate, PluginLoadError> {
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path)
        .map_err(|err| PluginLoadError::new(origin.as_str(), err))?;
    parse_descriptor(&origin, &text)
}

/// Compile a descriptor from its TOML text.
pub fn parse_descriptor(origin: &str, text: &str) -> Result<PluginCandidate, PluginLoadError> {
    let fail = |reason: String| PluginLoadError::new(origin, reason);
    let raw: DescriptorToml = toml::from_str(text).map_err(|err| fail(err.to_string()))?;

    let kind = raw.plugin.kind.trim();
    if kind.is_empty() {
        return Err(fail("plugin.kind must not be empty".to_string()));
    }
    let version = PluginVersion::parse(&raw.plugin.version).map_err(|err| fail(err.to_string()))?;
    let mut metadata = WidgetMetadata::new(kind, version)
        .description(&raw.plugin.description)
        .author(&raw.plugin.author)
        .update_interval(raw.render.update_interval);
    if let Some(category) = &raw.plugin.category {
        metadata = metadata.category(category);
    }
    for capability in &raw.plugin.depends_on {
        metadata = metadata.depends_on(capability);
    }

    let mut schema = PropertySchema::new();
    for property in raw.properties {
        let name = property.name.clone();
        if schema.get(&name).is_some() {
            return Err(fail(format!("property '{name}' declared twice")));
        }
        let spec = property
            .into_spec()
            .map_err(|reason| fail(format!("property '{name}': {reason}")))?;
        schema.insert(spec);
    }

    let segments = parse_template(&raw.render.template).map_err(fail)?;
    for segment in &segments {
        if let Segment::Property(name) = segment {
            if schema.get(name).is_none() {
                return Err(fail(format!("template references undeclared property '{name}'")));
            }
        }
    }
    if let Some(color) = &raw.render.color {
        match schema.get(color) {
            Some(spec) if spec.ty == PropertyType::Color => {}
            _ => return Err(fail(format!("render.color '{color}' is not a color property"))),
        }
    }

    let behavior = TemplateText {
        segments: Arc::new(segments),
        color: raw.render.color.map(SmolStr::new),
        size: Size::new(raw.render.width, raw.render.height),
    };
    Ok(PluginCandidate {
        origin: SmolStr::new(origin),
        metadata,
        schema,
        factory: Arc::new(move || Box::new(behavior.clone()) as Box<dyn WidgetBehavior>),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorToml {
    plugin: PluginSection,
    #[serde(default, rename = "property")]
    properties: Vec<PropertySection>,
    render: RenderSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginSection {
    kind: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    category: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertySection {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    default: toml::Value,
    label: Option<String>,
    help: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
    max_len: Option<usize>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    min_one: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderSection {
    template: String,
    color: Option<String>,
    #[serde(default = "default_interval")]
    update_interval: u32,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
}

fn default_interval() -> u32 {
    60
}

fn default_width() -> u32 {
    40
}

fn default_height() -> u32 {
    12
}

#[allow(clippy::cast_possible_truncation)]
fn integral(bound: Option<f64>) -> Result<Option<i64>, String> {
    match bound {
        None => Ok(None),
        Some(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => Ok(Some(value as i64)),
        Some(value) => Err(format!("bound {value} is not an integer")),
    }
}

impl PropertySection {
    fn into_spec(self) -> Result<PropertySpec, String> {
        let options: Vec<&str> = self.options.iter().map(String::as_str).collect();
        let spec = match self.ty.as_str() {
            "string" => {
                let spec = PropertySpec::string(&self.name, "");
                match self.max_len {
                    Some(max) => spec.max_len(max),
                    None => spec,
                }
            }
            "integer" => {
                PropertySpec::integer(&self.name, 0, integral(self.min)?, integral(self.max)?)
            }
            "float" => PropertySpec::float(&self.name, 0.0, self.min, self.max),
            "boolean" => PropertySpec::boolean(&self.name, false),
            "color" => PropertySpec::color(&self.name, Rgb::BLACK),
            "select" => PropertySpec::select(&self.name, "", &options),
            "multiselect" => {
                let spec = PropertySpec::multiselect(&self.name, &[], &options);
                if self.min_one {
                    spec.min_one()
                } else {
                    spec
                }
            }
            other => return Err(format!("unknown type '{other}'")),
        };
        let json = serde_json::to_value(&self.default).map_err(|err| err.to_string())?;
        let default = spec
            .decode(&json)
            .map_err(|violation| format!("default {}", violation.kind))?;
        let mut spec = PropertySpec { default, ..spec };
        if let Some(label) = &self.label {
            spec = spec.label(label);
        }
        if let Some(help) = &self.help {
            spec = spec.help(help);
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Property(SmolStr),
}

fn parse_template(template: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => return Err("unclosed '{' in template".to_string()),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err("empty placeholder in template".to_string());
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Property(SmolStr::new(name)));
            }
            '}' => return Err("unmatched '}' in template".to_string()),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn display_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Bool(value) => value.to_string(),
        PropertyValue::Integer(value) => value.to_string(),
        PropertyValue::Float(value) => value.to_string(),
        PropertyValue::Text(value) => value.clone(),
        PropertyValue::Color(value) => value.to_string(),
        PropertyValue::List(items) => items.join(", "),
    }
}

/// Behaviour of a descriptor-defined kind.
#[derive(Debug, Clone)]
struct TemplateText {
    segments: Arc<Vec<Segment>>,
    color: Option<SmolStr>,
    size: Size,
}

impl WidgetBehavior for TemplateText {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(self.size.width, self.size.height)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let mut text = String::new();
        for segment in self.segments.iter() {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Property(name) => {
                    let value = properties
                        .get(name.as_str())
                        .ok_or_else(|| RenderFailure::new(format!("property '{name}' missing")))?;
                    text.push_str(&display_value(value));
                }
            }
        }
        let color = match &self.color {
            Some(name) => properties.color(name)?,
            None => Rgb::WHITE,
        };
        Ok(RenderData::text(text).with("color", color))
    }
}
