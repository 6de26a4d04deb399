//! Layout documents: the persisted JSON form of a layout.
//!
//! Loading is tolerant. A widget whose kind is not registered, or whose
//! record does not parse, is dropped with a warning; a property that fails
//! its schema falls back to the default with a warning. A missing
//! `screen_size` means 64 px. Only an unsupported `screen_size` or text
//! that is not a JSON document is rejected outright.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::warn;

use crate::error::MosaicError;
use crate::layout::Layout;
use crate::registry::WidgetRegistry;
use crate::schema::Violation;
use crate::value::{PropertyMap, Rgb};
use crate::widget::{Rect, ScreenSize, Widget};

/// Top-level document as read from disk. Widgets stay raw JSON so each
/// one can fail on its own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub screen_size: Option<u32>,
    #[serde(default)]
    pub background_color: Option<serde_json::Value>,
    #[serde(default)]
    pub widgets: Vec<serde_json::Value>,
}

/// One persisted widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    #[serde(default)]
    pub update_interval: Option<u32>,
    #[serde(default)]
    pub properties: IndexMap<String, serde_json::Value>,
}

fn visible_by_default() -> bool {
    true
}

/// Soft failure recorded while loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    UnknownKind { index: usize, kind: SmolStr },
    MalformedWidget { index: usize, reason: SmolStr },
    UnknownProperty { index: usize, kind: SmolStr, property: SmolStr },
    DefaultedProperty { index: usize, kind: SmolStr, violation: Violation },
    BackgroundColor { reason: SmolStr },
    MissingScreenSize,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind { index, kind } => {
                write!(f, "widget {index}: unknown kind '{kind}', dropped")
            }
            Self::MalformedWidget { index, reason } => {
                write!(f, "widget {index}: {reason}, dropped")
            }
            Self::UnknownProperty {
                index,
                kind,
                property,
            } => write!(f, "widget {index} ({kind}): unknown property '{property}' ignored"),
            Self::DefaultedProperty {
                index,
                kind,
                violation,
            } => write!(f, "widget {index} ({kind}): {violation}; default used"),
            Self::BackgroundColor { reason } => {
                write!(f, "background_color: {reason}; default used")
            }
            Self::MissingScreenSize => {
                write!(f, "screen_size missing; {} used", ScreenSize::default().pixels())
            }
        }
    }
}

/// A loaded layout plus whatever was dropped or defaulted on the way.
#[derive(Debug)]
pub struct LoadedLayout {
    pub layout: Layout,
    pub warnings: Vec<LoadWarning>,
    /// False when the document had no usable `background_color`; the
    /// layout then holds black until a default is applied.
    pub background_specified: bool,
}

impl WidgetRecord {
    /// Persisted form of a widget, with its full property map.
    #[must_use]
    pub fn from_widget(widget: &Widget) -> Self {
        let (x, y) = widget.position();
        let size = widget.size();
        Self {
            kind: widget.kind().to_string(),
            x,
            y,
            width: Some(size.width),
            height: Some(size.height),
            z_index: widget.z_index(),
            visible: widget.is_visible(),
            update_interval: Some(widget.update_interval()),
            properties: widget
                .properties()
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect(),
        }
    }

    /// Rebuild a widget through the registry.
    ///
    /// Missing properties take schema defaults. Invalid or unknown ones are
    /// reported through `warnings` (tagged with `index`) and do not fail.
    pub fn into_widget(
        self,
        registry: &WidgetRegistry,
        screen: ScreenSize,
        index: usize,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<Widget, MosaicError> {
        let mut widget = registry.create_for(&self.kind, PropertyMap::new(), screen)?;
        let kind = SmolStr::new(widget.kind());
        let schema = widget.schema();
        let mut properties = schema.defaults();
        for (name, raw) in &self.properties {
            let Some(spec) = schema.get(name) else {
                warnings.push(LoadWarning::UnknownProperty {
                    index,
                    kind: kind.clone(),
                    property: SmolStr::new(name),
                });
                continue;
            };
            match spec.decode(raw) {
                Ok(value) => {
                    properties.insert(spec.name.clone(), value);
                }
                Err(violation) => warnings.push(LoadWarning::DefaultedProperty {
                    index,
                    kind: kind.clone(),
                    violation,
                }),
            }
        }
        widget.replace_properties(properties);
        let hint = widget.default_size(screen);
        let bounds = Rect::new(
            self.x,
            self.y,
            self.width.unwrap_or(hint.width),
            self.height.unwrap_or(hint.height),
        );
        widget.set_geometry(bounds, self.z_index, self.visible);
        if let Some(interval) = self.update_interval {
            widget.set_update_interval(interval);
        }
        Ok(widget)
    }
}

/// Persisted form of a layout, as written by [`save`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedLayout {
    pub screen_size: u32,
    pub background_color: Rgb,
    pub widgets: Vec<WidgetRecord>,
}

#[must_use]
pub fn save(layout: &Layout) -> SavedLayout {
    SavedLayout {
        screen_size: layout.screen_size().pixels(),
        background_color: layout.background_color(),
        widgets: layout
            .iter()
            .map(|(_, widget)| WidgetRecord::from_widget(widget))
            .collect(),
    }
}

/// Rebuild a layout, dropping what cannot be loaded.
pub fn load(
    document: LayoutDocument,
    registry: &WidgetRegistry,
) -> Result<LoadedLayout, MosaicError> {
    let mut warnings = Vec::new();
    let screen = match document.screen_size {
        Some(pixels) => ScreenSize::from_pixels(pixels)
            .map_err(|err| MosaicError::InvalidDocument(err.to_string().into()))?,
        None => {
            warnings.push(LoadWarning::MissingScreenSize);
            ScreenSize::default()
        }
    };
    let mut layout = Layout::new(screen);
    let mut background_specified = false;
    if let Some(raw) = document.background_color.as_ref() {
        match Rgb::from_json(raw) {
            Ok(color) => {
                layout.set_background_color(color);
                background_specified = true;
            }
            Err(reason) => warnings.push(LoadWarning::BackgroundColor { reason }),
        }
    }
    for (index, raw) in document.widgets.into_iter().enumerate() {
        let record: WidgetRecord = match serde_json::from_value(raw) {
            Ok(record) => record,
            Err(err) => {
                warnings.push(LoadWarning::MalformedWidget {
                    index,
                    reason: SmolStr::new(err.to_string()),
                });
                continue;
            }
        };
        match record.into_widget(registry, screen, index, &mut warnings) {
            Ok(widget) => {
                layout.push(widget);
            }
            Err(MosaicError::UnknownKind(kind)) => {
                warnings.push(LoadWarning::UnknownKind { index, kind });
            }
            Err(err) => warnings.push(LoadWarning::MalformedWidget {
                index,
                reason: SmolStr::new(err.to_string()),
            }),
        }
    }
    for warning in &warnings {
        warn!("layout load: {warning}");
    }
    Ok(LoadedLayout {
        layout,
        warnings,
        background_specified,
    })
}

/// Pretty-printed JSON text of a layout.
pub fn to_json_string(layout: &Layout) -> Result<String, MosaicError> {
    serde_json::to_string_pretty(&save(layout))
        .map_err(|err| MosaicError::InvalidDocument(err.to_string().into()))
}

pub fn from_json_str(text: &str, registry: &WidgetRegistry) -> Result<LoadedLayout, MosaicError> {
    let document: LayoutDocument = serde_json::from_str(text)
        .map_err(|err| MosaicError::InvalidDocument(err.to_string().into()))?;
    load(document, registry)
}

pub fn save_to_path(layout: &Layout, path: impl AsRef<Path>) -> Result<(), MosaicError> {
    let path = path.as_ref();
    let text = to_json_string(layout)?;
    std::fs::write(path, text)
        .map_err(|err| MosaicError::Io(format!("{}: {err}", path.display()).into()))
}

pub fn load_from_path(
    path: impl AsRef<Path>,
    registry: &WidgetRegistry,
) -> Result<LoadedLayout, MosaicError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|err| MosaicError::Io(format!("{}: {err}", path.display()).into()))?;
    from_json_str(&text, registry)
}
