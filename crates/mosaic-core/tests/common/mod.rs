#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mosaic_core::{
    PluginVersion, PropertyAccess, PropertyMap, PropertySchema, PropertySpec, PropertyValue,
    RenderContext, RenderData, RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior,
    WidgetMetadata, WidgetRegistry,
};

/// Text that makes [`Label`] fail its render.
pub const BOOM: &str = "boom";

/// Test kind: renders its `text` property and counts calls.
pub struct Label {
    renders: Arc<AtomicUsize>,
}

impl Label {
    /// Label with a private counter.
    pub fn new() -> Self {
        Self {
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl WidgetBehavior for Label {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(40, 12)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let text = properties.text("text")?;
        if text == BOOM {
            return Err(RenderFailure::new("label exploded"));
        }
        Ok(RenderData::text(text).with("color", properties.color("color")?))
    }
}

pub fn label_schema() -> PropertySchema {
    PropertySchema::new()
        .with(PropertySpec::string("text", "hi").max_len(16))
        .with(PropertySpec::color("color", Rgb::WHITE))
        .with(PropertySpec::integer("size", 2, Some(1), Some(4)))
}

/// Registry with one label-like kind per `(name, update_interval)`. All
/// kinds share the returned render counter.
pub fn registry_with(kinds: &[(&str, u32)]) -> (WidgetRegistry, Arc<AtomicUsize>) {
    let renders = Arc::new(AtomicUsize::new(0));
    let mut registry = WidgetRegistry::new();
    for (name, interval) in kinds {
        let counter = renders.clone();
        registry
            .register(
                WidgetMetadata::new(name, PluginVersion::new(1, 0, 0)).update_interval(*interval),
                label_schema(),
                Arc::new(move || {
                    Box::new(Label {
                        renders: counter.clone(),
                    }) as Box<dyn WidgetBehavior>
                }),
            )
            .unwrap();
    }
    (registry, renders)
}

pub fn label_registry() -> (WidgetRegistry, Arc<AtomicUsize>) {
    registry_with(&[("Label", 60)])
}

pub fn props(pairs: &[(&str, PropertyValue)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(name, value)| ((*name).into(), value.clone()))
        .collect()
}

pub fn text(value: &str) -> PropertyMap {
    props(&[("text", value.into())])
}

pub fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn renders(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
