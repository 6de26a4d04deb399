use std::sync::Arc;

use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

use crate::providers::{WeatherProvider, WEATHER};

pub const KIND: &str = "Weather";

pub fn metadata() -> WidgetMetadata {
    super::metadata(KIND, "Shows the current outdoor temperature.", "Weather", 1800)
        .depends_on(WEATHER)
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(PropertySpec::select("temperature_unit", "C", &["C", "F"]).label("Unit"))
        .with(PropertySpec::boolean("show_icon", true).label("Show Icon"))
        .with(PropertySpec::integer("font_size", 3, Some(1), Some(8)).label("Font Size"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
        .with(
            PropertySpec::string("location", "")
                .max_len(64)
                .label("Location")
                .help("Display name of the location; empty hides it"),
        )
}

fn to_unit(celsius: f64, unit: &str) -> f64 {
    if unit == "F" {
        celsius * 9.0 / 5.0 + 32.0
    } else {
        celsius
    }
}

/// Whole degrees; readings that round to zero never show as `-0`.
fn whole_degrees(value: f64) -> f64 {
    let rounded = value.round();
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub struct Weather {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl Weather {
    pub fn new(provider: Option<Arc<dyn WeatherProvider>>) -> Self {
        Self { provider }
    }
}

impl WidgetBehavior for Weather {
    fn default_size(&self, screen: ScreenSize, properties: &PropertyMap) -> Size {
        let font = properties
            .integer("font_size")
            .ok()
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(3);
        screen.scaled(6 * font * 2, 12)
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let unit = properties.text("temperature_unit")?;
        let reading = self.provider.as_ref().and_then(|provider| provider.current());
        let mut data = match &reading {
            Some(reading) => RenderData::text(format!(
                "{:.0}°{unit}",
                whole_degrees(to_unit(reading.value.temperature_c, unit))
            ))
            .with("stale", reading.stale),
            None => RenderData::text(format!("--°{unit}")),
        };
        data.set("color", properties.color("color")?);
        data.set("font_size", properties.integer("font_size")?);
        if properties.boolean("show_icon")? {
            if let Some(code) = reading.as_ref().and_then(|reading| reading.value.weather_code) {
                data.set("weather_code", code);
            }
        }
        let location = properties.text("location")?;
        if !location.is_empty() {
            data.set("location", location);
        }
        Ok(data)
    }
}
