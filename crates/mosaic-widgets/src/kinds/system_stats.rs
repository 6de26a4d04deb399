use std::sync::Arc;

use mosaic_core::render::RenderValue;
use mosaic_core::{
    PropertyAccess, PropertyMap, PropertySchema, PropertySpec, RenderContext, RenderData,
    RenderFailure, Rgb, ScreenSize, Size, WidgetBehavior, WidgetMetadata,
};

use crate::providers::{SystemMetrics, SystemMetricsProvider, SYSTEM_METRICS};

pub const KIND: &str = "SystemStats";

const METRICS: [&str; 3] = ["CPU", "Memory", "Disk"];

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "CPU, memory and disk usage as bar graphs.",
        "System",
        5,
    )
    .depends_on(SYSTEM_METRICS)
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(
            PropertySpec::multiselect("metrics", &METRICS, &METRICS)
                .min_one()
                .label("Metrics"),
        )
        .with(PropertySpec::color("color", Rgb::new(144, 238, 144)).label("Text Color"))
}

fn level(metrics: &SystemMetrics, name: &str) -> Option<f64> {
    match name {
        "CPU" => Some(metrics.cpu),
        "Memory" => Some(metrics.memory),
        "Disk" => Some(metrics.disk),
        _ => None,
    }
}

pub struct SystemStats {
    provider: Option<Arc<dyn SystemMetricsProvider>>,
}

impl SystemStats {
    pub fn new(provider: Option<Arc<dyn SystemMetricsProvider>>) -> Self {
        Self { provider }
    }
}

impl WidgetBehavior for SystemStats {
    fn default_size(&self, screen: ScreenSize, properties: &PropertyMap) -> Size {
        let bars = properties.list("metrics").map_or(3, <[String]>::len);
        let bars = u32::try_from(bars).unwrap_or(3);
        screen.scaled(60, (bars * 10).max(30))
    }

    fn render(
        &self,
        properties: &PropertyMap,
        _ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let selected = properties.list("metrics")?;
        let reading = self.provider.as_ref().and_then(|provider| provider.current());
        let mut labels = Vec::with_capacity(selected.len());
        let mut values = Vec::with_capacity(selected.len());
        let mut fills = Vec::with_capacity(selected.len());
        for name in selected {
            let percent = reading
                .as_ref()
                .and_then(|reading| level(&reading.value, name))
                .map(|value| value.clamp(0.0, 100.0));
            labels.push(RenderValue::from(name.as_str()));
            values.push(RenderValue::from(
                percent.map_or_else(|| "--%".to_string(), |value| format!("{value:.0}%")),
            ));
            fills.push(RenderValue::from(percent.unwrap_or(0.0) / 100.0));
        }
        let mut data = RenderData::new("bars")
            .with("labels", labels)
            .with("values", values)
            .with("fills", fills)
            .with("color", properties.color("color")?);
        if let Some(reading) = &reading {
            data.set("stale", reading.stale);
        }
        Ok(data)
    }
}
