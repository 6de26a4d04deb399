//! Stopwatch kind and its start/stop/reset controls.
//!
//! The running state lives entirely in properties, so a saved layout
//! resumes a running stopwatch where it left off.

use chrono::NaiveDateTime;
use mosaic_core::{
    MosaicError, PropertyAccess, PropertyMap, PropertySchema, PropertySpec, PropertyValue,
    RenderContext, RenderData, RenderFailure, Rgb, ScreenSize, Size, Widget, WidgetBehavior,
    WidgetMetadata,
};
use tracing::warn;

pub const KIND: &str = "Stopwatch";

/// Layout of `started_at`.
pub const STARTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STOPPED: &str = "stopped";
const RUNNING: &str = "running";

pub fn metadata() -> WidgetMetadata {
    super::metadata(
        KIND,
        "A stopwatch with start, stop and reset.",
        "Utility",
        1,
    )
}

pub fn schema() -> PropertySchema {
    PropertySchema::new()
        .with(PropertySpec::select("state", STOPPED, &[STOPPED, RUNNING]).label("State"))
        .with(
            PropertySpec::float("elapsed_seconds", 0.0, Some(0.0), None)
                .label("Elapsed")
                .help("Seconds accumulated before the current run"),
        )
        .with(
            PropertySpec::string("started_at", "")
                .label("Started At")
                .help("Start of the current run; empty when stopped"),
        )
        .with(PropertySpec::string("label", "Stopwatch").max_len(32).label("Label"))
        .with(PropertySpec::color("color", Rgb::WHITE).label("Text Color"))
}

fn parse_started(raw: &str) -> Result<Option<NaiveDateTime>, RenderFailure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, STARTED_AT_FORMAT)
        .map(Some)
        .map_err(|err| RenderFailure::new(format!("started_at '{raw}': {err}")))
}

/// Total seconds on the stopwatch at `now`.
#[allow(clippy::cast_precision_loss)]
fn total_seconds(properties: &PropertyMap, now: NaiveDateTime) -> Result<f64, RenderFailure> {
    let banked = properties.float("elapsed_seconds")?.max(0.0);
    if properties.text("state")? != RUNNING {
        return Ok(banked);
    }
    let running = match parse_started(properties.text("started_at")?)? {
        Some(started) => (now - started).num_milliseconds().max(0),
        None => 0,
    };
    Ok(banked + running as f64 / 1000.0)
}

pub struct Stopwatch;

impl WidgetBehavior for Stopwatch {
    fn default_size(&self, screen: ScreenSize, _properties: &PropertyMap) -> Size {
        screen.scaled(48, 20)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn render(
        &self,
        properties: &PropertyMap,
        ctx: &RenderContext,
    ) -> Result<RenderData, RenderFailure> {
        let clock = super::hms(total_seconds(properties, ctx.now)?.floor() as i64);
        let label = properties.text("label")?;
        let text = if label.is_empty() {
            clock
        } else {
            format!("{label}\n{clock}")
        };
        Ok(RenderData::text(text)
            .with("color", properties.color("color")?)
            .with("running", properties.text("state")? == RUNNING))
    }
}

/// Start (or keep running) a stopwatch widget.
pub fn start(widget: &mut Widget, now: NaiveDateTime) -> Result<(), MosaicError> {
    if widget.property("state").and_then(|value| value.as_str()) == Some(RUNNING) {
        return Ok(());
    }
    widget.set_property("started_at", now.format(STARTED_AT_FORMAT).to_string())?;
    widget.set_property("state", RUNNING)
}

/// Stop a running stopwatch, banking the time of the current run. A run
/// with an unreadable start time is dropped.
pub fn stop(widget: &mut Widget, now: NaiveDateTime) -> Result<(), MosaicError> {
    let total = total_seconds(widget.properties(), now).unwrap_or_else(|err| {
        warn!(kind = widget.kind(), "{err}; discarding current run");
        widget
            .property("elapsed_seconds")
            .and_then(PropertyValue::as_f64)
            .unwrap_or(0.0)
    });
    widget.set_property("elapsed_seconds", total)?;
    widget.set_property("started_at", "")?;
    widget.set_property("state", STOPPED)
}

/// Stop and zero a stopwatch.
pub fn reset(widget: &mut Widget) -> Result<(), MosaicError> {
    widget.set_property("elapsed_seconds", 0.0)?;
    widget.set_property("started_at", "")?;
    widget.set_property("state", STOPPED)
}
