//! Subcommand implementations.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDateTime};
use mosaic_core::config::EngineConfig;
use mosaic_core::device::JsonLinesSink;
use mosaic_core::document::{self, LoadedLayout};
use mosaic_core::runner::{shared, FrameRunner};
use mosaic_core::{StdClock, WidgetRegistry};
use mosaic_widgets::{builtin_registry, discover_dirs, Providers};
use tracing::{debug, info, warn};

const AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Built-ins plus every descriptor found under the configured plugin dirs.
pub fn registry(config: &EngineConfig) -> anyhow::Result<WidgetRegistry> {
    let mut registry =
        builtin_registry(&Providers::none()).context("registering built-in widgets")?;
    if !config.plugin_dirs.is_empty() {
        let report = discover_dirs(&mut registry, &config.plugin_dirs);
        debug!(registered = ?report.registered, warnings = report.warnings.len(), "plugin discovery");
    }
    Ok(registry)
}

pub fn kinds(registry: &WidgetRegistry) {
    for metadata in registry.list() {
        let interval = match metadata.update_interval {
            0 => "static".to_string(),
            secs => format!("{secs}s"),
        };
        let mut line = format!(
            "{:<14} {:<8} {:<10} {:<7} {}",
            metadata.kind.as_str(),
            metadata.version.to_string(),
            metadata.category.as_str(),
            interval,
            metadata.description
        );
        if !metadata.dependencies.is_empty() {
            let deps: Vec<&str> = metadata.dependencies.iter().map(|dep| dep.as_str()).collect();
            line.push_str(&format!(" (needs {})", deps.join(", ")));
        }
        println!("{}", line.trim_end());
    }
}

fn layout_path(config: &EngineConfig, explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit.or_else(|| config.layout_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("no layout given and layout.path is not set"),
    }
}

fn load_layout(
    config: &EngineConfig,
    registry: &WidgetRegistry,
    explicit: Option<PathBuf>,
) -> anyhow::Result<LoadedLayout> {
    let path = layout_path(config, explicit)?;
    let mut loaded = document::load_from_path(&path, registry)
        .with_context(|| format!("loading {}", path.display()))?;
    config.apply_defaults(&mut loaded);
    let screen = loaded.layout.screen_size();
    if screen != config.screen_size {
        warn!(layout = %screen, display = %config.screen_size, "layout screen size differs from display");
    }
    Ok(loaded)
}

pub fn check(
    config: &EngineConfig,
    registry: &WidgetRegistry,
    layout: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let loaded = load_layout(config, registry, layout)?;
    for warning in &loaded.warnings {
        println!("warning: {warning}");
    }
    let violations = loaded.layout.validate(registry);
    for violation in &violations {
        println!("error: {violation}");
    }
    println!(
        "{} widgets, {} warnings, {} violations",
        loaded.layout.len(),
        loaded.warnings.len(),
        violations.len()
    );
    Ok(if violations.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn frame(
    config: &EngineConfig,
    registry: &WidgetRegistry,
    layout: Option<PathBuf>,
    at: Option<&str>,
) -> anyhow::Result<()> {
    let wall = match at {
        Some(text) => NaiveDateTime::parse_from_str(text.trim(), AT_FORMAT)
            .with_context(|| format!("--at '{text}' must look like 2026-10-14 12:00:00"))?,
        None => Local::now().naive_local(),
    };
    let loaded = load_layout(config, registry, layout)?;
    let frame = config.scheduler().tick(&loaded.layout, Duration::ZERO, wall);
    println!("{}", serde_json::to_string_pretty(&frame)?);
    Ok(())
}

pub fn run(
    config: &EngineConfig,
    registry: &WidgetRegistry,
    layout: Option<PathBuf>,
    frames: Option<u64>,
) -> anyhow::Result<()> {
    let loaded = load_layout(config, registry, layout)?;
    let mut runner = FrameRunner::new(
        shared(loaded.layout),
        StdClock::new(),
        JsonLinesSink::new(std::io::stdout()),
        config.frame_interval,
    )
    .with_brightness(config.brightness);
    if let Some(limit) = frames {
        runner = runner.with_frame_limit(limit);
    }
    let mut handle = runner.spawn("mosaic-frames")?;
    handle.join()?;
    let stats = handle.stats();
    info!(
        pushed = stats.frames_pushed,
        failed = stats.push_failures,
        "frame loop finished"
    );
    Ok(())
}
