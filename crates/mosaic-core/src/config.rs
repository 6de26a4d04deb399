//! Engine configuration (`mosaic.toml`).

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::document::LoadedLayout;
use crate::error::MosaicError;
use crate::scheduler::Scheduler;
use crate::value::Rgb;
use crate::widget::ScreenSize;

pub const CONFIG_FILE_NAME: &str = "mosaic.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub screen_size: ScreenSize,
    /// Display brightness, 0..=100.
    pub brightness: u8,
    pub background_color: Rgb,
    pub frame_interval: Duration,
    pub layout_path: Option<PathBuf>,
    pub plugin_dirs: Vec<PathBuf>,
    pub log_level: SmolStr,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_size: ScreenSize::S64,
            brightness: 80,
            background_color: Rgb::BLACK,
            frame_interval: Duration::from_secs(1),
            layout_path: None,
            plugin_dirs: Vec::new(),
            log_level: SmolStr::new("info"),
        }
    }
}

impl EngineConfig {
    /// Read and validate a config file. Relative paths inside it resolve
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MosaicError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| MosaicError::InvalidConfig(format!("{CONFIG_FILE_NAME}: {err}").into()))?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, MosaicError> {
        let raw: EngineToml = toml::from_str(text)
            .map_err(|err| MosaicError::InvalidConfig(format!("{CONFIG_FILE_NAME}: {err}").into()))?;
        raw.into_config()
    }

    /// Display defaults for a layout whose document left them out.
    pub fn apply_defaults(&self, loaded: &mut LoadedLayout) {
        if !loaded.background_specified {
            loaded.layout.set_background_color(self.background_color);
        }
    }

    /// Scheduler stamping frames with the configured brightness.
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new().with_brightness(self.brightness)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(layout) = self.layout_path.as_mut() {
            if layout.is_relative() {
                *layout = base.join(&*layout);
            }
        }
        for dir in &mut self.plugin_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EngineToml {
    #[serde(default)]
    display: DisplaySection,
    #[serde(default)]
    schedule: ScheduleSection,
    #[serde(default)]
    layout: LayoutSection,
    #[serde(default)]
    plugins: PluginsSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplaySection {
    screen_size: Option<u32>,
    brightness: Option<i64>,
    background_color: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScheduleSection {
    frame_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginsSection {
    #[serde(default)]
    dirs: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: Option<String>,
}

impl EngineToml {
    fn into_config(self) -> Result<EngineConfig, MosaicError> {
        let defaults = EngineConfig::default();
        let screen_size = match self.display.screen_size {
            Some(pixels) => ScreenSize::from_pixels(pixels).map_err(|_| {
                MosaicError::InvalidConfig(
                    format!("display.screen_size must be 16, 32 or 64 (got {pixels})").into(),
                )
            })?,
            None => defaults.screen_size,
        };
        let brightness = match self.display.brightness {
            Some(value) => u8::try_from(value)
                .ok()
                .filter(|value| *value <= 100)
                .ok_or_else(|| {
                    MosaicError::InvalidConfig(
                        format!("display.brightness must be 0..=100 (got {value})").into(),
                    )
                })?,
            None => defaults.brightness,
        };
        let background_color = match self.display.background_color {
            Some(channels) => parse_color(&channels)?,
            None => defaults.background_color,
        };
        let frame_interval = match self.schedule.frame_interval_secs {
            Some(0) => {
                return Err(MosaicError::InvalidConfig(
                    "schedule.frame_interval_secs must be at least 1".into(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.frame_interval,
        };
        let log_level = match self.log.level {
            Some(level) => parse_log_level(&level)?,
            None => defaults.log_level,
        };
        Ok(EngineConfig {
            screen_size,
            brightness,
            background_color,
            frame_interval,
            layout_path: self.layout.path,
            plugin_dirs: self.plugins.dirs,
            log_level,
        })
    }
}

fn parse_color(channels: &[i64]) -> Result<Rgb, MosaicError> {
    let invalid = || {
        MosaicError::InvalidConfig(
            "display.background_color must be [r, g, b] with channels 0..=255".into(),
        )
    };
    let [r, g, b] = channels else {
        return Err(invalid());
    };
    let channel = |value: i64| u8::try_from(value).map_err(|_| invalid());
    Ok(Rgb::new(channel(*r)?, channel(*g)?, channel(*b)?))
}

fn parse_log_level(text: &str) -> Result<SmolStr, MosaicError> {
    let level = text.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(SmolStr::new(level)),
        _ => Err(MosaicError::InvalidConfig(
            format!("invalid log.level '{text}'").into(),
        )),
    }
}
