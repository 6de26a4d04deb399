//! Built-in widget kinds.

#![allow(missing_docs)]

mod clock;
mod countdown;
mod date;
mod progress_bar;
mod simple_text;
pub mod stopwatch;
mod system_stats;
mod weather;

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use mosaic_core::{
    PluginVersion, PropertySchema, RenderFailure, WidgetBehavior, WidgetFactory, WidgetMetadata,
};

use crate::providers::Providers;

/// Author recorded on every built-in kind.
pub const AUTHOR: &str = "mosaic";

const VERSION: PluginVersion = PluginVersion::new(1, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Clock,
    Date,
    Countdown,
    Weather,
    ProgressBar,
    SimpleText,
    SystemStats,
    Stopwatch,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 8] = [
        BuiltinKind::Clock,
        BuiltinKind::Date,
        BuiltinKind::Countdown,
        BuiltinKind::Weather,
        BuiltinKind::ProgressBar,
        BuiltinKind::SimpleText,
        BuiltinKind::SystemStats,
        BuiltinKind::Stopwatch,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Clock => clock::KIND,
            Self::Date => date::KIND,
            Self::Countdown => countdown::KIND,
            Self::Weather => weather::KIND,
            Self::ProgressBar => progress_bar::KIND,
            Self::SimpleText => simple_text::KIND,
            Self::SystemStats => system_stats::KIND,
            Self::Stopwatch => stopwatch::KIND,
        }
    }

    /// Legacy name used by older layout files, e.g. `ClockWidget`.
    #[must_use]
    pub fn legacy_alias(self) -> String {
        format!("{}Widget", self.name())
    }

    /// Accepts the kind name or its legacy alias, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name
            .strip_suffix("Widget")
            .or_else(|| name.strip_suffix("widget"))
            .unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(bare))
    }

    #[must_use]
    pub fn metadata(self) -> WidgetMetadata {
        match self {
            Self::Clock => clock::metadata(),
            Self::Date => date::metadata(),
            Self::Countdown => countdown::metadata(),
            Self::Weather => weather::metadata(),
            Self::ProgressBar => progress_bar::metadata(),
            Self::SimpleText => simple_text::metadata(),
            Self::SystemStats => system_stats::metadata(),
            Self::Stopwatch => stopwatch::metadata(),
        }
    }

    #[must_use]
    pub fn schema(self) -> PropertySchema {
        match self {
            Self::Clock => clock::schema(),
            Self::Date => date::schema(),
            Self::Countdown => countdown::schema(),
            Self::Weather => weather::schema(),
            Self::ProgressBar => progress_bar::schema(),
            Self::SimpleText => simple_text::schema(),
            Self::SystemStats => system_stats::schema(),
            Self::Stopwatch => stopwatch::schema(),
        }
    }

    /// Factory bound to the given providers.
    #[must_use]
    pub fn factory(self, providers: &Providers) -> WidgetFactory {
        match self {
            Self::Clock => stateless(|| clock::Clock),
            Self::Date => stateless(|| date::Date),
            Self::Countdown => stateless(|| countdown::Countdown),
            Self::Weather => {
                let provider = providers.weather.clone();
                Arc::new(move || {
                    Box::new(weather::Weather::new(provider.clone())) as Box<dyn WidgetBehavior>
                })
            }
            Self::ProgressBar => stateless(|| progress_bar::ProgressBar),
            Self::SimpleText => stateless(|| simple_text::SimpleText),
            Self::SystemStats => {
                let provider = providers.metrics.clone();
                Arc::new(move || {
                    Box::new(system_stats::SystemStats::new(provider.clone()))
                        as Box<dyn WidgetBehavior>
                })
            }
            Self::Stopwatch => stateless(|| stopwatch::Stopwatch),
        }
    }
}

fn stateless<B: WidgetBehavior + 'static>(make: fn() -> B) -> WidgetFactory {
    Arc::new(move || Box::new(make()) as Box<dyn WidgetBehavior>)
}

fn metadata(kind: &str, description: &str, category: &str, interval: u32) -> WidgetMetadata {
    WidgetMetadata::new(kind, VERSION)
        .description(description)
        .author(AUTHOR)
        .category(category)
        .update_interval(interval)
}

/// Format `now` with a strftime pattern without risking a panic on bad input.
pub(crate) fn format_time(now: NaiveDateTime, pattern: &str) -> Result<String, RenderFailure> {
    let items = StrftimeItems::new(pattern);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return Err(RenderFailure::new(format!("invalid format '{pattern}'")));
    }
    let mut out = String::new();
    write!(out, "{}", now.format_with_items(items))
        .map_err(|_| RenderFailure::new(format!("format '{pattern}' needs a time zone")))?;
    Ok(out)
}

/// Seconds rendered as `HH:MM:SS`; hours are not wrapped.
pub(crate) fn hms(total_seconds: i64) -> String {
    let total = total_seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(12, 5, 9)
            .unwrap()
    }

    #[test]
    fn legacy_names_resolve() {
        assert_eq!(BuiltinKind::from_name("ClockWidget"), Some(BuiltinKind::Clock));
        assert_eq!(BuiltinKind::from_name("simpletext"), Some(BuiltinKind::SimpleText));
        assert_eq!(BuiltinKind::from_name("Gauge"), None);
        assert_eq!(BuiltinKind::Weather.legacy_alias(), "WeatherWidget");
    }

    #[test]
    fn every_builtin_schema_has_valid_defaults() {
        for kind in BuiltinKind::ALL {
            assert!(kind.schema().validate_defaults().is_empty(), "{}", kind.name());
            assert_eq!(kind.metadata().kind, kind.name());
        }
    }

    #[test]
    fn bad_patterns_fail_instead_of_panicking() {
        assert_eq!(format_time(noon(), "%H:%M").unwrap(), "12:05");
        assert!(format_time(noon(), "%Q").is_err());
    }

    #[test]
    fn hms_pads_and_clamps() {
        assert_eq!(hms(0), "00:00:00");
        assert_eq!(hms(3_725), "01:02:05");
        assert_eq!(hms(-5), "00:00:00");
        assert_eq!(hms(360_000), "100:00:00");
    }
}
