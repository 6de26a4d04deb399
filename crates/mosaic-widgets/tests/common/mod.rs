#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use mosaic_core::WidgetRegistry;
use mosaic_widgets::{builtin_registry, Providers};

pub fn registry() -> WidgetRegistry {
    builtin_registry(&Providers::none()).unwrap()
}

pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 14)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}
