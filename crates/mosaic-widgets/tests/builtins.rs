mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{at, registry};
use mosaic_core::document;
use mosaic_core::document::LoadWarning;
use mosaic_core::render::ERROR_TEXT;
use mosaic_core::schema::ViolationKind;
use mosaic_core::{Layout, MosaicError, PropertyMap, Rgb, Scheduler, ScreenSize};
use mosaic_widgets::kinds::stopwatch;
use mosaic_widgets::providers::{CachedWeather, WeatherReading, WEATHER};
use mosaic_widgets::{builtin_registry, BuiltinKind, Providers};

#[test]
fn every_builtin_and_alias_is_registered() {
    let registry = registry();
    assert_eq!(registry.len(), BuiltinKind::ALL.len());
    for kind in BuiltinKind::ALL {
        assert_eq!(registry.resolve(kind.name()), Some(kind.name()));
        assert_eq!(registry.resolve(&kind.legacy_alias()), Some(kind.name()));
    }
    let time: Vec<_> = registry
        .by_category("Time")
        .into_iter()
        .map(|metadata| metadata.kind.clone())
        .collect();
    assert_eq!(time, vec!["Clock", "Countdown", "Date"]);
}

#[test]
fn defaults_fit_every_screen() {
    let registry = registry();
    for screen in ScreenSize::ALL {
        let mut layout = Layout::new(screen);
        for kind in BuiltinKind::ALL {
            layout.spawn(&registry, kind.name(), PropertyMap::new()).unwrap();
        }
        assert!(layout.validate(&registry).is_empty(), "{screen}");
        let sequence = layout.render_sequence(at(12, 0, 0));
        assert_eq!(sequence.len(), BuiltinKind::ALL.len());
        assert!(sequence.iter().all(|entry| !entry.data.is_error_sentinel()));
    }
}

#[test]
fn clock_and_weather_on_one_frame() {
    let cache = Arc::new(CachedWeather::weather());
    let registry = builtin_registry(&Providers::none().with_weather(cache.clone())).unwrap();
    let mut layout = Layout::new(ScreenSize::S64);
    let clock = layout.spawn(&registry, "Clock", PropertyMap::new()).unwrap();
    let weather = layout.spawn(&registry, "Weather", PropertyMap::new()).unwrap();
    let mut scheduler = Scheduler::new();

    let frame = scheduler.tick(&layout, Duration::ZERO, at(12, 0, 0));
    let texts: Vec<_> = frame.entries.iter().map(|entry| entry.data.text_value()).collect();
    assert_eq!(texts, vec![Some("12:00"), Some("--°C")]);

    cache.update(WeatherReading {
        temperature_c: 18.4,
        weather_code: None,
    });
    scheduler.invalidate(weather);
    let frame = scheduler.tick(&layout, Duration::from_secs(1), at(12, 0, 1));
    assert_eq!(frame.refreshed, vec![weather]);
    assert_eq!(frame.entries[1].data.text_value(), Some("18°C"));

    let frame = scheduler.tick(&layout, Duration::from_secs(60), at(12, 1, 0));
    assert_eq!(frame.refreshed, vec![clock]);
    assert_eq!(frame.entries[0].data.text_value(), Some("12:01"));
}

#[test]
fn weather_reports_its_missing_provider() {
    let registry = registry();
    let missing = registry
        .missing_dependencies("Weather", &Providers::none().capabilities())
        .unwrap();
    assert_eq!(missing, vec![WEATHER]);
    assert!(registry
        .missing_dependencies("Clock", &Providers::none().capabilities())
        .unwrap()
        .is_empty());
}

#[test]
fn out_of_range_font_size_is_rejected() {
    let registry = registry();
    let mut overrides = PropertyMap::new();
    overrides.insert("font_size".into(), 999_i64.into());
    let err = registry.create("SimpleText", overrides).unwrap_err();
    assert_eq!(err.property(), Some("font_size"));
    assert!(matches!(
        err,
        MosaicError::InvalidProperty {
            violation: ViolationKind::OutOfRange { .. },
            ..
        }
    ));
}

#[test]
fn unreadable_countdown_target_draws_the_error_sentinel() {
    let registry = registry();
    let mut layout = Layout::new(ScreenSize::S32);
    let broken = layout.spawn(&registry, "Countdown", PropertyMap::new()).unwrap();
    layout.spawn(&registry, "SimpleText", PropertyMap::new()).unwrap();
    layout
        .get_mut(broken)
        .unwrap()
        .set_property("target_date", "next tuesday")
        .unwrap();

    let sequence = layout.render_sequence(at(8, 0, 0));
    assert_eq!(sequence[0].data.text_value(), Some(ERROR_TEXT));
    assert_eq!(sequence[1].data.text_value(), Some("Hello"));
}

#[test]
fn stopwatch_banks_time_between_runs() {
    let registry = registry();
    let mut widget = registry.create("Stopwatch", PropertyMap::new()).unwrap();
    let screen = ScreenSize::S64;

    stopwatch::start(&mut widget, at(9, 0, 0)).unwrap();
    stopwatch::start(&mut widget, at(9, 0, 30)).unwrap();
    assert_eq!(
        widget.render_data(at(9, 1, 5), screen).text_value(),
        Some("Stopwatch\n00:01:05")
    );

    stopwatch::stop(&mut widget, at(9, 1, 5)).unwrap();
    assert_eq!(
        widget.render_data(at(11, 0, 0), screen).text_value(),
        Some("Stopwatch\n00:01:05")
    );

    stopwatch::start(&mut widget, at(11, 0, 0)).unwrap();
    stopwatch::stop(&mut widget, at(11, 0, 10)).unwrap();
    assert_eq!(
        widget.property("elapsed_seconds").and_then(|value| value.as_f64()),
        Some(75.0)
    );

    stopwatch::reset(&mut widget).unwrap();
    assert_eq!(
        widget.render_data(at(12, 0, 0), screen).text_value(),
        Some("Stopwatch\n00:00:00")
    );
}

#[test]
fn builtin_layout_round_trips() {
    let registry = registry();
    let mut layout = Layout::new(ScreenSize::S64);
    layout.set_background_color(Rgb::new(5, 6, 7));
    for kind in BuiltinKind::ALL {
        layout.spawn(&registry, kind.name(), PropertyMap::new()).unwrap();
    }
    let mut edited = PropertyMap::new();
    edited.insert("progress".into(), 0.75.into());
    edited.insert("show_percentage".into(), true.into());
    edited.insert("foreground_color".into(), Rgb::new(10, 20, 30).into());
    let bar = layout.spawn(&registry, "ProgressBar", edited).unwrap();
    let mut metrics = PropertyMap::new();
    metrics.insert("metrics".into(), (&["CPU", "Disk"][..]).into());
    let stats = layout.spawn(&registry, "SystemStats", metrics).unwrap();
    let text = layout.spawn(&registry, "SimpleText", PropertyMap::new()).unwrap();
    {
        let widget = layout.get_mut(text).unwrap();
        widget.set_property("text", "Door 3").unwrap();
        widget.set_position(4, 9);
        widget.set_size(40, 12);
        widget.set_visible(false);
        widget.set_update_interval(5);
    }
    layout.bring_to_front(bar).unwrap();
    layout.send_to_back(stats).unwrap();

    let json = document::to_json_string(&layout).unwrap();
    let loaded = document::from_json_str(&json, &registry).unwrap();
    assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
    assert!(loaded.background_specified);
    assert_eq!(loaded.layout.background_color(), Rgb::new(5, 6, 7));
    assert_eq!(loaded.layout.len(), layout.len());
    for ((_, original), (_, restored)) in layout.iter().zip(loaded.layout.iter()) {
        assert_eq!(restored.kind(), original.kind());
        assert_eq!(restored.properties(), original.properties(), "{}", original.kind());
        assert_eq!(restored.bounds(), original.bounds(), "{}", original.kind());
        assert_eq!(restored.z_index(), original.z_index(), "{}", original.kind());
        assert_eq!(restored.is_visible(), original.is_visible());
        assert_eq!(restored.update_interval(), original.update_interval());
    }
    assert_eq!(document::save(&loaded.layout), document::save(&layout));
}

#[test]
fn legacy_documents_load() {
    let registry = registry();
    let text = r#"{
        "screen_size": 32,
        "background_color": [0, 0, 0],
        "widgets": [
            { "type": "ClockWidget", "x": 1, "y": 1, "properties": { "show_seconds": true } },
            { "type": "RadarWidget", "x": 0, "y": 0 }
        ]
    }"#;
    let loaded = document::from_json_str(text, &registry).unwrap();
    assert_eq!(
        loaded.warnings,
        vec![LoadWarning::UnknownKind {
            index: 1,
            kind: "RadarWidget".into()
        }]
    );
    let sequence = loaded.layout.render_sequence(at(7, 8, 9));
    assert_eq!(sequence.len(), 1);
    assert_eq!(sequence[0].kind, "Clock");
    assert_eq!(sequence[0].data.text_value(), Some("07:08:09"));
}
