mod common;

use std::thread;
use std::time::Duration;

use common::{epoch, label_registry, text};
use mosaic_core::device::{MemorySink, PushError};
use mosaic_core::runner::{shared, FrameRunner, RunnerHandle, RunnerState};
use mosaic_core::{Layout, ManualClock, Rgb, ScreenSize};

fn one_label_layout() -> Layout {
    let (registry, _) = label_registry();
    let mut layout = Layout::new(ScreenSize::S32);
    layout.set_background_color(Rgb::new(1, 2, 3));
    layout.spawn(&registry, "Label", text("tick")).unwrap();
    layout
}

/// Advance the manual clock one second at a time until the loop stops.
fn drive_until_stopped(clock: &ManualClock, handle: &RunnerHandle<ManualClock, MemorySink>) {
    for _ in 0..10_000 {
        if handle.state() == RunnerState::Stopped {
            return;
        }
        clock.advance(Duration::from_secs(1));
        thread::sleep(Duration::from_millis(1));
    }
    panic!("frame loop did not stop");
}

#[test]
fn tick_pushes_one_frame() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(epoch());
    let mut runner = FrameRunner::new(
        shared(one_label_layout()),
        clock,
        sink.clone(),
        Duration::from_secs(1),
    );

    let frame = runner.tick().unwrap();
    assert_eq!(frame.sequence, 0);
    assert_eq!(frame.entries[0].data.text_value(), Some("tick"));
    assert_eq!(sink.frames(), vec![frame]);
}

#[test]
fn rejected_push_is_reported_and_retried() {
    let sink = MemorySink::new();
    let mut runner = FrameRunner::new(
        shared(one_label_layout()),
        ManualClock::new(epoch()),
        sink.clone(),
        Duration::from_secs(1),
    );

    sink.fail_next(1);
    let err = runner.tick().unwrap_err();
    assert_eq!(err, PushError::new("device busy"));
    assert_eq!(err.to_string(), "frame push failed: device busy");
    assert!(sink.is_empty());

    runner.tick().unwrap();
    assert_eq!(sink.len(), 1);
}

#[test]
fn frame_limit_stops_and_clears_the_display() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(epoch());
    let runner = FrameRunner::new(
        shared(one_label_layout()),
        clock.clone(),
        sink.clone(),
        Duration::from_secs(1),
    )
    .with_frame_limit(3);

    let mut handle = runner.spawn("frame-loop-test").unwrap();
    drive_until_stopped(&clock, &handle);
    let returned = handle.join().unwrap();

    let frames = returned.frames();
    assert_eq!(frames.len(), 4);
    assert!(frames[..3].iter().all(|frame| frame.entries.len() == 1));
    let blank = &frames[3];
    assert!(blank.entries.is_empty());
    assert_eq!(blank.sequence, 3);
    assert_eq!(blank.background, Rgb::new(1, 2, 3));
    assert_eq!(handle.frames_pushed(), 3);
    assert_eq!(handle.push_failures(), 0);
    assert!(handle.join().is_err());
}

#[test]
fn stop_wakes_a_sleeping_loop() {
    let sink = MemorySink::new();
    let clock = ManualClock::new(epoch());
    let runner = FrameRunner::new(
        shared(one_label_layout()),
        clock.clone(),
        sink.clone(),
        Duration::from_secs(3600),
    );

    let mut handle = runner.spawn("frame-loop-stop").unwrap();
    for _ in 0..10_000 {
        if handle.frames_pushed() > 0 && clock.sleep_calls() > 0 {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    handle.stop();
    handle.join().unwrap();

    assert_eq!(handle.state(), RunnerState::Stopped);
    let frames = sink.frames();
    assert_eq!(frames.len(), 2);
    assert!(frames[1].entries.is_empty());
}

#[test]
fn push_failures_are_counted_while_running() {
    let sink = MemorySink::new();
    sink.fail_next(2);
    let runner = FrameRunner::new(
        shared(one_label_layout()),
        ManualClock::new(epoch()),
        sink.clone(),
        Duration::ZERO,
    )
    .with_frame_limit(1);

    let mut handle = runner.spawn("frame-loop-failures").unwrap();
    handle.join().unwrap();

    let stats = handle.stats();
    assert_eq!(stats.frames_pushed, 1);
    assert_eq!(stats.push_failures, 2);
    assert_eq!(
        handle.last_error().map(|err| err.to_string()),
        Some("frame push failed: device busy".to_string())
    );
    assert_eq!(sink.len(), 2);
}

#[test]
fn replacing_the_shared_layout_redraws_from_scratch() {
    let (registry, _) = label_registry();
    let sink = MemorySink::new();
    let mut runner = FrameRunner::new(
        shared(one_label_layout()),
        ManualClock::new(epoch()),
        sink.clone(),
        Duration::from_secs(1),
    )
    .with_brightness(40);
    runner.tick().unwrap();

    let mut replacement = Layout::new(ScreenSize::S32);
    replacement.spawn(&registry, "Label", text("swapped")).unwrap();
    *runner.layout().lock() = replacement;

    let frame = runner.tick().unwrap();
    assert_eq!(frame.entries[0].data.text_value(), Some("swapped"));
    assert_eq!(frame.background, Rgb::BLACK);
    assert_eq!(frame.brightness, 40);

    runner.clear().unwrap();
    assert_eq!(sink.frames().last().map(|blank| blank.brightness), Some(40));
}
