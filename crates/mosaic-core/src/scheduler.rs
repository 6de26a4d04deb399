//! Refresh scheduling, frame composition and clocks.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::debug;

use crate::layout::{Layout, RenderEntry, WidgetId};
use crate::render::RenderData;
use crate::value::Rgb;
use crate::widget::ScreenSize;

/// Time source for the frame loop.
pub trait Clock: Send + Sync + 'static {
    /// Monotonic time since the clock started.
    fn now(&self) -> Duration;

    /// Local wall-clock time, handed to widgets while they render.
    fn wall_time(&self) -> NaiveDateTime;

    /// Sleep until the given monotonic deadline.
    fn sleep_until(&self, deadline: Duration);

    /// Wake any sleepers (best-effort).
    fn wake(&self) {}
}

/// System clock: `Instant` for pacing, local time for rendering.
#[derive(Debug, Clone)]
pub struct StdClock {
    start: Instant,
}

impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn wall_time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep_until(&self, deadline: Duration) {
        let delta = deadline.saturating_sub(self.now());
        if !delta.is_zero() {
            thread::sleep(delta);
        }
    }
}

#[derive(Debug)]
struct ManualClockState {
    now: Duration,
    epoch: NaiveDateTime,
    sleep_calls: u64,
    interrupted: bool,
}

/// Deterministic clock for tests and previews. Wall time is `epoch + now`.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<(Mutex<ManualClockState>, Condvar)>,
}

impl ManualClock {
    #[must_use]
    pub fn new(epoch: NaiveDateTime) -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(ManualClockState {
                    now: Duration::ZERO,
                    epoch,
                    sleep_calls: 0,
                    interrupted: false,
                }),
                Condvar::new(),
            )),
        }
    }

    #[must_use]
    pub fn current_time(&self) -> Duration {
        self.inner.0.lock().now
    }

    /// Advance time by `delta`, waking sleepers whose deadline passed.
    pub fn advance(&self, delta: Duration) -> Duration {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        state.now = state.now.saturating_add(delta);
        cvar.notify_all();
        state.now
    }

    pub fn set_time(&self, time: Duration) {
        let (lock, cvar) = &*self.inner;
        lock.lock().now = time;
        cvar.notify_all();
    }

    #[must_use]
    pub fn sleep_calls(&self) -> u64 {
        self.inner.0.lock().sleep_calls
    }

    /// Release current and future sleepers.
    pub fn interrupt(&self) {
        let (lock, cvar) = &*self.inner;
        lock.lock().interrupted = true;
        cvar.notify_all();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.current_time()
    }

    fn wall_time(&self) -> NaiveDateTime {
        let state = self.inner.0.lock();
        chrono::Duration::from_std(state.now)
            .ok()
            .and_then(|offset| state.epoch.checked_add_signed(offset))
            .unwrap_or(state.epoch)
    }

    fn sleep_until(&self, deadline: Duration) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock();
        state.sleep_calls = state.sleep_calls.saturating_add(1);
        while !state.interrupted && state.now < deadline {
            cvar.wait(&mut state);
        }
    }

    fn wake(&self) {
        self.interrupt();
    }
}

/// Where a widget is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Due,
    Rendered,
}

/// Per-widget counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetStats {
    pub render_count: u64,
    /// Whole intervals skipped because ticks arrived late.
    pub missed: u64,
    pub last_rendered: Option<Duration>,
}

#[derive(Debug, Default)]
struct ScheduleEntry {
    phase: Phase,
    revision: u64,
    cached: Option<RenderData>,
    stats: WidgetStats,
}

impl ScheduleEntry {
    fn is_due(&mut self, revision: u64, interval: Duration, now: Duration) -> bool {
        if self.cached.is_none() || self.revision != revision {
            return true;
        }
        let Some(last) = self.stats.last_rendered else {
            return true;
        };
        if interval.is_zero() {
            return false;
        }
        let elapsed = now.saturating_sub(last);
        if elapsed >= interval * 2 {
            let windows = elapsed.as_nanos() / interval.as_nanos();
            let skipped = u64::try_from(windows - 1).unwrap_or(u64::MAX);
            self.stats.missed = self.stats.missed.saturating_add(skipped);
        }
        elapsed >= interval
    }
}

pub const DEFAULT_BRIGHTNESS: u8 = 100;

/// One full composed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub sequence: u64,
    pub screen: ScreenSize,
    pub background: Rgb,
    /// Display brightness in percent.
    pub brightness: u8,
    /// Paint order: later entries cover earlier ones.
    pub entries: Vec<RenderEntry>,
    /// Widgets whose data was recomputed for this frame.
    pub refreshed: Vec<WidgetId>,
}

impl Frame {
    /// Background only; used to clear the display.
    #[must_use]
    pub fn blank(sequence: u64, screen: ScreenSize, background: Rgb) -> Self {
        Self {
            sequence,
            screen,
            background,
            brightness: DEFAULT_BRIGHTNESS,
            entries: Vec::new(),
            refreshed: Vec::new(),
        }
    }
}

/// Drives per-widget refresh and composes a full frame every tick.
///
/// A visible widget is due when it has never rendered, when it changed
/// since its last render, or when at least its update interval has elapsed
/// since then. Interval 0 renders once. Widgets that are not due keep their
/// cached render data.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: HashMap<WidgetId, ScheduleEntry>,
    /// Instance of the layout the entries belong to.
    layout: Option<u64>,
    brightness: Option<u8>,
    due_at: Duration,
    frames: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every composed frame with `percent`, capped at 100.
    #[must_use]
    pub fn with_brightness(mut self, percent: u8) -> Self {
        self.set_brightness(percent);
        self
    }

    pub fn set_brightness(&mut self, percent: u8) {
        self.brightness = Some(percent.min(100));
    }

    #[must_use]
    pub fn brightness(&self) -> u8 {
        self.brightness.unwrap_or(DEFAULT_BRIGHTNESS)
    }

    /// Drop cached state when asked to drive a different layout. Widget ids
    /// restart at zero in every layout, so entries never carry over.
    fn follow(&mut self, layout: &Layout) {
        let instance = layout.instance();
        if self.layout == Some(instance) {
            return;
        }
        if self.layout.is_some() {
            debug!(dropped = self.entries.len(), "layout replaced; schedule reset");
        }
        self.entries.clear();
        self.due_at = Duration::ZERO;
        self.layout = Some(instance);
    }

    /// Run one tick: mark, render, compose.
    pub fn tick(&mut self, layout: &Layout, now: Duration, wall: NaiveDateTime) -> Frame {
        self.mark_due(layout, now);
        self.render_due(layout, wall);
        self.compose(layout)
    }

    /// Move every due widget from Idle to Due; returns them in composition order.
    pub fn mark_due(&mut self, layout: &Layout, now: Duration) -> Vec<WidgetId> {
        self.follow(layout);
        self.entries.retain(|id, _| layout.get(*id).is_some());
        self.due_at = now;
        let mut due = Vec::new();
        for (id, widget) in layout.visible_in_order() {
            let entry = self.entries.entry(id).or_default();
            let interval = Duration::from_secs(u64::from(widget.update_interval()));
            if entry.is_due(widget.revision(), interval, now) {
                entry.phase = Phase::Due;
                due.push(id);
            }
        }
        due
    }

    /// Render every Due widget and move it to Rendered.
    pub fn render_due(&mut self, layout: &Layout, wall: NaiveDateTime) -> Vec<WidgetId> {
        self.follow(layout);
        let screen = layout.screen_size();
        let mut rendered = Vec::new();
        for (id, widget) in layout.visible_in_order() {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            if entry.phase != Phase::Due {
                continue;
            }
            entry.cached = Some(widget.render_data(wall, screen));
            entry.revision = widget.revision();
            entry.phase = Phase::Rendered;
            entry.stats.render_count += 1;
            entry.stats.last_rendered = Some(self.due_at);
            rendered.push(id);
        }
        rendered
    }

    /// Build the full frame from cached data; Rendered widgets return to Idle.
    pub fn compose(&mut self, layout: &Layout) -> Frame {
        self.follow(layout);
        let screen = layout.screen_size();
        let mut entries = Vec::with_capacity(layout.len());
        let mut refreshed = Vec::new();
        for (id, widget) in layout.visible_in_order() {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            if entry.phase == Phase::Rendered {
                refreshed.push(id);
            }
            entry.phase = Phase::Idle;
            let Some(data) = entry.cached.clone() else {
                continue;
            };
            entries.push(RenderEntry {
                id,
                kind: widget.kind().into(),
                z_index: widget.z_index(),
                bounds: widget.bounds().clamped(screen),
                data,
            });
        }
        let sequence = self.frames;
        self.frames += 1;
        debug!(sequence, widgets = entries.len(), refreshed = refreshed.len(), "composed frame");
        Frame {
            sequence,
            screen,
            background: layout.background_color(),
            brightness: self.brightness(),
            entries,
            refreshed,
        }
    }

    #[must_use]
    pub fn phase(&self, id: WidgetId) -> Option<Phase> {
        self.entries.get(&id).map(|entry| entry.phase)
    }

    #[must_use]
    pub fn stats(&self, id: WidgetId) -> Option<WidgetStats> {
        self.entries.get(&id).map(|entry| entry.stats)
    }

    /// Drop cached data so the widget renders on the next tick.
    pub fn invalidate(&mut self, id: WidgetId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.cached = None;
        }
    }

    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.cached = None;
        }
    }

    /// Frames composed so far; also the next frame's sequence number.
    #[must_use]
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }
}
