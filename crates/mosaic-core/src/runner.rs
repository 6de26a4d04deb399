//! Periodic frame loop: tick the scheduler, push the frame, repeat.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::device::{FrameSink, PushError};
use crate::error::MosaicError;
use crate::layout::Layout;
use crate::scheduler::{Clock, Frame, Scheduler};

/// Layout shared between an editor and the frame loop. The loop holds the
/// lock for the whole of one tick.
pub type SharedLayout = Arc<Mutex<Layout>>;

#[must_use]
pub fn shared(layout: Layout) -> SharedLayout {
    Arc::new(Mutex::new(layout))
}

/// Frame loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    #[default]
    Boot,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerStats {
    pub frames_pushed: u64,
    pub push_failures: u64,
    pub last_error: Option<PushError>,
}

/// Drives a scheduler against a shared layout and a frame sink.
pub struct FrameRunner<C: Clock + Clone, S: FrameSink> {
    layout: SharedLayout,
    scheduler: Scheduler,
    clock: C,
    sink: S,
    frame_interval: Duration,
    frame_limit: Option<u64>,
}

impl<C: Clock + Clone, S: FrameSink + 'static> FrameRunner<C, S> {
    #[must_use]
    pub fn new(layout: SharedLayout, clock: C, sink: S, frame_interval: Duration) -> Self {
        Self {
            layout,
            scheduler: Scheduler::new(),
            clock,
            sink,
            frame_interval,
            frame_limit: None,
        }
    }

    /// Stop on its own after this many successful pushes.
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Brightness stamped on every frame, cleared frames included.
    #[must_use]
    pub fn with_brightness(mut self, percent: u8) -> Self {
        self.scheduler.set_brightness(percent);
        self
    }

    #[must_use]
    pub fn layout(&self) -> &SharedLayout {
        &self.layout
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Compose one frame under the layout lock, then push it.
    pub fn tick(&mut self) -> Result<Frame, PushError> {
        let now = self.clock.now();
        let wall = self.clock.wall_time();
        let frame = {
            let layout = self.layout.lock();
            self.scheduler.tick(&layout, now, wall)
        };
        self.sink.push(&frame)?;
        Ok(frame)
    }

    /// Push a background-only frame.
    pub fn clear(&mut self) -> Result<(), PushError> {
        let mut frame = {
            let layout = self.layout.lock();
            Frame::blank(
                self.scheduler.frames_emitted(),
                layout.screen_size(),
                layout.background_color(),
            )
        };
        frame.brightness = self.scheduler.brightness();
        self.sink.push(&frame)
    }

    /// Run the loop on a named thread.
    pub fn spawn(self, name: impl Into<String>) -> Result<RunnerHandle<C, S>, MosaicError> {
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(RunnerState::Boot));
        let stats = Arc::new(Mutex::new(RunnerStats::default()));
        let clock = self.clock.clone();

        let stop_thread = stop.clone();
        let state_thread = state.clone();
        let stats_thread = stats.clone();
        let join = thread::Builder::new()
            .name(name.into())
            .spawn(move || run_frame_loop(self, &stop_thread, &state_thread, &stats_thread))
            .map_err(|err| MosaicError::Thread(err.to_string().into()))?;

        Ok(RunnerHandle {
            stop,
            state,
            stats,
            clock,
            join: Some(join),
        })
    }
}

fn run_frame_loop<C: Clock + Clone, S: FrameSink + 'static>(
    mut runner: FrameRunner<C, S>,
    stop: &AtomicBool,
    state: &Mutex<RunnerState>,
    stats: &Mutex<RunnerStats>,
) -> S {
    *state.lock() = RunnerState::Running;
    info!(interval = ?runner.frame_interval, "frame loop started");
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let started = runner.clock.now();
        match runner.tick() {
            Ok(_) => {
                let mut stats = stats.lock();
                stats.frames_pushed += 1;
                if runner
                    .frame_limit
                    .is_some_and(|limit| stats.frames_pushed >= limit)
                {
                    break;
                }
            }
            Err(err) => {
                warn!("{err}; retrying next frame");
                let mut stats = stats.lock();
                stats.push_failures += 1;
                stats.last_error = Some(err);
            }
        }
        if runner.frame_interval.is_zero() {
            thread::yield_now();
            continue;
        }
        runner
            .clock
            .sleep_until(started.saturating_add(runner.frame_interval));
    }
    if let Err(err) = runner.clear() {
        warn!("failed to clear display on shutdown: {err}");
    }
    *state.lock() = RunnerState::Stopped;
    info!("frame loop stopped");
    runner.sink
}

/// Control handle for a spawned frame loop.
pub struct RunnerHandle<C: Clock, S> {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<RunnerState>>,
    stats: Arc<Mutex<RunnerStats>>,
    clock: C,
    join: Option<thread::JoinHandle<S>>,
}

impl<C: Clock, S> RunnerHandle<C, S> {
    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.state.lock()
    }

    #[must_use]
    pub fn stats(&self) -> RunnerStats {
        self.stats.lock().clone()
    }

    #[must_use]
    pub fn frames_pushed(&self) -> u64 {
        self.stats.lock().frames_pushed
    }

    #[must_use]
    pub fn push_failures(&self) -> u64 {
        self.stats.lock().push_failures
    }

    #[must_use]
    pub fn last_error(&self) -> Option<PushError> {
        self.stats.lock().last_error.clone()
    }

    /// Ask the loop to clear the display and exit.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.clock.wake();
    }

    /// Wait for the loop to finish and take back its sink.
    pub fn join(&mut self) -> Result<S, MosaicError> {
        let join = self
            .join
            .take()
            .ok_or_else(|| MosaicError::Thread("already joined".into()))?;
        join.join()
            .map_err(|_| MosaicError::Thread("frame loop panicked".into()))
    }
}

impl<C: Clock, S> Drop for RunnerHandle<C, S> {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            self.stop();
            let _ = join.join();
        }
    }
}
