//! Frame push interface towards the rasterizer / display device.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use smol_str::SmolStr;
use thiserror::Error;

use crate::scheduler::Frame;

/// A rejected push. The caller decides when to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("frame push failed: {0}")]
pub struct PushError(pub SmolStr);

impl PushError {
    pub fn new(message: impl Into<SmolStr>) -> Self {
        Self(message.into())
    }
}

/// Consumer of whole frames.
pub trait FrameSink: Send {
    fn push(&mut self, frame: &Frame) -> Result<(), PushError>;
}

/// Writes each frame as one JSON line, for an out-of-process rasterizer.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for JsonLinesSink<W> {
    fn push(&mut self, frame: &Frame) -> Result<(), PushError> {
        serde_json::to_writer(&mut self.writer, frame)
            .map_err(|err| PushError::new(err.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|err| PushError::new(err.to_string()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    frames: Vec<Frame>,
    failures_left: usize,
}

/// Keeps pushed frames in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` pushes.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures_left = count;
    }

    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        self.state.lock().frames.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrameSink for MemorySink {
    fn push(&mut self, frame: &Frame) -> Result<(), PushError> {
        let mut state = self.state.lock();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(PushError::new("device busy"));
        }
        state.frames.push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Rgb;
    use crate::widget::ScreenSize;

    #[test]
    fn json_lines_sink_writes_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.push(&Frame::blank(0, ScreenSize::S16, Rgb::BLACK)).unwrap();
        sink.push(&Frame::blank(1, ScreenSize::S16, Rgb::WHITE)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"sequence":0,"screen":16,"background":[0,0,0],"brightness":100,"entries":[],"refreshed":[]}"#
        );
    }

    #[test]
    fn memory_sink_fails_on_request_then_recovers() {
        let mut sink = MemorySink::new();
        let observer = sink.clone();
        sink.fail_next(1);
        let frame = Frame::blank(0, ScreenSize::S32, Rgb::BLACK);
        assert!(sink.push(&frame).is_err());
        assert!(sink.push(&frame).is_ok());
        assert_eq!(observer.len(), 1);
    }
}
