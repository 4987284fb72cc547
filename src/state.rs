//! Shared engine state
//!
//! The one lock in the crate. Workers publish a complete detection result
//! and the frame-interval sample in a single critical section, so external
//! readers never observe a half-written snapshot.

use crate::detect::analyzer::DetectionResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Number of inter-frame intervals kept for FPS smoothing
const FPS_WINDOW_LEN: usize = 30;

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Sliding window of inter-frame intervals; smoothed FPS is the reciprocal
/// of the mean interval
#[derive(Debug, Default)]
pub struct FpsWindow {
    intervals: VecDeque<f64>,
    last_frame: Option<Instant>,
}

impl FpsWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame arrival
    pub fn record(&mut self, now: Instant) {
        if let Some(prev) = self.last_frame {
            let interval = now.saturating_duration_since(prev).as_secs_f64();
            self.intervals.push_back(interval);
            if self.intervals.len() > FPS_WINDOW_LEN {
                self.intervals.pop_front();
            }
        }
        self.last_frame = Some(now);
    }

    /// Smoothed frames per second; 0.0 with no history or a zero mean
    pub fn fps(&self) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let mean = self.intervals.iter().sum::<f64>() / self.intervals.len() as f64;
        if mean > 0.0 {
            1.0 / mean
        } else {
            0.0
        }
    }

    /// Drop all history (pipeline restart)
    pub fn reset(&mut self) {
        self.intervals.clear();
        self.last_frame = None;
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.intervals.len()
    }
}

#[derive(Debug)]
struct Inner {
    fire: bool,
    crosshair_hit: bool,
    fps: f64,
    window: FpsWindow,
    status: EngineStatus,
}

/// Thread-safe, externally readable snapshot of the engine's outputs.
/// Cloning shares the same underlying state; an actuator holds a clone and
/// polls the accessors.
#[derive(Clone)]
pub struct EngineState {
    inner: Arc<Mutex<Inner>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                fire: false,
                crosshair_hit: false,
                fps: 0.0,
                window: FpsWindow::new(),
                status: EngineStatus::Stopped,
            })),
        }
    }

    /// Publish one complete analysis. Fire, crosshair and FPS update
    /// atomically under the single lock.
    pub fn publish(&self, result: &DetectionResult, now: Instant) {
        let mut inner = self.inner.lock();
        inner.window.record(now);
        inner.fps = inner.window.fps();
        inner.fire = result.fire;
        inner.crosshair_hit = result.crosshair_hit;
    }

    /// Latest fire decision
    pub fn fire(&self) -> bool {
        self.inner.lock().fire
    }

    /// Latest crosshair-pixel check
    pub fn crosshair_hit(&self) -> bool {
        self.inner.lock().crosshair_hit
    }

    /// Smoothed frames per second
    pub fn fps(&self) -> f64 {
        self.inner.lock().fps
    }

    /// Current lifecycle state
    pub fn status(&self) -> EngineStatus {
        self.inner.lock().status
    }

    pub(crate) fn set_status(&self, status: EngineStatus) {
        self.inner.lock().status = status;
    }

    /// Clear outputs and FPS history for a fresh start
    pub(crate) fn reset_outputs(&self) {
        let mut inner = self.inner.lock();
        inner.fire = false;
        inner.crosshair_hit = false;
        inner.fps = 0.0;
        inner.window.reset();
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}
