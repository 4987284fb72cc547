//! Capture/worker pipeline
//!
//! One capture thread pushes frames into a bounded queue; a small worker
//! pool drains it and publishes detection results into the shared state.
//! Backpressure is latest-wins: a full queue drops the incoming frame
//! because a stale frame is worse than a lost one.

use crate::capture::SourceFactory;
use crate::config::EngineConfig;
use crate::detect::analyzer::FrameAnalyzer;
use crate::detect::classify::{default_kernel, MaskKernel};
use crate::detect::rays::RayFans;
use crate::frame::{Frame, Region};
use crate::state::{EngineState, EngineStatus};
use crate::{EngineError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Frames in flight; anything beyond this is dropped at capture time
const FRAME_QUEUE_CAPACITY: usize = 2;
/// Hard cap on worker threads regardless of configuration
const MAX_WORKERS: usize = 8;
/// Worker dequeue timeout; bounds how long a stop request can go unnoticed
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);
/// Pause after a failed grab before retrying
const CAPTURE_RETRY_BACKOFF: Duration = Duration::from_millis(100);
/// Interval between capture statistics log lines
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Config plus the geometry derived from it, swapped together on reload
struct ActiveConfig {
    config: EngineConfig,
    fans: Arc<RayFans>,
}

impl ActiveConfig {
    fn new(config: EngineConfig) -> Self {
        let fans = Arc::new(RayFans::build(
            config.ray_angle_spread,
            config.rays_per_direction,
        ));
        Self { config, fans }
    }
}

/// The detection engine: owns the capture thread, the worker pool and the
/// externally readable state. All public methods are safe to call from any
/// thread other than the pipeline's own.
pub struct TriggerEngine {
    active: Arc<Mutex<ActiveConfig>>,
    analyzer: Arc<FrameAnalyzer>,
    state: EngineState,
    running: Arc<AtomicBool>,
    source_factory: SourceFactory,
    capture: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    drain: Option<Receiver<Frame>>,
}

impl TriggerEngine {
    /// Create an engine with the default mask kernel. The config is
    /// validated up front; the source factory runs on every `start`.
    pub fn new(config: EngineConfig, source_factory: SourceFactory) -> Result<Self> {
        Self::with_kernel(config, source_factory, default_kernel())
    }

    /// Create an engine with an explicit mask kernel
    pub fn with_kernel(
        config: EngineConfig,
        source_factory: SourceFactory,
        kernel: Box<dyn MaskKernel>,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::Config)?;
        Ok(Self {
            active: Arc::new(Mutex::new(ActiveConfig::new(config))),
            analyzer: Arc::new(FrameAnalyzer::new(kernel)),
            state: EngineState::new(),
            running: Arc::new(AtomicBool::new(false)),
            source_factory,
            capture: None,
            workers: Vec::new(),
            drain: None,
        })
    }

    /// Start capturing and analyzing. A no-op when already running. On any
    /// failure the engine is left fully stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.state.set_status(EngineStatus::Starting);

        let source = (self.source_factory)().map_err(|e| {
            self.state.set_status(EngineStatus::Stopped);
            e
        })?;

        let (region, worker_count) = {
            let active = self.active.lock();
            let (dw, dh) = source.display_size();
            (
                Region::centered_on(dw, dh, active.config.trigger_zone_size),
                active.config.num_threads.min(MAX_WORKERS),
            )
        };

        let (tx, rx) = bounded::<Frame>(FRAME_QUEUE_CAPACITY);
        self.running.store(true, Ordering::SeqCst);
        self.state.reset_outputs();

        let running = self.running.clone();
        let capture = thread::Builder::new()
            .name("sentry-capture".to_string())
            .spawn(move || capture_loop(running, source, region, tx))
            .map_err(|e| self.abort_start(e))?;
        self.capture = Some(capture);

        for i in 0..worker_count {
            let running = self.running.clone();
            let rx = rx.clone();
            let active = self.active.clone();
            let analyzer = self.analyzer.clone();
            let state = self.state.clone();
            let handle = thread::Builder::new()
                .name(format!("sentry-worker-{}", i))
                .spawn(move || worker_loop(running, rx, active, analyzer, state))
                .map_err(|e| self.abort_start(e))?;
            self.workers.push(handle);
        }

        self.drain = Some(rx);
        self.state.set_status(EngineStatus::Running);
        log::info!(
            "detection engine started: {}x{} region, {} workers",
            region.width,
            region.height,
            worker_count
        );
        Ok(())
    }

    /// Roll a partially started pipeline back to Stopped
    fn abort_start(&mut self, err: std::io::Error) -> EngineError {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture.take() {
            let _ = handle.join();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        self.state.set_status(EngineStatus::Stopped);
        EngineError::Spawn(err)
    }

    /// Stop the pipeline and wait for every thread to exit. Returns only
    /// after no thread can still publish; idempotent and callable from any
    /// thread that owns the engine.
    pub fn stop(&mut self) {
        if !self.running.load(Ordering::SeqCst) && self.capture.is_none() {
            return;
        }
        self.state.set_status(EngineStatus::Stopping);
        self.running.store(false, Ordering::SeqCst);

        // Each loop observes the cleared flag within one dequeue timeout
        if let Some(handle) = self.capture.take() {
            let _ = handle.join();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        if let Some(rx) = self.drain.take() {
            while rx.try_recv().is_ok() {}
        }

        self.state.set_status(EngineStatus::Stopped);
        log::info!("detection engine stopped");
    }

    /// Swap in a new configuration. Validation failure leaves the previous
    /// config in effect. Geometry is rebuilt synchronously; a changed
    /// capture-region size restarts the pipeline so no partial-region frame
    /// is ever analyzed.
    pub fn reload(&mut self, config: EngineConfig) -> Result<()> {
        config.validate().map_err(EngineError::Config)?;

        let resized = {
            let mut active = self.active.lock();
            let resized = active.config.trigger_zone_size != config.trigger_zone_size;
            *active = ActiveConfig::new(config);
            resized
        };

        if resized && self.running.load(Ordering::SeqCst) {
            log::info!("capture region resized, restarting pipeline");
            self.stop();
            self.start()?;
        } else {
            log::info!("configuration reloaded");
        }
        Ok(())
    }

    /// Latest fire decision
    pub fn fire(&self) -> bool {
        self.state.fire()
    }

    /// Latest crosshair-pixel check
    pub fn crosshair_hit(&self) -> bool {
        self.state.crosshair_hit()
    }

    /// Smoothed analysis frame rate
    pub fn fps(&self) -> f64 {
        self.state.fps()
    }

    /// Current lifecycle state
    pub fn status(&self) -> EngineStatus {
        self.state.status()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> EngineConfig {
        self.active.lock().config.clone()
    }

    /// Clonable handle for actuators that poll outputs without holding the
    /// engine itself
    pub fn state(&self) -> EngineState {
        self.state.clone()
    }
}

impl Drop for TriggerEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop(
    running: Arc<AtomicBool>,
    mut source: Box<dyn crate::capture::FrameSource>,
    region: Region,
    tx: Sender<Frame>,
) {
    let mut captured: u64 = 0;
    let mut dropped: u64 = 0;
    let mut last_stats = Instant::now();

    while running.load(Ordering::SeqCst) {
        match source.grab(&region) {
            Ok(frame) => {
                captured += 1;
                match tx.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => dropped += 1,
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e) => {
                log::warn!("capture failed: {}", e);
                thread::sleep(CAPTURE_RETRY_BACKOFF);
            }
        }

        if last_stats.elapsed() >= STATS_INTERVAL {
            log::info!(
                "capture: {} frames, {} dropped, {}x{} region",
                captured,
                dropped,
                region.width,
                region.height
            );
            last_stats = Instant::now();
        }
    }
}

fn worker_loop(
    running: Arc<AtomicBool>,
    rx: Receiver<Frame>,
    active: Arc<Mutex<ActiveConfig>>,
    analyzer: Arc<FrameAnalyzer>,
    state: EngineState,
) {
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(DEQUEUE_TIMEOUT) {
            Ok(frame) => {
                let (config, fans) = {
                    let active = active.lock();
                    (active.config.clone(), active.fans.clone())
                };
                let result = analyzer.analyze(frame, &config, &fans);
                state.publish(&result, Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
