//! Chroma Sentry
//!
//! A screen-region detection engine: continuously samples a small
//! rectangular region of a screen buffer, classifies pixels by color
//! proximity to a target hue, and derives a boolean should-act decision
//! from a geometric test — a center-zone hit or a three-way ray-cast
//! corroboration. The decision, an independent crosshair-pixel check and
//! the measured frame rate are published for an external actuator to poll.
//!
//! # Example
//!
//! ```ignore
//! use chroma_sentry::{BufferSource, EngineConfig, FrameSource, TriggerEngine};
//! use std::sync::Arc;
//!
//! let screen = BufferSource::new(current_screen_frame());
//! let factory = {
//!     let screen = screen.clone();
//!     Arc::new(move || Ok(Box::new(screen.clone()) as Box<dyn FrameSource>))
//! };
//! let mut engine = TriggerEngine::new(EngineConfig::default(), factory)?;
//! engine.start()?;
//! if engine.fire() && engine.crosshair_hit() {
//!     // actuate
//! }
//! ```

pub mod capture;
pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod state;

pub use capture::{BufferSource, FrameSource, SourceFactory};
#[cfg(feature = "sequence-capture")]
pub use capture::SequenceSource;
pub use config::{ConfigError, EngineConfig};
pub use detect::analyzer::{DetectionResult, FrameAnalyzer};
pub use detect::classify::{default_kernel, ColorSpec, MaskKernel, ScalarKernel};
#[cfg(feature = "parallel")]
pub use detect::classify::ParallelKernel;
pub use detect::rays::{RayDirection, RayFans};
pub use frame::{BinaryMask, Frame, PixelFormat, Region};
pub use pipeline::TriggerEngine;
pub use state::{EngineState, EngineStatus, FpsWindow};

use thiserror::Error;

/// Engine-level failures. Transient capture errors and malformed frames are
/// absorbed inside the pipeline and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration rejected at load or reload; the previous configuration
    /// stays in effect
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Capture source could not be created or served a grab
    #[error("capture source error: {0}")]
    Source(String),

    /// Thread spawn failure during `start`; the engine stays stopped
    #[error("failed to spawn pipeline thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, EngineError>;
