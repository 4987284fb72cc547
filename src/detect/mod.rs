//! Detection core
//!
//! - `classify` — per-pixel color matching and whole-frame mask kernels
//! - `rays` — precomputed ray fans and the ray-casting walk
//! - `analyzer` — one frame's evaluation into a `DetectionResult`

pub mod analyzer;
pub mod classify;
pub mod rays;

pub use analyzer::{DetectionResult, FrameAnalyzer};
pub use classify::{default_kernel, ColorSpec, MaskKernel, ScalarKernel};
#[cfg(feature = "parallel")]
pub use classify::ParallelKernel;
pub use rays::{cast_ray_with, cast_rays, RayDirection, RayFans};
