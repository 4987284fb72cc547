//! Color classification kernels
//!
//! A `ColorSpec` decides match/no-match for a single pixel; a `MaskKernel`
//! vectorizes that decision over a whole frame. Rows carry no cross-pixel
//! dependency, so the bulk form fans out over rows freely.

use crate::frame::{BinaryMask, Frame};
use serde::{Deserialize, Serialize};

/// Reference color plus per-channel tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpec {
    /// Reference channel values
    pub color: [u8; 3],
    /// Inclusive per-channel tolerance; 0 demands equality, 255 matches all
    pub tolerance: u8,
}

impl ColorSpec {
    pub fn new(color: [u8; 3], tolerance: u8) -> Self {
        Self { color, tolerance }
    }

    /// Whether every channel of `pixel` lies within
    /// `[ref - tolerance, ref + tolerance]` inclusive.
    /// Comparison happens in i16 so `ref - tolerance` never underflows.
    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        let tol = self.tolerance as i16;
        self.color
            .iter()
            .zip(pixel.iter())
            .all(|(&r, &p)| (p as i16 - r as i16).abs() <= tol)
    }
}

/// Bulk classification over a frame; pluggable so the engine can select a
/// scalar or data-parallel implementation at construction time
pub trait MaskKernel: Send + Sync {
    /// Classify every pixel of `frame` against `spec`.
    /// The frame must already be normalized to three channels.
    fn mask(&self, frame: &Frame, spec: &ColorSpec) -> BinaryMask;
}

fn classify_row(row_bits: &mut [bool], row_px: &[u8], channels: usize, spec: &ColorSpec) {
    for (bit, px) in row_bits.iter_mut().zip(row_px.chunks_exact(channels)) {
        *bit = spec.matches([px[0], px[1], px[2]]);
    }
}

/// Straight row-loop kernel
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarKernel;

impl MaskKernel for ScalarKernel {
    fn mask(&self, frame: &Frame, spec: &ColorSpec) -> BinaryMask {
        let (w, h) = (frame.width(), frame.height());
        if w == 0 || h == 0 {
            return BinaryMask::empty(w, h);
        }
        let ch = frame.format().channels();
        let mut bits = vec![false; w as usize * h as usize];
        let stride = w as usize * ch;
        for (row_bits, row_px) in bits
            .chunks_mut(w as usize)
            .zip(frame.data().chunks_exact(stride))
        {
            classify_row(row_bits, row_px, ch, spec);
        }
        BinaryMask::new(w, h, bits)
    }
}

/// Row-parallel kernel on the rayon pool
#[cfg(feature = "parallel")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelKernel;

#[cfg(feature = "parallel")]
impl MaskKernel for ParallelKernel {
    fn mask(&self, frame: &Frame, spec: &ColorSpec) -> BinaryMask {
        use rayon::prelude::*;

        let (w, h) = (frame.width(), frame.height());
        if w == 0 || h == 0 {
            return BinaryMask::empty(w, h);
        }
        let ch = frame.format().channels();
        let mut bits = vec![false; w as usize * h as usize];
        let stride = w as usize * ch;
        bits.par_chunks_mut(w as usize)
            .zip(frame.data().par_chunks(stride))
            .for_each(|(row_bits, row_px)| classify_row(row_bits, row_px, ch, spec));
        BinaryMask::new(w, h, bits)
    }
}

/// Kernel used when the engine is built without an explicit choice:
/// the rayon kernel when compiled in, the scalar kernel otherwise
pub fn default_kernel() -> Box<dyn MaskKernel> {
    #[cfg(feature = "parallel")]
    {
        Box::new(ParallelKernel)
    }
    #[cfg(not(feature = "parallel"))]
    {
        Box::new(ScalarKernel)
    }
}
