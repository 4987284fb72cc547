//! Frame acquisition seam
//!
//! The pipeline is parameterized by a `FrameSource` so the same engine runs
//! against an OS capture backend, an in-memory buffer or a recorded frame
//! sequence. Sources are created through a factory each time the pipeline
//! starts; a grab failure is transient and retried, never fatal.

use crate::frame::{Frame, Region};
use crate::{EngineError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// One screen-like pixel provider
pub trait FrameSource: Send {
    /// Pixel dimensions of the display this source captures from
    fn display_size(&self) -> (u32, u32);

    /// Grab one frame covering `region`. Errors are treated as transient by
    /// the capture loop.
    fn grab(&mut self, region: &Region) -> Result<Frame>;
}

/// Creates a fresh source each time the pipeline (re)starts
pub type SourceFactory = Arc<dyn Fn() -> Result<Box<dyn FrameSource>> + Send + Sync>;

/// Frame source backed by a shared in-memory screen buffer. The embedder
/// keeps a clone and swaps new screen content in with `store`; the capture
/// thread crops the requested region out of the latest buffer.
#[derive(Clone)]
pub struct BufferSource {
    screen: Arc<Mutex<Frame>>,
}

impl BufferSource {
    pub fn new(screen: Frame) -> Self {
        Self {
            screen: Arc::new(Mutex::new(screen)),
        }
    }

    /// Replace the screen content
    pub fn store(&self, screen: Frame) {
        *self.screen.lock() = screen;
    }
}

impl FrameSource for BufferSource {
    fn display_size(&self) -> (u32, u32) {
        let screen = self.screen.lock();
        (screen.width(), screen.height())
    }

    fn grab(&mut self, region: &Region) -> Result<Frame> {
        let screen = self.screen.lock();
        if region.left < 0 || region.top < 0 {
            return Err(EngineError::Source(format!(
                "capture region {:?} extends past the display edge",
                region
            )));
        }
        screen
            .crop(region.left as u32, region.top as u32, region.width, region.height)
            .ok_or_else(|| {
                EngineError::Source(format!(
                    "capture region {:?} does not fit a {}x{} display",
                    region,
                    screen.width(),
                    screen.height()
                ))
            })
    }
}

/// Frame source that plays back a directory of image files in name order,
/// optionally looping. Useful for offline tuning against recorded footage.
#[cfg(feature = "sequence-capture")]
pub struct SequenceSource {
    paths: Vec<std::path::PathBuf>,
    index: usize,
    looped: bool,
    display: (u32, u32),
}

#[cfg(feature = "sequence-capture")]
impl SequenceSource {
    const EXTENSIONS: [&'static str; 4] = ["png", "jpg", "jpeg", "bmp"];

    /// Scan a directory for image files. Display dimensions come from the
    /// first frame; every frame is expected to match.
    pub fn from_directory(dir: &std::path::Path, looped: bool) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| EngineError::Source(format!("cannot read {}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| Self::EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(EngineError::Source(format!(
                "no image files in {}",
                dir.display()
            )));
        }
        let first = Self::decode(&paths[0])?;
        Ok(Self {
            display: (first.width(), first.height()),
            paths,
            index: 0,
            looped,
        })
    }

    fn decode(path: &std::path::Path) -> Result<Frame> {
        let img = image::open(path)
            .map_err(|e| EngineError::Source(format!("decode {}: {}", path.display(), e)))?
            .to_rgb8();
        let (w, h) = img.dimensions();
        Ok(Frame::new(w, h, crate::frame::PixelFormat::Rgb, img.into_raw()))
    }
}

#[cfg(feature = "sequence-capture")]
impl FrameSource for SequenceSource {
    fn display_size(&self) -> (u32, u32) {
        self.display
    }

    fn grab(&mut self, region: &Region) -> Result<Frame> {
        if self.index >= self.paths.len() {
            if self.looped {
                self.index = 0;
            } else {
                return Err(EngineError::Source("frame sequence exhausted".into()));
            }
        }
        let frame = Self::decode(&self.paths[self.index])?;
        self.index += 1;
        if region.left < 0 || region.top < 0 {
            return Err(EngineError::Source(format!(
                "capture region {:?} extends past the display edge",
                region
            )));
        }
        frame
            .crop(region.left as u32, region.top as u32, region.width, region.height)
            .ok_or_else(|| {
                EngineError::Source(format!(
                    "capture region {:?} does not fit frame {}",
                    region,
                    self.paths[self.index - 1].display()
                ))
            })
    }
}
