//! Frame, region and mask primitives
//!
//! A `Frame` is an owned pixel grid captured from a screen region. It is
//! created once per capture cycle, handed to exactly one worker, analyzed
//! and discarded. `BinaryMask` is the per-frame classification output.

/// Channel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 channels, 8 bits each
    Rgb,
    /// 4 channels, alpha last; normalized away before analysis
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// A rectangular screen region in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Create a region with explicit bounds
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Square region of side `2 * half_side` centered on a display of the
    /// given dimensions
    pub fn centered_on(display_width: u32, display_height: u32, half_side: u32) -> Self {
        let side = half_side * 2;
        Self {
            left: display_width as i32 / 2 - half_side as i32,
            top: display_height as i32 / 2 - half_side as i32,
            width: side,
            height: side,
        }
    }

    /// Whether this region lies entirely within a display of the given size
    pub fn fits_in(&self, display_width: u32, display_height: u32) -> bool {
        self.left >= 0
            && self.top >= 0
            && (self.left as i64 + self.width as i64) <= display_width as i64
            && (self.top as i64 + self.height as i64) <= display_height as i64
    }
}

/// An owned, immutable-once-captured pixel grid
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    /// Create a frame from packed row-major pixel data
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Packed pixel data, row-major
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Center coordinates, integer division
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// True for zero-size or truncated frames; such frames analyze as
    /// "no detection" rather than erroring
    pub fn is_degenerate(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() < self.width as usize * self.height as usize * self.format.channels()
    }

    /// First three channels of the pixel at (x, y), if in bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let ch = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * ch;
        self.data
            .get(idx..idx + 3)
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Normalize to exactly three channels, dropping alpha if present.
    /// No-op for frames already in `Rgb`.
    pub fn into_rgb(self) -> Frame {
        match self.format {
            PixelFormat::Rgb => self,
            PixelFormat::Rgba => {
                let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
                for px in self.data.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
                Frame::new(self.width, self.height, PixelFormat::Rgb, rgb)
            }
        }
    }

    /// Copy out a sub-rectangle. Returns `None` when the rectangle does not
    /// lie entirely within the frame.
    pub fn crop(&self, left: u32, top: u32, width: u32, height: u32) -> Option<Frame> {
        if left as u64 + width as u64 > self.width as u64
            || top as u64 + height as u64 > self.height as u64
            || self.is_degenerate()
        {
            return None;
        }
        let ch = self.format.channels();
        let src_stride = self.width as usize * ch;
        let row_bytes = width as usize * ch;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in top..top + height {
            let start = row as usize * src_stride + left as usize * ch;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Some(Frame::new(width, height, self.format, data))
    }
}

/// Per-pixel boolean grid derived from one frame; never mutated after
/// creation
#[derive(Debug, Clone)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    /// Create a mask from row-major bits
    pub fn new(width: u32, height: u32, bits: Vec<bool>) -> Self {
        Self {
            width,
            height,
            bits,
        }
    }

    /// All-false mask of the given size
    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![false; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bit at signed coordinates; false anywhere out of bounds
    pub fn hit(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Whether any bit is set inside the inclusive rectangle
    /// `[x0, x1] x [y0, y1]`, clipped to the mask bounds
    pub fn any_in_rect(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        let x_lo = x0.max(0) as usize;
        let y_lo = y0.max(0) as usize;
        let x_hi = x1.min(self.width as i64 - 1);
        let y_hi = y1.min(self.height as i64 - 1);
        if x_hi < x_lo as i64 || y_hi < y_lo as i64 {
            return false;
        }
        let w = self.width as usize;
        for y in y_lo..=y_hi as usize {
            let row = &self.bits[y * w..(y + 1) * w];
            if row[x_lo..=x_hi as usize].iter().any(|&b| b) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, format: PixelFormat, px: &[u8]) -> Frame {
        let mut data = Vec::new();
        for _ in 0..width * height {
            data.extend_from_slice(px);
        }
        Frame::new(width, height, format, data)
    }

    #[test]
    fn test_region_centered_on() {
        let region = Region::centered_on(1920, 1080, 50);
        assert_eq!(region.left, 910);
        assert_eq!(region.top, 490);
        assert_eq!(region.width, 100);
        assert_eq!(region.height, 100);
        assert!(region.fits_in(1920, 1080));
    }

    #[test]
    fn test_region_fits_in() {
        let region = Region::centered_on(100, 100, 60);
        assert!(!region.fits_in(100, 100));
    }

    #[test]
    fn test_frame_center_integer_division() {
        let frame = solid(9, 7, PixelFormat::Rgb, &[0, 0, 0]);
        assert_eq!(frame.center(), (4, 3));
    }

    #[test]
    fn test_frame_pixel_out_of_bounds() {
        let frame = solid(4, 4, PixelFormat::Rgb, &[1, 2, 3]);
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(frame.pixel(4, 0), None);
        assert_eq!(frame.pixel(0, 4), None);
    }

    #[test]
    fn test_frame_into_rgb_drops_alpha() {
        let frame = solid(3, 2, PixelFormat::Rgba, &[10, 20, 30, 255]);
        let rgb = frame.into_rgb();
        assert_eq!(rgb.format(), PixelFormat::Rgb);
        assert_eq!(rgb.data().len(), 3 * 2 * 3);
        assert_eq!(rgb.pixel(2, 1), Some([10, 20, 30]));
    }

    #[test]
    fn test_frame_degenerate() {
        assert!(Frame::new(0, 5, PixelFormat::Rgb, vec![]).is_degenerate());
        assert!(Frame::new(2, 2, PixelFormat::Rgb, vec![0; 6]).is_degenerate());
        assert!(!Frame::new(2, 2, PixelFormat::Rgb, vec![0; 12]).is_degenerate());
    }

    #[test]
    fn test_frame_crop() {
        let mut data = Vec::new();
        for y in 0u8..4 {
            for x in 0u8..4 {
                data.extend_from_slice(&[x, y, 0]);
            }
        }
        let frame = Frame::new(4, 4, PixelFormat::Rgb, data);
        let sub = frame.crop(1, 2, 2, 2).unwrap();
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.pixel(0, 0), Some([1, 2, 0]));
        assert_eq!(sub.pixel(1, 1), Some([2, 3, 0]));
        assert!(frame.crop(3, 3, 2, 2).is_none());
    }

    #[test]
    fn test_mask_hit_out_of_bounds() {
        let mask = BinaryMask::empty(3, 3);
        assert!(!mask.hit(-1, 0));
        assert!(!mask.hit(0, -1));
        assert!(!mask.hit(3, 0));
        assert!(!mask.hit(0, 3));
    }

    #[test]
    fn test_mask_any_in_rect_clips() {
        let mut bits = vec![false; 100];
        bits[0] = true; // (0, 0)
        let mask = BinaryMask::new(10, 10, bits);
        // Rectangle far larger than the mask must clip, not panic
        assert!(mask.any_in_rect(-100, -100, 100, 100));
        assert!(!mask.any_in_rect(1, 1, 100, 100));
    }

    #[test]
    fn test_mask_any_in_rect_inclusive() {
        let mut bits = vec![false; 25];
        bits[2 * 5 + 4] = true; // (4, 2)
        let mask = BinaryMask::new(5, 5, bits);
        assert!(mask.any_in_rect(4, 2, 4, 2));
        assert!(!mask.any_in_rect(0, 0, 3, 4));
    }
}
