//! Per-frame analysis
//!
//! Orchestrates one frame's evaluation: normalize, classify, test the
//! center zone and crosshair pixel, cast the three ray fans, combine into
//! the fire decision.

use super::classify::{ColorSpec, MaskKernel};
use super::rays::{cast_rays, RayFans};
use crate::config::EngineConfig;
use crate::frame::Frame;

/// Immutable per-frame detection output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub up_hit: bool,
    pub right_hit: bool,
    pub left_hit: bool,
    pub center_hit: bool,
    /// Independent single-pixel color check at the exact center
    pub crosshair_hit: bool,
    /// `center_hit || (up_hit && right_hit && left_hit)`
    pub fire: bool,
}

impl DetectionResult {
    /// The all-false result used for degenerate frames
    pub fn none() -> Self {
        Self::default()
    }
}

/// Evaluates frames against the active configuration and ray geometry.
/// Stateless apart from the kernel choice, so one analyzer is shared by
/// every worker.
pub struct FrameAnalyzer {
    kernel: Box<dyn MaskKernel>,
}

impl FrameAnalyzer {
    pub fn new(kernel: Box<dyn MaskKernel>) -> Self {
        Self { kernel }
    }

    /// Analyze one frame. A zero-size or truncated frame yields
    /// `DetectionResult::none()`; a single bad frame never halts the
    /// pipeline.
    pub fn analyze(&self, frame: Frame, config: &EngineConfig, fans: &RayFans) -> DetectionResult {
        if frame.is_degenerate() {
            return DetectionResult::none();
        }
        let frame = frame.into_rgb();
        let (cx, cy) = frame.center();

        let target = ColorSpec::new(config.target_color, config.target_color_tolerance);
        let mask = self.kernel.mask(&frame, &target);

        let z = config.center_zone_size as i64;
        let center_hit = mask.any_in_rect(
            cx as i64 - z,
            cy as i64 - z,
            cx as i64 + z,
            cy as i64 + z,
        );

        let crosshair = ColorSpec::new(config.crosshair_color, config.crosshair_color_tolerance);
        let crosshair_hit = frame
            .pixel(cx, cy)
            .map(|px| crosshair.matches(px))
            .unwrap_or(false);

        let up_hit = any_hit(&mask, cx, cy, &fans.up, config.max_ray_distance);
        let right_hit = any_hit(&mask, cx, cy, &fans.right, config.max_ray_distance);
        let left_hit = any_hit(&mask, cx, cy, &fans.left, config.max_ray_distance);

        let fire = center_hit || (up_hit && right_hit && left_hit);

        DetectionResult {
            up_hit,
            right_hit,
            left_hit,
            center_hit,
            crosshair_hit,
            fire,
        }
    }
}

fn any_hit(
    mask: &crate::frame::BinaryMask,
    cx: u32,
    cy: u32,
    fan: &[(f32, f32)],
    max_distance: u32,
) -> bool {
    cast_rays(mask, cx, cy, fan, max_distance)
        .iter()
        .any(|&h| h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::classify::ScalarKernel;
    use crate::frame::PixelFormat;

    const TARGET: [u8; 3] = [252, 60, 250];
    const CROSSHAIR: [u8; 3] = [65, 255, 0];

    fn analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(Box::new(ScalarKernel))
    }

    fn blank_frame(width: u32, height: u32) -> Frame {
        Frame::new(
            width,
            height,
            PixelFormat::Rgb,
            vec![0; width as usize * height as usize * 3],
        )
    }

    fn paint(frame: &mut Frame, x: u32, y: u32, color: [u8; 3]) {
        let idx = (y as usize * frame.width() as usize + x as usize) * 3;
        let mut data = frame.data().to_vec();
        data[idx..idx + 3].copy_from_slice(&color);
        *frame = Frame::new(frame.width(), frame.height(), PixelFormat::Rgb, data);
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn fans(cfg: &EngineConfig) -> RayFans {
        RayFans::build(cfg.ray_angle_spread, cfg.rays_per_direction)
    }

    #[test]
    fn test_degenerate_frame_is_no_detection() {
        let cfg = config();
        let fans = fans(&cfg);
        let result = analyzer().analyze(Frame::new(0, 0, PixelFormat::Rgb, vec![]), &cfg, &fans);
        assert_eq!(result, DetectionResult::none());

        let truncated = Frame::new(8, 8, PixelFormat::Rgb, vec![0; 10]);
        let result = analyzer().analyze(truncated, &cfg, &fans);
        assert_eq!(result, DetectionResult::none());
    }

    #[test]
    fn test_center_hit_fires() {
        let cfg = config();
        let fans = fans(&cfg);
        let mut frame = blank_frame(40, 40);
        paint(&mut frame, 21, 20, TARGET); // inside the center zone (z = 3)
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(result.center_hit);
        assert!(result.fire);
    }

    #[test]
    fn test_three_way_corroboration_fires() {
        let cfg = config();
        let fans = fans(&cfg);
        let mut frame = blank_frame(60, 60);
        // Target pixels up, right and left of center, outside the center
        // zone but within ray reach
        paint(&mut frame, 30, 20, TARGET);
        paint(&mut frame, 40, 30, TARGET);
        paint(&mut frame, 20, 30, TARGET);
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(!result.center_hit);
        assert!(result.up_hit && result.right_hit && result.left_hit);
        assert!(result.fire);
    }

    #[test]
    fn test_two_of_three_does_not_fire() {
        let cfg = config();
        let fans = fans(&cfg);
        let mut frame = blank_frame(60, 60);
        paint(&mut frame, 30, 20, TARGET); // up
        paint(&mut frame, 20, 30, TARGET); // left, no right
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(result.up_hit && result.left_hit && !result.right_hit);
        assert!(!result.fire);
    }

    #[test]
    fn test_empty_scene_does_not_fire() {
        let cfg = config();
        let fans = fans(&cfg);
        let result = analyzer().analyze(blank_frame(60, 60), &cfg, &fans);
        assert_eq!(result, DetectionResult::none());
    }

    #[test]
    fn test_center_zone_clips_to_small_frame() {
        let mut cfg = config();
        cfg.center_zone_size = 100; // far larger than the frame
        let fans = fans(&cfg);
        let mut frame = blank_frame(10, 10);
        paint(&mut frame, 0, 0, TARGET);
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(result.center_hit);
        assert!(result.fire);
    }

    #[test]
    fn test_crosshair_check_is_independent_of_target_mask() {
        let cfg = config();
        let fans = fans(&cfg);
        let mut frame = blank_frame(40, 40);
        paint(&mut frame, 20, 20, CROSSHAIR);
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(result.crosshair_hit);
        // Crosshair color is not the target color, so nothing else trips
        assert!(!result.center_hit);
        assert!(!result.fire);
    }

    #[test]
    fn test_rgba_frame_normalized_before_analysis() {
        let cfg = config();
        let fans = fans(&cfg);
        let mut data = vec![0u8; 40 * 40 * 4];
        let idx = (20 * 40 + 20) * 4;
        data[idx..idx + 4].copy_from_slice(&[TARGET[0], TARGET[1], TARGET[2], 255]);
        let frame = Frame::new(40, 40, PixelFormat::Rgba, data);
        let result = analyzer().analyze(frame, &cfg, &fans);
        assert!(result.center_hit);
        assert!(result.fire);
    }

    #[test]
    fn test_fire_truth_table() {
        // (center, up, right, left) -> fire
        let cases = [
            (false, false, false, false, false),
            (true, false, false, false, true),
            (false, true, true, true, true),
            (false, true, false, true, false),
        ];
        for (center, up, right, left, fire) in cases {
            assert_eq!(center || (up && right && left), fire);
        }
    }
}
