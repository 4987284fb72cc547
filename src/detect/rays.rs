//! Ray fan geometry and ray casting
//!
//! Three fans of unit direction vectors (up, right, left) are precomputed
//! from configuration and rebuilt only when configuration changes. Casting
//! steps outward from the frame center and records the first mask hit per
//! direction.

use crate::frame::BinaryMask;

/// Anchor angles in degrees for the three fans
const UP_ANCHOR_DEG: f32 = -90.0;
const RIGHT_ANCHOR_DEG: f32 = 0.0;
const LEFT_ANCHOR_DEG: f32 = 180.0;

/// Unit direction vector in screen space
pub type RayDirection = (f32, f32);

/// Precomputed direction vectors for the three named fans
#[derive(Debug, Clone, PartialEq)]
pub struct RayFans {
    pub up: Vec<RayDirection>,
    pub right: Vec<RayDirection>,
    pub left: Vec<RayDirection>,
}

impl RayFans {
    /// Build all three fans. Each fan holds exactly `rays_per_direction`
    /// vectors at angles `linspace(-spread, +spread, rays_per_direction)`
    /// degrees offset from its anchor. A single-ray fan sits exactly on the
    /// anchor (zero offset).
    pub fn build(spread_deg: f32, rays_per_direction: u32) -> Self {
        let offsets = spread_offsets(spread_deg, rays_per_direction);
        Self {
            up: fan(UP_ANCHOR_DEG, &offsets),
            right: fan(RIGHT_ANCHOR_DEG, &offsets),
            left: fan(LEFT_ANCHOR_DEG, &offsets),
        }
    }
}

fn fan(anchor_deg: f32, offsets: &[f32]) -> Vec<RayDirection> {
    offsets
        .iter()
        .map(|off| {
            let rad = (anchor_deg + off).to_radians();
            (rad.cos(), rad.sin())
        })
        .collect()
}

fn spread_offsets(spread_deg: f32, count: u32) -> Vec<f32> {
    if count <= 1 {
        return vec![0.0];
    }
    let step = 2.0 * spread_deg / (count - 1) as f32;
    (0..count).map(|i| -spread_deg + step * i as f32).collect()
}

/// Cast one ray, probing integer coordinates from step 1 through
/// `max_distance` inclusive. Step coordinates use nearest-integer rounding.
/// Returns true on the first probe that reports a hit (short-circuit).
///
/// The probe sees raw signed coordinates; out-of-bounds probes simply
/// return false, so a ray may leave the mask and re-enter it.
pub fn cast_ray_with(
    cx: u32,
    cy: u32,
    direction: RayDirection,
    max_distance: u32,
    mut probe: impl FnMut(i64, i64) -> bool,
) -> bool {
    let (dx, dy) = direction;
    for step in 1..=max_distance {
        let x = (cx as f32 + dx * step as f32).round() as i64;
        let y = (cy as f32 + dy * step as f32).round() as i64;
        if probe(x, y) {
            return true;
        }
    }
    false
}

/// Cast a whole fan against a mask. Directions are independent; no state is
/// shared between them.
pub fn cast_rays(
    mask: &BinaryMask,
    cx: u32,
    cy: u32,
    directions: &[RayDirection],
    max_distance: u32,
) -> Vec<bool> {
    directions
        .iter()
        .map(|&dir| cast_ray_with(cx, cy, dir, max_distance, |x, y| mask.hit(x, y)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_single_ray_sits_on_anchor() {
        let fans = RayFans::build(30.0, 1);
        assert_eq!(fans.up.len(), 1);
        assert_eq!(fans.right.len(), 1);
        assert_eq!(fans.left.len(), 1);
        let (ux, uy) = fans.up[0];
        assert!((ux - 0.0).abs() < EPS && (uy - -1.0).abs() < EPS);
        let (rx, ry) = fans.right[0];
        assert!((rx - 1.0).abs() < EPS && (ry - 0.0).abs() < EPS);
        let (lx, ly) = fans.left[0];
        assert!((lx - -1.0).abs() < EPS && (ly - 0.0).abs() < EPS);
    }

    #[test]
    fn test_fan_counts_and_unit_length() {
        let fans = RayFans::build(30.0, 5);
        for group in [&fans.up, &fans.right, &fans.left] {
            assert_eq!(group.len(), 5);
            for &(dx, dy) in group {
                let norm = (dx * dx + dy * dy).sqrt();
                assert!((norm - 1.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_fan_spread_endpoints() {
        let fans = RayFans::build(30.0, 3);
        // Right fan: -30, 0, +30 degrees
        let (dx, dy) = fans.right[0];
        assert!((dx - 30f32.to_radians().cos()).abs() < EPS);
        assert!((dy - (-30f32).to_radians().sin()).abs() < EPS);
        let (dx, dy) = fans.right[2];
        assert!((dx - 30f32.to_radians().cos()).abs() < EPS);
        assert!((dy - 30f32.to_radians().sin()).abs() < EPS);
    }

    #[test]
    fn test_first_hit_short_circuits() {
        // True pixels at distances 3 and 7 along the +x ray; the cast must
        // stop at 3, observed through the probe count
        let mut bits = vec![false; 20 * 20];
        bits[10 * 20 + 13] = true; // distance 3 from (10, 10)
        bits[10 * 20 + 17] = true; // distance 7
        let mask = BinaryMask::new(20, 20, bits);

        let probes = Cell::new(0u32);
        let hit = cast_ray_with(10, 10, (1.0, 0.0), 50, |x, y| {
            probes.set(probes.get() + 1);
            mask.hit(x, y)
        });
        assert!(hit);
        assert_eq!(probes.get(), 3);
    }

    #[test]
    fn test_no_hit_beyond_max_distance() {
        let mut bits = vec![false; 20 * 20];
        bits[10 * 20 + 16] = true; // distance 6
        let mask = BinaryMask::new(20, 20, bits);
        assert!(!cast_ray_with(10, 10, (1.0, 0.0), 5, |x, y| mask.hit(x, y)));
        assert!(cast_ray_with(10, 10, (1.0, 0.0), 6, |x, y| mask.hit(x, y)));
    }

    #[test]
    fn test_ray_leaving_bounds_records_no_hit() {
        // All-true mask, but the ray exits past the left edge immediately
        let mask = BinaryMask::new(4, 4, vec![true; 16]);
        let hit = cast_ray_with(0, 2, (-1.0, 0.0), 50, |x, y| mask.hit(x, y));
        assert!(!hit);
    }

    #[test]
    fn test_cast_rays_per_direction_results() {
        let mut bits = vec![false; 9 * 9];
        bits[4 * 9 + 7] = true; // right of center (4, 4)
        let mask = BinaryMask::new(9, 9, bits);
        let dirs = [(1.0, 0.0), (-1.0, 0.0), (0.0, -1.0)];
        let hits = cast_rays(&mask, 4, 4, &dirs, 10);
        assert_eq!(hits, vec![true, false, false]);
    }
}
