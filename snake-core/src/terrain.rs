use crate::grid::{board_capacity, cell_at, in_safe_zone};

const NOISE_LEVEL_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
const NOISE_X_MIX: u64 = 0xBF58_476D_1CE4_E5B9;
const NOISE_Y_MIX: u64 = 0xD6E8_FF3A_5A9C_31F1;
const PROCEDURAL_BASE_LEVEL: u32 = 4;
const PROCEDURAL_BASE_DENSITY: f64 = 0.05;
const PROCEDURAL_DENSITY_PER_LEVEL: f64 = 0.01;
const PROCEDURAL_MAX_DENSITY: f64 = 0.15;

/// Blocked-cell bitmap for a level, row-major over a `board_size` square.
///
/// Level 1 is open, level 2 is a ring with a gap in each side, level 3 is a
/// plus through the center, and later levels scatter hashed obstacles at a
/// density that grows slowly and is capped. The spawn safe zone is always open.
pub fn build_obstacle_map(level: u32, board_size: u32) -> Vec<bool> {
    let size = board_size as i32;
    let mut blocked = vec![false; board_capacity(board_size)];
    for (idx, slot) in blocked.iter_mut().enumerate() {
        let cell = cell_at(idx, size);
        if in_safe_zone(cell, size) {
            continue;
        }
        *slot = match level {
            0 | 1 => false,
            2 => on_ring(cell.x, cell.y, size),
            3 => on_cross(cell.x, cell.y, size),
            _ => terrain_noise(level, cell.x, cell.y) < procedural_density(level),
        };
    }
    blocked
}

fn layout_inset(size: i32) -> i32 {
    size / 6
}

fn on_ring(x: i32, y: i32, size: i32) -> bool {
    let lo = layout_inset(size);
    let hi = size - 1 - lo;
    let mid = size / 2;
    let within = |v: i32| (lo..=hi).contains(&v);
    let in_gap = |v: i32| v == mid || v == mid - 1;

    let on_horizontal_edge = (y == lo || y == hi) && within(x);
    let on_vertical_edge = (x == lo || x == hi) && within(y);
    if on_horizontal_edge && !on_vertical_edge {
        return !in_gap(x);
    }
    if on_vertical_edge && !on_horizontal_edge {
        return !in_gap(y);
    }
    on_horizontal_edge && on_vertical_edge
}

fn on_cross(x: i32, y: i32, size: i32) -> bool {
    let lo = layout_inset(size);
    let hi = size - 1 - lo;
    let mid = size / 2;
    let within = |v: i32| (lo..=hi).contains(&v);
    (y == mid && within(x)) || (x == mid && within(y))
}

pub(crate) fn procedural_density(level: u32) -> f64 {
    let extra = level.saturating_sub(PROCEDURAL_BASE_LEVEL) as f64;
    (PROCEDURAL_BASE_DENSITY + PROCEDURAL_DENSITY_PER_LEVEL * extra).min(PROCEDURAL_MAX_DENSITY)
}

/// Stable hash of `(level, x, y)` mapped to `[0, 1)`.
fn terrain_noise(level: u32, x: i32, y: i32) -> f64 {
    let mut h = u64::from(level).wrapping_mul(NOISE_LEVEL_MIX)
        ^ (x as u32 as u64).wrapping_mul(NOISE_X_MIX)
        ^ (y as u32 as u64).wrapping_mul(NOISE_Y_MIX);
    h ^= h >> 30;
    h = h.wrapping_mul(NOISE_X_MIX);
    h ^= h >> 27;
    h = h.wrapping_mul(NOISE_Y_MIX);
    h ^= h >> 31;
    (h >> 11) as f64 / (1_u64 << 53) as f64
}
