//! Closed-form launch solver for thrown projectiles
//!
//! Gravity acts along -Y. All solvers are non-iterative and never produce NaN:
//! straight-vertical throws, unreachable heights and zero gravity are clamped
//! rather than reported.

use glam::Vec3;

use crate::horizontal;

/// Gravity below this is treated as this (avoids division by zero)
const MIN_GRAVITY: f32 = 1e-3;
/// Smallest upward launch speed the solver will use
const MIN_VERTICAL_SPEED: f32 = 0.5;

/// A solved launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallisticSolution {
    pub velocity: Vec3,
    /// Seconds from launch until the projectile reaches the target
    pub flight_time: f32,
}

/// Launch velocity that lands on `target`, given the desired vertical launch speed
pub fn solve(start: Vec3, target: Vec3, vertical_launch_speed: f32, gravity: f32) -> Vec3 {
    solve_with_time(start, target, vertical_launch_speed, gravity).velocity
}

/// Like [`solve`], also returning the flight time
///
/// The projectile leaves with `vertical_launch_speed` upward and meets the
/// target height on the descending branch. A vertical speed too small to
/// reach the target height is raised to the apex speed.
pub fn solve_with_time(
    start: Vec3,
    target: Vec3,
    vertical_launch_speed: f32,
    gravity: f32,
) -> BallisticSolution {
    let g = effective_gravity(gravity);
    let delta = target - start;
    let dy = delta.y;

    let apex_speed = (2.0 * g * dy.max(0.0)).sqrt();
    let vy = vertical_launch_speed.max(apex_speed).max(MIN_VERTICAL_SPEED);

    // vy² >= 2g·dy holds after the clamp above
    let discriminant = (vy * vy - 2.0 * g * dy).max(0.0);
    let flight_time = (vy + discriminant.sqrt()) / g;

    let velocity = horizontal(delta) / flight_time + Vec3::Y * vy;
    BallisticSolution {
        velocity,
        flight_time,
    }
}

/// Minimum-energy arc to `target` (no launch speed given)
///
/// With `s = |target - start|` the flight time satisfies `T² = 2(s + Δy) / g`.
/// Targets directly above or below fall back to a vertical throw.
pub fn solve_lob(start: Vec3, target: Vec3, gravity: f32) -> BallisticSolution {
    let g = effective_gravity(gravity);
    let delta = target - start;
    let dy = delta.y;
    let flat = horizontal(delta);
    let horiz = flat.length();

    if horiz < 1e-4 {
        log::debug!("Vertical lob ({:.2} up), using straight throw", dy);
        return solve_with_time(start, target, 0.0, g);
    }

    let s = (dy * dy + horiz * horiz).sqrt();
    let t_squared = 2.0 * (s + dy) / g;
    let flight_time = t_squared.sqrt();

    let vertical_speed = (dy + 0.5 * g * t_squared) / flight_time;
    BallisticSolution {
        velocity: flat / flight_time + Vec3::Y * vertical_speed,
        flight_time,
    }
}

/// Analytic position along a ballistic path after `t` seconds
#[inline]
pub fn position_at(start: Vec3, velocity: Vec3, gravity: f32, t: f32) -> Vec3 {
    start + velocity * t - Vec3::Y * (0.5 * gravity * t * t)
}

/// Sample points along a path (for aim previews)
pub fn trajectory_points(
    start: Vec3,
    velocity: Vec3,
    gravity: f32,
    duration: f32,
    count: usize,
) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = duration * i as f32 / (count - 1).max(1) as f32;
            position_at(start, velocity, gravity, t)
        })
        .collect()
}

#[inline]
fn effective_gravity(gravity: f32) -> f32 {
    if gravity.is_finite() {
        gravity.max(MIN_GRAVITY)
    } else {
        MIN_GRAVITY
    }
}
