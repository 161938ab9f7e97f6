#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Target acquisition and turret orientation for towers.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use hive_defence_core::{Hostile, Vec2};

/// Index of the nearest live agent within `range` of `origin`.
///
/// Ties keep the agent that appears first in `agents`.
#[must_use]
pub fn nearest_in_range<T: Hostile>(origin: Vec2, range: f32, agents: &[T]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, agent) in agents.iter().enumerate() {
        if agent.is_destroyed() {
            continue;
        }
        let distance = agent.position().distance(origin);
        if distance > range {
            continue;
        }
        if best.map_or(true, |(_, closest)| distance < closest) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Wraps an angle in radians into `(-π, π]`.
#[must_use]
pub fn normalize_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Turret facing that rotates toward targets at a bounded rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aim {
    angle: f32,
    turn_rate: f32,
}

impl Aim {
    /// Facing of a freshly built turret: straight up the screen.
    pub const INITIAL_ANGLE: f32 = -FRAC_PI_2;

    /// Creates a turret facing [`Aim::INITIAL_ANGLE`] that turns `turn_rate` radians per second.
    #[must_use]
    pub const fn new(turn_rate: f32) -> Self {
        Self {
            angle: Self::INITIAL_ANGLE,
            turn_rate,
        }
    }

    /// Current facing in radians.
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle
    }

    /// Rotates toward `target` along the shorter arc, by at most `turn_rate * dt`.
    pub fn track(&mut self, origin: Vec2, target: Vec2, dt: f32) {
        let offset = target - origin;
        let desired = offset.y.atan2(offset.x);
        let delta = normalize_angle(desired - self.angle);
        let max_step = self.turn_rate * dt;
        let step = delta.clamp(-max_step, max_step);
        self.angle = normalize_angle(self.angle + step);
    }

    /// Point `offset` units from `origin` along the current facing.
    #[must_use]
    pub fn muzzle(&self, origin: Vec2, offset: f32) -> Vec2 {
        origin + Vec2::from_angle(self.angle) * offset
    }
}
