#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn cadence, wave quotas and insect class selection.

use std::time::Duration;

use hive_defence_core::{InsectClass, Presets};
use rand::Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence.
    #[must_use]
    pub const fn new(spawn_interval: Duration) -> Self {
        Self { spawn_interval }
    }
}

/// Tracks the spawn timer and the agents still owed by the current wave.
#[derive(Clone, Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    timer: Duration,
    queue: u32,
    total: u32,
}

impl Spawning {
    /// Creates a new spawning system with an empty queue.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            timer: Duration::ZERO,
            queue: 0,
            total: 0,
        }
    }

    /// Queues `quota` agents for a new wave.
    pub fn load_wave(&mut self, quota: u32) {
        self.queue = quota;
        self.total = quota;
    }

    /// Clears the queue and the timer.
    pub fn reset(&mut self) {
        self.timer = Duration::ZERO;
        self.queue = 0;
        self.total = 0;
    }

    /// Advances the spawn timer, returning `true` when one agent is due.
    ///
    /// The timer keeps running while the queue is empty and restarts from
    /// zero on every spawn, so at most one agent spawns per tick.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.timer = self.timer.saturating_add(dt);
        if self.queue == 0 || self.timer < self.spawn_interval {
            return false;
        }
        self.timer = Duration::ZERO;
        self.queue -= 1;
        true
    }

    /// Agents of the current wave not yet spawned.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.queue
    }

    /// Agents queued when the current wave started.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Fraction of the wave resolved, given the number of live agents.
    #[must_use]
    pub fn progress(&self, live_agents: usize) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        let live = u32::try_from(live_agents).unwrap_or(u32::MAX);
        let remaining = self.queue.saturating_add(live);
        let done = self.total.saturating_sub(remaining);
        (done as f32 / self.total as f32).clamp(0.0, 1.0)
    }
}

/// Number of agents in `wave`: `floor((6 + 3 × wave) × multiplier)`.
#[must_use]
pub fn wave_quota(wave: u32, wave_multiplier: f32) -> u32 {
    let base = 6.0 + wave as f32 * 3.0;
    let quota = (base * wave_multiplier).floor();
    if quota <= 0.0 {
        0
    } else {
        quota as u32
    }
}

/// Draws a species uniformly from those unlocked on `wave`.
///
/// Falls back to the first species in the table when none is unlocked yet.
pub fn choose_class<'a, R: Rng + ?Sized>(
    presets: &'a Presets,
    wave: u32,
    rng: &mut R,
) -> Option<&'a InsectClass> {
    let unlocked = presets.unlocked(wave).count();
    if unlocked == 0 {
        return presets.insects.first();
    }
    let pick = rng.gen_range(0..unlocked);
    presets.unlocked(wave).nth(pick)
}
