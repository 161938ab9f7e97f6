#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weapon model: towers, the projectiles they launch, and one-shot traps.
//!
//! Weapons only see agents through [`Hostile`], so the agent model is free to
//! store movement state however it likes.

use hive_defence_core::{
    AgentId, CellCoord, Hostile, StructureKind, TowerId, TowerSpec, TrapSpec, UpgradeSpec,
    UpgradeTrack, Vec2,
};
use hive_defence_system_tower_targeting::{nearest_in_range, Aim};

/// Projectile geometry shared by every tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ballistics {
    /// Distance from the tower centre at which projectiles appear.
    pub muzzle_offset: f32,
    /// Collision radius of a projectile.
    pub projectile_radius: f32,
}

/// Player-built weapon occupying one blocked cell.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    kind: StructureKind,
    cell: CellCoord,
    position: Vec2,
    range: f32,
    fire_interval: f32,
    damage: f32,
    projectile_speed: f32,
    cooldown: f32,
    aim: Aim,
    damage_tier: u32,
    fire_rate_tier: u32,
    invested: u32,
}

impl Tower {
    /// Creates a ready-to-fire tower centred on `position`.
    #[must_use]
    pub fn new(
        id: TowerId,
        kind: StructureKind,
        cell: CellCoord,
        position: Vec2,
        spec: &TowerSpec,
        cost: u32,
    ) -> Self {
        Self {
            id,
            kind,
            cell,
            position,
            range: spec.range,
            fire_interval: spec.fire_interval,
            damage: spec.damage,
            projectile_speed: spec.projectile_speed,
            cooldown: 0.0,
            aim: Aim::new(spec.turn_rate),
            damage_tier: 1,
            fire_rate_tier: 1,
            invested: cost,
        }
    }

    /// Identifier of the tower.
    #[must_use]
    pub fn id(&self) -> TowerId {
        self.id
    }

    /// Kind of tower.
    #[must_use]
    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Cell the tower occupies.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Centre of the tower in world units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Targeting radius.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.range
    }

    /// Seconds between shots.
    #[must_use]
    pub fn fire_interval(&self) -> f32 {
        self.fire_interval
    }

    /// Damage carried by each projectile.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Turret facing in radians.
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.aim.angle()
    }

    /// Seconds until the next shot is allowed.
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Scrap spent on building and upgrading the tower.
    #[must_use]
    pub fn invested(&self) -> u32 {
        self.invested
    }

    /// Current tier on an upgrade track; every track starts at 1.
    #[must_use]
    pub fn tier(&self, track: UpgradeTrack) -> u32 {
        match track {
            UpgradeTrack::Damage => self.damage_tier,
            UpgradeTrack::FireRate => self.fire_rate_tier,
        }
    }

    /// Buys one tier on `track`, returning the tier reached.
    ///
    /// Callers validate the tier cap and currency beforehand.
    pub fn upgrade(&mut self, track: UpgradeTrack, spec: &UpgradeSpec, cost: u32) -> u32 {
        self.invested = self.invested.saturating_add(cost);
        match track {
            UpgradeTrack::Damage => {
                self.damage += spec.damage_step;
                self.damage_tier += 1;
                self.damage_tier
            }
            UpgradeTrack::FireRate => {
                self.fire_interval =
                    (self.fire_interval * spec.fire_interval_factor).max(spec.min_fire_interval);
                self.fire_rate_tier += 1;
                self.fire_rate_tier
            }
        }
    }

    /// Advances the tower by `dt` seconds.
    ///
    /// The tower tracks the nearest live agent in range every tick and, once
    /// its cooldown has elapsed, launches a projectile from its current facing
    /// whether or not the turret has finished turning. Returns the targeted
    /// agent when a projectile was launched.
    pub fn update<T: Hostile>(
        &mut self,
        dt: f32,
        agents: &[T],
        ballistics: Ballistics,
        out: &mut Vec<Projectile>,
    ) -> Option<AgentId> {
        self.cooldown = (self.cooldown - dt).max(0.0);

        let target = agents.get(nearest_in_range(self.position, self.range, agents)?)?;
        self.aim.track(self.position, target.position(), dt);

        if self.cooldown > 0.0 {
            return None;
        }

        out.push(Projectile::new(
            self.id,
            target.id(),
            self.aim.muzzle(self.position, ballistics.muzzle_offset),
            self.projectile_speed,
            self.damage,
            ballistics.projectile_radius,
        ));
        self.cooldown = self.fire_interval;
        Some(target.id())
    }
}

/// Result of advancing a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Impact {
    /// Still travelling toward its target.
    InFlight,
    /// Target vanished or was already destroyed; no damage was dealt.
    Missed,
    /// Damage was applied to the target.
    Hit {
        /// Agent that was struck.
        agent: AgentId,
        /// Whether this hit destroyed the agent.
        killed: bool,
    },
    /// The projectile had already resolved earlier.
    Spent,
}

/// Homing shot that strikes one agent at most once.
#[derive(Clone, Debug)]
pub struct Projectile {
    source: TowerId,
    target: AgentId,
    position: Vec2,
    speed: f32,
    damage: f32,
    radius: f32,
    spent: bool,
}

impl Projectile {
    /// Creates a projectile at `position` homing on `target`.
    #[must_use]
    pub fn new(
        source: TowerId,
        target: AgentId,
        position: Vec2,
        speed: f32,
        damage: f32,
        radius: f32,
    ) -> Self {
        Self {
            source,
            target,
            position,
            speed,
            damage,
            radius,
            spent: false,
        }
    }

    /// Tower that launched the projectile.
    #[must_use]
    pub fn source(&self) -> TowerId {
        self.source
    }

    /// Agent the projectile homes on.
    #[must_use]
    pub fn target(&self) -> AgentId {
        self.target
    }

    /// Current position in world units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Reports whether the projectile resolved and awaits removal.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Moves toward the target and resolves contact.
    ///
    /// Contact is judged on the distance measured before this tick's move.
    pub fn update<T: Hostile>(&mut self, dt: f32, agents: &mut [T]) -> Impact {
        if self.spent {
            return Impact::Spent;
        }

        let Some(target) = agents
            .iter_mut()
            .find(|agent| agent.id() == self.target && !agent.is_destroyed())
        else {
            self.spent = true;
            return Impact::Missed;
        };

        let offset = target.position() - self.position;
        let distance = match offset.length() {
            length if length > 0.0 => length,
            _ => 1.0,
        };
        self.position += offset * (self.speed * dt / distance);

        if distance < self.radius + target.radius() {
            self.spent = true;
            let killed = target.apply_damage(self.damage);
            return Impact::Hit {
                agent: target.id(),
                killed,
            };
        }
        Impact::InFlight
    }
}

/// Outcome of a trap catching an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapHit {
    /// Agent that triggered the trap.
    pub agent: AgentId,
    /// Whether the trap's damage destroyed the agent.
    pub killed: bool,
}

/// Non-blocking single-use trap.
#[derive(Clone, Debug)]
pub struct Trap {
    cell: CellCoord,
    position: Vec2,
    radius: f32,
    damage: f32,
    slow_factor: f32,
    slow_duration: f32,
    used: bool,
}

impl Trap {
    /// Arms a trap centred on `position`.
    #[must_use]
    pub fn new(cell: CellCoord, position: Vec2, spec: &TrapSpec) -> Self {
        Self {
            cell,
            position,
            radius: spec.radius,
            damage: spec.damage,
            slow_factor: spec.slow_factor,
            slow_duration: spec.slow_duration,
            used: false,
        }
    }

    /// Cell the trap sits on.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Centre of the trap in world units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Reports whether the trap already fired.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Fires on the first live agent within the trigger radius.
    ///
    /// A trap fires at most once over its lifetime.
    pub fn resolve<T: Hostile>(&mut self, agents: &mut [T]) -> Option<TrapHit> {
        if self.used {
            return None;
        }
        let victim = agents.iter_mut().find(|agent| {
            !agent.is_destroyed() && agent.position().distance(self.position) <= self.radius
        })?;

        self.used = true;
        let killed = victim.apply_damage(self.damage);
        victim.apply_slow(self.slow_factor, self.slow_duration);
        tracing::debug!(cell = ?self.cell, agent = victim.id().get(), killed, "trap triggered");
        Some(TrapHit {
            agent: victim.id(),
            killed,
        })
    }
}
