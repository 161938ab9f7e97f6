//! Tuning values for a run.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{CellCoord, Grid, StructureKind};

/// Every tunable constant the simulation reads.
///
/// Missing fields fall back to [`GameConfig::default`] when deserialised, so a
/// configuration file only needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// World width in world units.
    pub width: f32,
    /// World height in world units.
    pub height: f32,
    /// Side length of a grid cell in world units.
    pub cell_size: f32,
    /// Point where agents enter the grid.
    pub start: Vec2,
    /// Point agents try to reach; the base.
    pub goal: Vec2,
    /// Interior cells blocked on every reset in addition to the border ring.
    pub interior_walls: Vec<CellCoord>,
    /// Prices of player actions.
    pub costs: Costs,
    /// Fraction of cumulative investment returned on sale.
    pub refund_rate: f32,
    /// Seconds between two spawns of the same wave.
    pub spawn_interval: f32,
    /// Agent hit points before wave, difficulty and class scaling.
    pub enemy_base_hp: f32,
    /// Hit points added per wave.
    pub enemy_hp_per_wave: f32,
    /// Agent speed in world units per second before scaling.
    pub enemy_base_speed: f32,
    /// Speed added per wave.
    pub enemy_speed_per_wave: f32,
    /// Agent radius for a class of size `1.0`.
    pub enemy_base_radius: f32,
    /// Distance to the goal point at which an agent counts as arrived.
    pub arrival_radius: f32,
    /// Distance at which a crawling agent considers a waypoint reached.
    pub waypoint_reach: f32,
    /// Maximum per-axis offset applied to interior waypoints of spawn routes.
    pub route_jitter: f32,
    /// Seconds a routeless crawling agent waits between route requests.
    pub route_retry_interval: f32,
    /// Stats of the turret tower.
    #[serde(deserialize_with = "turret_overrides")]
    pub turret: TowerSpec,
    /// Stats of the sniper tower.
    #[serde(deserialize_with = "sniper_overrides")]
    pub sniper: TowerSpec,
    /// Upgrade track tuning shared by all towers.
    pub upgrades: UpgradeSpec,
    /// Trap tuning.
    pub trap: TrapSpec,
    /// Collision radius of projectiles.
    pub projectile_radius: f32,
    /// Distance from the tower centre at which projectiles appear.
    pub muzzle_offset: f32,
    /// Seed of the run's pseudo-random source.
    pub rng_seed: u64,
}

impl GameConfig {
    /// Grid laid over the configured world.
    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.width, self.height, self.cell_size)
    }

    /// Build price of a structure kind.
    #[must_use]
    pub fn structure_cost(&self, kind: StructureKind) -> u32 {
        match kind {
            StructureKind::Turret => self.costs.turret,
            StructureKind::Sniper => self.costs.sniper,
            StructureKind::Wall => self.costs.wall,
        }
    }

    /// Weapon stats of a structure kind; walls carry none.
    #[must_use]
    pub fn tower_spec(&self, kind: StructureKind) -> Option<&TowerSpec> {
        match kind {
            StructureKind::Turret => Some(&self.turret),
            StructureKind::Sniper => Some(&self.sniper),
            StructureKind::Wall => None,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let interior_walls = (2..8)
            .chain(10..16)
            .map(|row| CellCoord::new(8, row))
            .collect();

        Self {
            width: 960.0,
            height: 540.0,
            cell_size: 24.0,
            start: Vec2::new(80.0, 120.0),
            goal: Vec2::new(860.0, 420.0),
            interior_walls,
            costs: Costs::default(),
            refund_rate: 0.6,
            spawn_interval: 0.75,
            enemy_base_hp: 20.0,
            enemy_hp_per_wave: 8.0,
            enemy_base_speed: 65.0,
            enemy_speed_per_wave: 4.0,
            enemy_base_radius: 12.0,
            arrival_radius: 20.0,
            waypoint_reach: 3.0,
            route_jitter: 2.5,
            route_retry_interval: 0.2,
            turret: TowerSpec::turret(),
            sniper: TowerSpec::sniper(),
            upgrades: UpgradeSpec::default(),
            trap: TrapSpec::default(),
            projectile_radius: 5.0,
            muzzle_offset: 16.0,
            rng_seed: 0x5eed_0f_b0_9a_7e,
        }
    }
}

/// Prices of player actions in scrap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Costs {
    /// Turret build price.
    pub turret: u32,
    /// Sniper build price.
    pub sniper: u32,
    /// Wall build price.
    pub wall: u32,
    /// Trap price.
    pub trap: u32,
    /// Price of one upgrade tier.
    pub upgrade: u32,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            turret: 50,
            sniper: 80,
            wall: 20,
            trap: 30,
            upgrade: 70,
        }
    }
}

/// Weapon stats of a tower kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    /// Targeting radius in world units.
    pub range: f32,
    /// Seconds between shots.
    pub fire_interval: f32,
    /// Damage dealt per projectile.
    pub damage: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Maximum turret rotation in radians per second.
    pub turn_rate: f32,
}

impl TowerSpec {
    /// Stock turret: short range, quick fire.
    #[must_use]
    pub fn turret() -> Self {
        Self {
            range: 140.0,
            fire_interval: 0.55,
            damage: 18.0,
            projectile_speed: 460.0,
            turn_rate: PI * 3.0,
        }
    }

    /// Stock sniper: long range, slow and heavy.
    #[must_use]
    pub fn sniper() -> Self {
        Self {
            range: 220.0,
            fire_interval: 1.4,
            damage: 45.0,
            projectile_speed: 720.0,
            turn_rate: PI * 2.0,
        }
    }
}

/// Partial tower table; every omitted stat keeps the stock value of its kind.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TowerOverrides {
    range: Option<f32>,
    fire_interval: Option<f32>,
    damage: Option<f32>,
    projectile_speed: Option<f32>,
    turn_rate: Option<f32>,
}

impl TowerOverrides {
    fn over(self, stock: TowerSpec) -> TowerSpec {
        TowerSpec {
            range: self.range.unwrap_or(stock.range),
            fire_interval: self.fire_interval.unwrap_or(stock.fire_interval),
            damage: self.damage.unwrap_or(stock.damage),
            projectile_speed: self.projectile_speed.unwrap_or(stock.projectile_speed),
            turn_rate: self.turn_rate.unwrap_or(stock.turn_rate),
        }
    }
}

fn turret_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TowerSpec, D::Error> {
    Ok(TowerOverrides::deserialize(deserializer)?.over(TowerSpec::turret()))
}

fn sniper_overrides<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TowerSpec, D::Error> {
    Ok(TowerOverrides::deserialize(deserializer)?.over(TowerSpec::sniper()))
}

/// Tuning of the two upgrade tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeSpec {
    /// Damage added per damage tier.
    pub damage_step: f32,
    /// Factor applied to the fire interval per fire-rate tier.
    pub fire_interval_factor: f32,
    /// Floor under the fire interval.
    pub min_fire_interval: f32,
    /// Highest tier reachable on each track; towers start at tier 1.
    pub max_tier: u32,
}

impl Default for UpgradeSpec {
    fn default() -> Self {
        Self {
            damage_step: 8.0,
            fire_interval_factor: 0.88,
            min_fire_interval: 0.22,
            max_tier: 3,
        }
    }
}

/// Tuning of one-shot traps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapSpec {
    /// Trigger radius in world units.
    pub radius: f32,
    /// Damage dealt when triggered.
    pub damage: f32,
    /// Speed multiplier applied to the victim.
    pub slow_factor: f32,
    /// Seconds the slow lasts.
    pub slow_duration: f32,
}

impl Default for TrapSpec {
    fn default() -> Self {
        Self {
            radius: 26.0,
            damage: 38.0,
            slow_factor: 0.55,
            slow_duration: 2.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_start_and_goal_sit_inside_open_cells() {
        let config = GameConfig::default();
        let grid = config.grid();
        let start = grid.cell_from_point(config.start);
        let goal = grid.cell_from_point(config.goal);
        assert_eq!(start, CellCoord::new(3, 5));
        assert_eq!(goal, CellCoord::new(35, 17));
        assert!(!config.interior_walls.contains(&start));
        assert!(!config.interior_walls.contains(&goal));
        assert!(!grid.border_cells().contains(&goal));
    }

    #[test]
    fn walls_carry_no_weapon() {
        let config = GameConfig::default();
        assert!(config.tower_spec(StructureKind::Wall).is_none());
        assert_eq!(config.structure_cost(StructureKind::Wall), 20);
        assert_eq!(config.structure_cost(StructureKind::Sniper), 80);
    }
}
