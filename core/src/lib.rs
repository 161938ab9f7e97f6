#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Hive Defence simulation.
//!
//! This crate defines the vocabulary that connects the host adapter, the
//! authoritative run controller, and the pure systems. Hosts submit
//! [`Command`] values describing player actions or elapsed time, the world
//! executes those commands via its `apply` entry point, answers with a
//! [`RejectReason`] when an action is refused, and broadcasts [`Event`] values
//! describing what changed. After every state-affecting command the host
//! receives a read-only [`Snapshot`] through a [`StateObserver`].

mod config;
mod grid;
mod presets;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{Costs, GameConfig, TowerSpec, TrapSpec, UpgradeSpec};
pub use glam::Vec2;
pub use grid::{BlockedCells, CellCoord, Grid, Neighbors, Route};
pub use presets::{
    DifficultyPreset, InsectClass, MissionPreset, Presets, DEFAULT_DIFFICULTY, DEFAULT_MISSION,
};

/// Upper bound applied to the simulated time of a single tick.
pub const MAX_TICK: Duration = Duration::from_millis(50);

/// Commands that express every permissible mutation of a run.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Builds a blocking structure on the cell containing the point.
    PlaceStructure {
        /// Type of structure to construct.
        kind: StructureKind,
        /// World point picked by the player; snapped to its cell.
        point: Vec2,
    },
    /// Arms a one-shot trap on the cell containing the point.
    PlaceTrap {
        /// World point picked by the player; snapped to its cell.
        point: Vec2,
    },
    /// Buys one tier on an upgrade track of the tower at the point.
    Upgrade {
        /// World point identifying the tower's cell.
        point: Vec2,
        /// Track that receives the upgrade.
        track: UpgradeTrack,
    },
    /// Sells the tower or player-built wall at the point.
    Sell {
        /// World point identifying the structure's cell.
        point: Vec2,
    },
    /// Selects a difficulty preset and resets the run.
    SetDifficulty {
        /// Identifier of the preset, e.g. `"normal"`.
        id: String,
    },
    /// Selects a mission preset and resets the run.
    SetMission {
        /// Identifier of the preset, e.g. `"1"`.
        id: String,
    },
    /// Launches the first wave of an idle run.
    Start,
    /// Discards the current run and immediately starts a fresh one.
    Restart,
    /// Freezes or resumes a running simulation.
    TogglePause,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulated time consumed by the tick after clamping.
        dt: Duration,
    },
    /// Announces a run-state transition.
    RunStateChanged {
        /// State before the transition.
        from: RunState,
        /// State after the transition.
        to: RunState,
    },
    /// Announces that the run was rebuilt from scratch.
    RunReset,
    /// Announces that a wave's spawn quota was loaded.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of agents queued for the wave.
        quota: u32,
    },
    /// Confirms that a new agent entered the grid.
    AgentSpawned {
        /// Identifier assigned to the agent.
        agent: AgentId,
        /// Insect class the agent was drawn from.
        class: String,
        /// Locomotion of the agent.
        movement: MovementClass,
    },
    /// Reports an agent destroyed by the player's defences.
    AgentKilled {
        /// Identifier of the destroyed agent.
        agent: AgentId,
        /// Scrap credited for the kill.
        bounty: u32,
    },
    /// Reports an agent that reached the goal and damaged the base.
    AgentReachedBase {
        /// Identifier of the agent.
        agent: AgentId,
        /// Hit points removed from the base.
        damage: u32,
    },
    /// Confirms a blocking structure was built.
    StructurePlaced {
        /// Type of structure that was built.
        kind: StructureKind,
        /// Cell the structure occupies.
        cell: CellCoord,
        /// Identifier of the tower, absent for walls.
        tower: Option<TowerId>,
        /// Scrap spent.
        cost: u32,
    },
    /// Confirms a trap was armed.
    TrapPlaced {
        /// Cell the trap occupies.
        cell: CellCoord,
        /// Scrap spent.
        cost: u32,
    },
    /// Reports that a trap fired on an agent.
    TrapTriggered {
        /// Cell of the spent trap.
        cell: CellCoord,
        /// Agent caught by the trap.
        agent: AgentId,
    },
    /// Confirms a tower upgrade.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Track that was upgraded.
        track: UpgradeTrack,
        /// Tier reached on the track.
        tier: u32,
        /// Scrap spent.
        cost: u32,
    },
    /// Confirms a structure was sold.
    StructureSold {
        /// Type of structure that was sold.
        kind: StructureKind,
        /// Cell freed by the sale.
        cell: CellCoord,
        /// Scrap refunded.
        refund: u32,
    },
    /// Reports that a tower launched a projectile.
    ProjectileFired {
        /// Tower that fired.
        tower: TowerId,
        /// Agent the projectile homes on.
        target: AgentId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// How an agent crosses the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementClass {
    /// Flies straight at the goal and ignores blocked cells.
    Flying,
    /// Walks a grid route and must go around blocked cells.
    Crawling,
}

/// Blocking structures the player can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Rapid-fire tower with medium range.
    Turret,
    /// Slow, long-range, heavy-hitting tower.
    Sniper,
    /// Inert obstacle that reshapes the crawling routes.
    Wall,
}

/// Independent upgrade tracks available on every tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeTrack {
    /// Raises projectile damage.
    Damage,
    /// Shortens the interval between shots.
    FireRate,
}

/// Lifecycle of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Built and waiting for the player to start the first wave.
    Idle,
    /// Simulation advances on every tick.
    Running,
    /// Simulation frozen until resumed.
    Paused,
    /// Every wave of the mission was cleared.
    Victory,
    /// The base ran out of hit points.
    Over,
}

impl RunState {
    /// Reports whether the state accepts build, upgrade and sell actions.
    #[must_use]
    pub const fn accepts_building(self) -> bool {
        !matches!(self, Self::Over | Self::Paused)
    }
}

/// Reasons a player action may be refused.
///
/// The display text is short enough to surface directly in a toast.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum RejectReason {
    /// The run ended in defeat.
    #[error("Game over")]
    GameOver,
    /// The run is paused.
    #[error("Game paused")]
    Paused,
    /// The player cannot afford the action.
    #[error("Need more scrap")]
    InsufficientScrap,
    /// The target cell lies outside the grid.
    #[error("Out of bounds")]
    OutOfBounds,
    /// The target cell is already impassable.
    #[error("Cell blocked")]
    CellBlocked,
    /// The target cell already holds a tower.
    #[error("Tower already here")]
    Occupied,
    /// The target cell already holds an armed trap.
    #[error("Trap already here")]
    TrapPresent,
    /// The target cell is the start or the goal.
    #[error("Can't block start or base")]
    StartOrGoal,
    /// The placement would disconnect the start from the goal.
    #[error("Path blocked")]
    PathBlocked,
    /// No tower stands on the target cell.
    #[error("No tower here")]
    NoTower,
    /// The requested upgrade track is already at its top tier.
    #[error("Max level")]
    MaxTier,
    /// Nothing sellable stands on the target cell.
    #[error("Nothing to sell")]
    NothingToSell,
    /// The difficulty identifier is not in the preset table.
    #[error("Unknown difficulty {0}")]
    UnknownDifficulty(String),
    /// The mission identifier is not in the preset table.
    #[error("Unknown mission {0}")]
    UnknownMission(String),
    /// The run is already in progress.
    #[error("Already running")]
    AlreadyRunning,
    /// The run has finished; only a restart can continue.
    #[error("Run finished")]
    RunFinished,
    /// Pause only applies to a running simulation.
    #[error("Game not running")]
    NotRunning,
}

/// Read-only summary handed to the presentation layer after each change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current one-based wave number.
    pub wave: u32,
    /// Spendable currency.
    pub scrap: u32,
    /// Remaining base hit points.
    pub base_hp: u32,
    /// Base hit points at the start of the run.
    pub max_base_hp: u32,
    /// Lifecycle state of the run.
    pub run_state: RunState,
    /// Convenience flag mirroring [`RunState::Paused`].
    pub paused: bool,
    /// Fraction of the current wave already resolved, within `[0, 1]`.
    pub wave_progress: f32,
}

/// Receives a snapshot after every state-affecting operation.
pub trait StateObserver {
    /// Called with the latest snapshot.
    fn on_state_changed(&mut self, snapshot: &Snapshot);
}

impl<F> StateObserver for F
where
    F: FnMut(&Snapshot),
{
    fn on_state_changed(&mut self, snapshot: &Snapshot) {
        self(snapshot);
    }
}

/// Behaviour weapons require from the agents they engage.
///
/// Towers, projectiles and traps only ever see agents through this trait, so
/// they never depend on how the agent model stores its movement state.
pub trait Hostile {
    /// Identity used by projectiles to re-acquire their target.
    fn id(&self) -> AgentId;

    /// Current world position.
    fn position(&self) -> Vec2;

    /// Collision radius in world units.
    fn radius(&self) -> f32;

    /// Reports whether the agent was destroyed and awaits removal.
    fn is_destroyed(&self) -> bool;

    /// Subtracts hit points, returning `true` when this hit destroyed the agent.
    fn apply_damage(&mut self, amount: f32) -> bool;

    /// Applies a movement slow of `factor` lasting `duration` seconds.
    fn apply_slow(&mut self, factor: f32, duration: f32);
}
