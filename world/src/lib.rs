#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state management for Hive Defence.
//!
//! The [`World`] owns every entity collection, the blocked-cell set, the
//! economy and the run's pseudo-random source. Hosts mutate it exclusively
//! through [`apply`] and observe it through the [`query`] module; the
//! [`Session`] wrapper adds frame timing and observer notification on top.

mod session;
mod towers;

use std::time::Duration;

use hive_defence_core::{
    AgentId, BlockedCells, CellCoord, Command, DifficultyPreset, Event, GameConfig, Grid, Hostile,
    MissionPreset, MovementClass, Presets, RejectReason, RunState, StructureKind, UpgradeTrack,
    Vec2, DEFAULT_DIFFICULTY, DEFAULT_MISSION, MAX_TICK,
};
use hive_defence_system_builder::{refund, Builder, Site};
use hive_defence_system_movement::{Agent, AgentStats, Movement};
use hive_defence_system_pathfinding::{Pathfinder, RouteSet};
use hive_defence_system_spawning::{self as spawning, choose_class, wave_quota, Spawning};
use hive_defence_system_tower_combat::{Ballistics, Impact, Projectile, Trap};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use session::Session;
use towers::TowerRegistry;

/// Represents the authoritative Hive Defence run state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    presets: Presets,
    difficulty_id: String,
    difficulty: DifficultyPreset,
    mission_id: String,
    mission: MissionPreset,
    grid: Grid,
    start_cell: CellCoord,
    goal_cell: CellCoord,
    blocked: BlockedCells,
    routes: Option<RouteSet>,
    structures: TowerRegistry,
    agents: Vec<Agent>,
    projectiles: Vec<Projectile>,
    traps: Vec<Trap>,
    scrap: u32,
    base_hp: u32,
    max_base_hp: u32,
    wave: u32,
    state: RunState,
    spawning: Spawning,
    rng: ChaCha8Rng,
    pathfinder: Pathfinder,
    builder: Builder,
    movement: Movement,
    ballistics: Ballistics,
    next_agent_id: u32,
}

impl World {
    /// Creates an idle run on the default difficulty and mission.
    ///
    /// Fails when `presets` lacks either default entry.
    pub fn new(config: GameConfig, presets: Presets) -> Result<Self, RejectReason> {
        let difficulty = presets
            .difficulty(DEFAULT_DIFFICULTY)
            .cloned()
            .ok_or_else(|| RejectReason::UnknownDifficulty(DEFAULT_DIFFICULTY.to_owned()))?;
        let mission = presets
            .mission(DEFAULT_MISSION)
            .cloned()
            .ok_or_else(|| RejectReason::UnknownMission(DEFAULT_MISSION.to_owned()))?;

        let grid = config.grid();
        let start_cell = grid.cell_from_point(config.start);
        let goal_cell = grid.cell_from_point(config.goal);
        let spawn_interval = Duration::try_from_secs_f32(config.spawn_interval).unwrap_or_default();

        let mut world = Self {
            difficulty_id: DEFAULT_DIFFICULTY.to_owned(),
            difficulty,
            mission_id: DEFAULT_MISSION.to_owned(),
            mission,
            grid,
            start_cell,
            goal_cell,
            blocked: BlockedCells::new(),
            routes: None,
            structures: TowerRegistry::new(),
            agents: Vec::new(),
            projectiles: Vec::new(),
            traps: Vec::new(),
            scrap: 0,
            base_hp: 0,
            max_base_hp: 0,
            wave: 1,
            state: RunState::Idle,
            spawning: Spawning::new(spawning::Config::new(spawn_interval)),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            pathfinder: Pathfinder::new(grid),
            builder: Builder::new(start_cell, goal_cell),
            movement: Movement::new(&config),
            ballistics: Ballistics {
                muzzle_offset: config.muzzle_offset,
                projectile_radius: config.projectile_radius,
            },
            next_agent_id: 0,
            config,
            presets,
        };
        world.rebuild();
        Ok(world)
    }

    /// Discards every entity and restores the layout, economy and seed.
    fn rebuild(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);

        let (start, goal) = (self.start_cell, self.goal_cell);
        self.blocked = self
            .grid
            .border_cells()
            .into_iter()
            .chain(self.config.interior_walls.iter().copied())
            .filter(|cell| self.grid.in_bounds(*cell) && *cell != start && *cell != goal)
            .collect();
        self.routes = self
            .pathfinder
            .find_route_set(start, goal, &self.blocked, &mut self.rng);
        if self.routes.is_none() {
            tracing::warn!(?start, ?goal, "wall layout leaves no route to the base");
        }

        self.structures = TowerRegistry::new();
        self.agents.clear();
        self.projectiles.clear();
        self.traps.clear();
        self.scrap = self.difficulty.starting_scrap;
        self.base_hp = self.difficulty.base_hp;
        self.max_base_hp = self.difficulty.base_hp;
        self.wave = 1;
        self.spawning.reset();
        self.state = RunState::Idle;
        self.next_agent_id = 0;
    }

    fn site(&self) -> Site<'_> {
        Site {
            run_state: self.state,
            scrap: self.scrap,
            grid: self.grid,
            blocked: &self.blocked,
        }
    }

    fn transition(&mut self, to: RunState, out_events: &mut Vec<Event>) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::info!(?from, ?to, wave = self.wave, "run state changed");
        out_events.push(Event::RunStateChanged { from, to });
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        let from = self.state;
        self.rebuild();
        out_events.push(Event::RunReset);
        if from != RunState::Idle {
            tracing::info!(?from, to = ?RunState::Idle, "run reset");
            out_events.push(Event::RunStateChanged {
                from,
                to: RunState::Idle,
            });
        }
    }

    fn start(&mut self, out_events: &mut Vec<Event>) -> Result<(), RejectReason> {
        match self.state {
            RunState::Idle => {
                self.transition(RunState::Running, out_events);
                self.load_wave(out_events);
                Ok(())
            }
            RunState::Running | RunState::Paused => Err(RejectReason::AlreadyRunning),
            RunState::Victory | RunState::Over => Err(RejectReason::RunFinished),
        }
    }

    fn load_wave(&mut self, out_events: &mut Vec<Event>) {
        let quota = wave_quota(self.wave, self.difficulty.wave_multiplier);
        self.spawning.load_wave(quota);
        tracing::debug!(wave = self.wave, quota, "wave started");
        out_events.push(Event::WaveStarted {
            wave: self.wave,
            quota,
        });
    }

    /// Advances the running simulation by one clamped tick.
    fn step(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();

        if self.spawning.advance(dt) {
            self.spawn_agent(out_events);
        }

        for agent in &mut self.agents {
            let _ = self.movement.advance(
                agent,
                seconds,
                &self.blocked,
                &mut self.pathfinder,
                &mut self.rng,
            );
        }

        for tower in self.structures.towers_mut() {
            if let Some(target) =
                tower.update(seconds, &self.agents, self.ballistics, &mut self.projectiles)
            {
                out_events.push(Event::ProjectileFired {
                    tower: tower.id(),
                    target,
                });
            }
        }

        for projectile in &mut self.projectiles {
            if let Impact::Hit {
                agent,
                killed: true,
            } = projectile.update(seconds, &mut self.agents)
            {
                tracing::debug!(
                    agent = agent.get(),
                    tower = projectile.source().get(),
                    "projectile kill"
                );
            }
        }

        for trap in &mut self.traps {
            if let Some(hit) = trap.resolve(&mut self.agents) {
                out_events.push(Event::TrapTriggered {
                    cell: trap.cell(),
                    agent: hit.agent,
                });
            }
        }
        self.traps.retain(|trap| !trap.is_used());

        for agent in &mut self.agents {
            if agent.is_destroyed() || !self.movement.has_arrived(agent) {
                continue;
            }
            agent.mark_arrived();
            let damage = agent.stats().damage;
            self.base_hp = self.base_hp.saturating_sub(damage);
            out_events.push(Event::AgentReachedBase {
                agent: agent.id(),
                damage,
            });
        }

        let scrap = &mut self.scrap;
        self.agents.retain(|agent| {
            if !agent.is_destroyed() {
                return true;
            }
            if !agent.reached_base() {
                let bounty = agent.bounty();
                *scrap = scrap.saturating_add(bounty);
                out_events.push(Event::AgentKilled {
                    agent: agent.id(),
                    bounty,
                });
            }
            false
        });
        self.projectiles.retain(|projectile| !projectile.is_spent());

        if self.agents.is_empty() && self.spawning.remaining() == 0 {
            let final_wave = self.mission.max_waves.is_some_and(|last| self.wave >= last);
            if final_wave {
                self.transition(RunState::Victory, out_events);
            } else {
                self.wave = self.wave.saturating_add(1);
                self.load_wave(out_events);
            }
        }
        if self.base_hp == 0 {
            self.transition(RunState::Over, out_events);
        }
    }

    fn spawn_agent(&mut self, out_events: &mut Vec<Event>) {
        let Some(class) = choose_class(&self.presets, self.wave, &mut self.rng) else {
            tracing::warn!(wave = self.wave, "no insect class available to spawn");
            return;
        };

        let stats = AgentStats::scaled(&self.config, self.wave, &self.difficulty, class);
        let route = match (class.movement, &self.routes) {
            (MovementClass::Crawling, Some(routes)) => {
                let route = routes.choose(&mut self.rng);
                Some(self.pathfinder.jitter_route(
                    route,
                    self.config.route_jitter,
                    &self.blocked,
                    &mut self.rng,
                ))
            }
            _ => None,
        };

        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        tracing::debug!(agent = id.get(), class = %class.name, wave = self.wave, "agent spawned");
        out_events.push(Event::AgentSpawned {
            agent: id,
            class: class.name.clone(),
            movement: class.movement,
        });
        self.agents.push(Agent::spawn(id, class, stats, self.config.start, route));
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Player actions that cannot proceed are refused with a [`RejectReason`] and
/// leave the world untouched. Ticks outside the running state are ignored.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), RejectReason> {
    match command {
        Command::PlaceStructure { kind, point } => place_structure(world, kind, point, out_events),
        Command::PlaceTrap { point } => place_trap(world, point, out_events),
        Command::Upgrade { point, track } => upgrade(world, point, track, out_events),
        Command::Sell { point } => sell(world, point, out_events),
        Command::SetDifficulty { id } => {
            let Some(preset) = world.presets.difficulty(&id).cloned() else {
                return Err(RejectReason::UnknownDifficulty(id));
            };
            world.difficulty = preset;
            world.difficulty_id = id;
            world.reset(out_events);
            Ok(())
        }
        Command::SetMission { id } => {
            let Some(preset) = world.presets.mission(&id).cloned() else {
                return Err(RejectReason::UnknownMission(id));
            };
            world.mission = preset;
            world.mission_id = id;
            world.reset(out_events);
            Ok(())
        }
        Command::Start => world.start(out_events),
        Command::Restart => {
            world.reset(out_events);
            world.start(out_events)
        }
        Command::TogglePause => match world.state {
            RunState::Running => {
                world.transition(RunState::Paused, out_events);
                Ok(())
            }
            RunState::Paused => {
                world.transition(RunState::Running, out_events);
                Ok(())
            }
            _ => Err(RejectReason::NotRunning),
        },
        Command::Tick { dt } => {
            if world.state == RunState::Running {
                let dt = dt.min(MAX_TICK);
                out_events.push(Event::TimeAdvanced { dt });
                world.step(dt, out_events);
            }
            Ok(())
        }
    }
}

fn place_structure(
    world: &mut World,
    kind: StructureKind,
    point: Vec2,
    out_events: &mut Vec<Event>,
) -> Result<(), RejectReason> {
    let cost = world.config.structure_cost(kind);
    let site = Site {
        run_state: world.state,
        scrap: world.scrap,
        grid: world.grid,
        blocked: &world.blocked,
    };
    let structures = &world.structures;
    let approval = world.builder.validate_structure(
        &site,
        point,
        cost,
        |cell| structures.has_tower(cell),
        &mut world.pathfinder,
        &mut world.rng,
    )?;

    let cell = approval.cell;
    world.blocked = approval.blocked;
    world.routes = Some(approval.routes);
    world.scrap = world.scrap.saturating_sub(approval.cost);

    let position = world.grid.point_from_cell(cell);
    let tower = match world.config.tower_spec(kind) {
        Some(spec) => Some(
            world
                .structures
                .insert_tower(kind, cell, position, spec, approval.cost),
        ),
        None => {
            world.structures.insert_wall(cell, approval.cost);
            None
        }
    };

    let mut stranded = 0_usize;
    for agent in &mut world.agents {
        if agent.is_destroyed() || agent.movement() != MovementClass::Crawling {
            continue;
        }
        if !world
            .movement
            .reroute(agent, &world.blocked, &mut world.pathfinder, &mut world.rng)
        {
            stranded += 1;
        }
    }

    tracing::debug!(?kind, ?cell, cost = approval.cost, stranded, "structure placed");
    out_events.push(Event::StructurePlaced {
        kind,
        cell,
        tower,
        cost: approval.cost,
    });
    Ok(())
}

fn place_trap(
    world: &mut World,
    point: Vec2,
    out_events: &mut Vec<Event>,
) -> Result<(), RejectReason> {
    let cost = world.config.costs.trap;
    let cell = world.builder.validate_trap(
        &world.site(),
        point,
        cost,
        |cell| world.structures.has_tower(cell),
        |cell| world.traps.iter().any(|trap| trap.cell() == cell),
    )?;

    world.scrap = world.scrap.saturating_sub(cost);
    let position = world.grid.point_from_cell(cell);
    world.traps.push(Trap::new(cell, position, &world.config.trap));
    tracing::debug!(?cell, cost, "trap armed");
    out_events.push(Event::TrapPlaced { cell, cost });
    Ok(())
}

fn upgrade(
    world: &mut World,
    point: Vec2,
    track: UpgradeTrack,
    out_events: &mut Vec<Event>,
) -> Result<(), RejectReason> {
    let cost = world.config.costs.upgrade;
    let cell = world.grid.cell_from_point(point);
    world.builder.validate_upgrade(
        &world.site(),
        world.structures.tier_at(cell, track),
        world.config.upgrades.max_tier,
        cost,
    )?;

    let Some(tower) = world.structures.tower_at_mut(cell) else {
        return Err(RejectReason::NoTower);
    };
    let tier = tower.upgrade(track, &world.config.upgrades, cost);
    let id = tower.id();
    world.scrap = world.scrap.saturating_sub(cost);
    tracing::debug!(tower = id.get(), ?track, tier, "tower upgraded");
    out_events.push(Event::TowerUpgraded {
        tower: id,
        track,
        tier,
        cost,
    });
    Ok(())
}

fn sell(world: &mut World, point: Vec2, out_events: &mut Vec<Event>) -> Result<(), RejectReason> {
    let cell = world.grid.cell_from_point(point);
    world
        .builder
        .validate_sale(&world.site(), world.structures.is_sellable(cell))?;

    let Some(removed) = world.structures.remove(cell) else {
        return Err(RejectReason::NothingToSell);
    };
    let returned = refund(removed.invested, world.config.refund_rate);
    world.scrap = world.scrap.saturating_add(returned);
    let _ = world.blocked.remove(cell);

    if let Some(routes) = world.pathfinder.find_route_set(
        world.start_cell,
        world.goal_cell,
        &world.blocked,
        &mut world.rng,
    ) {
        world.routes = Some(routes);
    }

    tracing::debug!(kind = ?removed.kind, ?cell, refund = returned, "structure sold");
    out_events.push(Event::StructureSold {
        kind: removed.kind,
        cell,
        refund: returned,
    });
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use hive_defence_core::{
        BlockedCells, CellCoord, DifficultyPreset, GameConfig, Grid, MissionPreset, RunState,
        Snapshot,
    };
    use hive_defence_system_movement::Agent;
    use hive_defence_system_pathfinding::RouteSet;
    use hive_defence_system_tower_combat::{Projectile, Tower, Trap};

    /// Captures the summary handed to observers.
    #[must_use]
    pub fn snapshot(world: &World) -> Snapshot {
        Snapshot {
            wave: world.wave,
            scrap: world.scrap,
            base_hp: world.base_hp,
            max_base_hp: world.max_base_hp,
            run_state: world.state,
            paused: world.state == RunState::Paused,
            wave_progress: world.spawning.progress(world.agents.len()),
        }
    }

    /// Lifecycle state of the run.
    #[must_use]
    pub fn run_state(world: &World) -> RunState {
        world.state
    }

    /// Spendable currency.
    #[must_use]
    pub fn scrap(world: &World) -> u32 {
        world.scrap
    }

    /// Remaining base hit points.
    #[must_use]
    pub fn base_hp(world: &World) -> u32 {
        world.base_hp
    }

    /// Current one-based wave number.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Agents of the current wave not yet spawned.
    #[must_use]
    pub fn spawn_queue(world: &World) -> u32 {
        world.spawning.remaining()
    }

    /// Tuning the run was built with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Grid laid over the world.
    #[must_use]
    pub fn grid(world: &World) -> Grid {
        world.grid
    }

    /// Identifier and values of the selected difficulty.
    #[must_use]
    pub fn difficulty(world: &World) -> (&str, &DifficultyPreset) {
        (&world.difficulty_id, &world.difficulty)
    }

    /// Identifier and values of the selected mission.
    #[must_use]
    pub fn mission(world: &World) -> (&str, &MissionPreset) {
        (&world.mission_id, &world.mission)
    }

    /// Cells agents cannot enter.
    #[must_use]
    pub fn blocked(world: &World) -> &BlockedCells {
        &world.blocked
    }

    /// Routes new crawling agents are drawn from.
    #[must_use]
    pub fn routes(world: &World) -> Option<&RouteSet> {
        world.routes.as_ref()
    }

    /// Towers in construction order.
    #[must_use]
    pub fn towers(world: &World) -> &[Tower] {
        world.structures.towers()
    }

    /// Cells holding sellable walls, in ascending order.
    #[must_use]
    pub fn player_walls(world: &World) -> Vec<CellCoord> {
        world.structures.walls().collect()
    }

    /// Live agents in spawn order.
    #[must_use]
    pub fn agents(world: &World) -> &[Agent] {
        &world.agents
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> &[Projectile] {
        &world.projectiles
    }

    /// Armed traps.
    #[must_use]
    pub fn traps(world: &World) -> &[Trap] {
        &world.traps
    }

    /// Reports whether a wall or tower could stand on `cell` without
    /// considering currency or connectivity.
    #[must_use]
    pub fn is_buildable(world: &World, cell: CellCoord) -> bool {
        world.grid.in_bounds(cell)
            && !world.blocked.contains(cell)
            && !world.structures.has_tower(cell)
            && cell != world.start_cell
            && cell != world.goal_cell
    }
}
