#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agent model: stat scaling, flying and crawling locomotion, slow effects.
//!
//! Flying agents head straight for the goal and ignore blocked cells.
//! Crawling agents follow an owned route and heal it themselves: when the
//! next step would enter a blocked cell they stay put and request a fresh
//! route from where they stand.

use hive_defence_core::{
    AgentId, BlockedCells, CellCoord, DifficultyPreset, GameConfig, Grid, Hostile, InsectClass,
    MovementClass, Route, Vec2,
};
use hive_defence_system_pathfinding::Pathfinder;
use rand::Rng;

const ROUTELESS_WARNING_AFTER: f32 = 5.0;
const HOVER_DISTANCE: f32 = 1.0;

/// Combat and movement figures of a single agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentStats {
    /// Hit points at spawn.
    pub max_hp: f32,
    /// Speed in world units per second before slows.
    pub speed: f32,
    /// Base hit points removed on arrival.
    pub damage: u32,
    /// Scrap paid when the agent is killed.
    pub bounty: u32,
    /// Collision radius in world units.
    pub radius: f32,
}

impl AgentStats {
    /// Scales the configured base stats by wave, difficulty and species.
    #[must_use]
    pub fn scaled(
        config: &GameConfig,
        wave: u32,
        difficulty: &DifficultyPreset,
        class: &InsectClass,
    ) -> Self {
        let wave = wave as f32;
        Self {
            max_hp: (config.enemy_base_hp + wave * config.enemy_hp_per_wave)
                * difficulty.enemy_hp_multiplier
                * class.hp_multiplier,
            speed: (config.enemy_base_speed + wave * config.enemy_speed_per_wave)
                * difficulty.enemy_speed_multiplier
                * class.speed_multiplier,
            damage: class.damage,
            bounty: class.reward,
            radius: config.enemy_base_radius * class.size,
        }
    }
}

/// Temporary speed multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    factor: f32,
    remaining: f32,
}

impl Slow {
    const NONE: Self = Self {
        factor: 1.0,
        remaining: 0.0,
    };

    fn tick(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining -= dt;
            if self.remaining <= 0.0 {
                *self = Self::NONE;
            }
        }
    }
}

#[derive(Clone, Debug)]
enum Locomotion {
    Flying,
    Crawling(Crawl),
}

#[derive(Clone, Debug, Default)]
struct Crawl {
    route: Option<Route>,
    waypoint: usize,
    retry_in: f32,
    routeless_for: f32,
    warned: bool,
}

impl Crawl {
    fn needs_route(&self) -> bool {
        self.route
            .as_ref()
            .map_or(true, |route| self.waypoint >= route.len())
    }

    fn adopt(&mut self, route: Option<Route>, retry_interval: f32) -> bool {
        self.waypoint = 0;
        match route {
            Some(route) => {
                self.route = Some(route);
                self.retry_in = 0.0;
                self.routeless_for = 0.0;
                self.warned = false;
                true
            }
            None => {
                self.route = None;
                self.retry_in = retry_interval;
                false
            }
        }
    }
}

/// Hostile unit crossing the grid toward the base.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    class: String,
    stats: AgentStats,
    position: Vec2,
    hp: f32,
    slow: Slow,
    destroyed: bool,
    arrived: bool,
    locomotion: Locomotion,
}

impl Agent {
    /// Creates an agent of `class` at `position`.
    ///
    /// `route` is only kept for crawling agents; a crawling agent spawned
    /// without one requests a route on its first update.
    #[must_use]
    pub fn spawn(
        id: AgentId,
        class: &InsectClass,
        stats: AgentStats,
        position: Vec2,
        route: Option<Route>,
    ) -> Self {
        let locomotion = match class.movement {
            MovementClass::Flying => Locomotion::Flying,
            MovementClass::Crawling => Locomotion::Crawling(Crawl {
                route,
                ..Crawl::default()
            }),
        };
        Self {
            id,
            class: class.name.clone(),
            stats,
            position,
            hp: stats.max_hp,
            slow: Slow::NONE,
            destroyed: false,
            arrived: false,
            locomotion,
        }
    }

    /// Species name the agent was drawn from.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Locomotion class.
    #[must_use]
    pub fn movement(&self) -> MovementClass {
        match self.locomotion {
            Locomotion::Flying => MovementClass::Flying,
            Locomotion::Crawling(_) => MovementClass::Crawling,
        }
    }

    /// Stats fixed at spawn.
    #[must_use]
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Remaining hit points.
    #[must_use]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Current speed multiplier, `1.0` when no slow is active.
    #[must_use]
    pub fn slow_factor(&self) -> f32 {
        self.slow.factor
    }

    /// Seconds left on the active slow.
    #[must_use]
    pub fn slow_remaining(&self) -> f32 {
        self.slow.remaining
    }

    /// Route a crawling agent is following.
    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        match &self.locomotion {
            Locomotion::Crawling(crawl) => crawl.route.as_ref(),
            Locomotion::Flying => None,
        }
    }

    /// Index of the waypoint a crawling agent is heading for.
    #[must_use]
    pub fn waypoint(&self) -> Option<usize> {
        match &self.locomotion {
            Locomotion::Crawling(crawl) => Some(crawl.waypoint),
            Locomotion::Flying => None,
        }
    }

    /// Reports whether the agent was removed by reaching the base.
    #[must_use]
    pub fn reached_base(&self) -> bool {
        self.arrived
    }

    /// Scrap owed for removing the agent; nothing once it reached the base.
    #[must_use]
    pub fn bounty(&self) -> u32 {
        if self.arrived {
            0
        } else {
            self.stats.bounty
        }
    }

    /// Flags the agent as having struck the base.
    pub fn mark_arrived(&mut self) {
        self.arrived = true;
        self.destroyed = true;
    }
}

impl Hostile for Agent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.stats.radius
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn apply_damage(&mut self, amount: f32) -> bool {
        if self.destroyed {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.destroyed = true;
            return true;
        }
        false
    }

    fn apply_slow(&mut self, factor: f32, duration: f32) {
        if factor < self.slow.factor || self.slow.remaining <= 0.0 {
            self.slow = Slow {
                factor,
                remaining: duration,
            };
        }
    }
}

/// Outcome of advancing one agent by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentStep {
    /// A flying agent moved toward the goal.
    Flew,
    /// A flying agent is already on top of the goal.
    Hovering,
    /// A crawling agent moved along its route.
    Walked,
    /// A crawling agent reached its current waypoint and did not move.
    ReachedWaypoint,
    /// A crawling agent found its next step blocked and replaced its route.
    Rerouted,
    /// A crawling agent has no route and stayed in place.
    Stalled,
    /// The agent is destroyed and was skipped.
    Inactive,
}

/// Movement rules shared by every agent of a run.
#[derive(Clone, Copy, Debug)]
pub struct Movement {
    grid: Grid,
    goal: Vec2,
    goal_cell: CellCoord,
    arrival_radius: f32,
    waypoint_reach: f32,
    retry_interval: f32,
}

impl Movement {
    /// Creates the movement rules for the configured world.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let grid = config.grid();
        Self {
            grid,
            goal: config.goal,
            goal_cell: grid.cell_from_point(config.goal),
            arrival_radius: config.arrival_radius,
            waypoint_reach: config.waypoint_reach,
            retry_interval: config.route_retry_interval,
        }
    }

    /// Reports whether the agent is close enough to the goal to strike the base.
    #[must_use]
    pub fn has_arrived(&self, agent: &Agent) -> bool {
        agent.position.distance(self.goal) < self.arrival_radius
    }

    /// Advances one agent by `dt` seconds.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        agent: &mut Agent,
        dt: f32,
        blocked: &BlockedCells,
        pathfinder: &mut Pathfinder,
        rng: &mut R,
    ) -> AgentStep {
        if agent.destroyed {
            return AgentStep::Inactive;
        }
        agent.slow.tick(dt);
        let speed = agent.stats.speed * agent.slow.factor;

        match &mut agent.locomotion {
            Locomotion::Flying => {
                let offset = self.goal - agent.position;
                let distance = offset.length();
                if distance < HOVER_DISTANCE {
                    return AgentStep::Hovering;
                }
                agent.position += offset * (speed * dt / distance);
                AgentStep::Flew
            }
            Locomotion::Crawling(crawl) => {
                let id = agent.id;
                let position = agent.position;
                match self.crawl(id, position, crawl, speed, dt, blocked, pathfinder, rng) {
                    CrawlOutcome::Moved(next) => {
                        agent.position = next;
                        AgentStep::Walked
                    }
                    CrawlOutcome::Step(step) => step,
                }
            }
        }
    }

    /// Replaces a crawling agent's route with one computed from its position.
    ///
    /// Returns `false` for flying agents and when no route exists; a crawling
    /// agent left without a route retries on a later tick.
    pub fn reroute<R: Rng + ?Sized>(
        &self,
        agent: &mut Agent,
        blocked: &BlockedCells,
        pathfinder: &mut Pathfinder,
        rng: &mut R,
    ) -> bool {
        let start = self.grid.cell_from_point(agent.position);
        match &mut agent.locomotion {
            Locomotion::Flying => false,
            Locomotion::Crawling(crawl) => {
                let route = pathfinder.find_route(start, self.goal_cell, blocked, rng);
                crawl.adopt(route, self.retry_interval)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn crawl<R: Rng + ?Sized>(
        &self,
        id: AgentId,
        position: Vec2,
        crawl: &mut Crawl,
        speed: f32,
        dt: f32,
        blocked: &BlockedCells,
        pathfinder: &mut Pathfinder,
        rng: &mut R,
    ) -> CrawlOutcome {
        let current_cell = self.grid.cell_from_point(position);

        if crawl.needs_route() {
            if crawl.retry_in > 0.0 {
                crawl.retry_in -= dt;
                self.note_routeless(id, crawl, dt);
                return CrawlOutcome::Step(AgentStep::Stalled);
            }
            let route = pathfinder.find_route(current_cell, self.goal_cell, blocked, rng);
            if !crawl.adopt(route, self.retry_interval) {
                self.note_routeless(id, crawl, dt);
                return CrawlOutcome::Step(AgentStep::Stalled);
            }
        }

        let Some(target) = crawl
            .route
            .as_ref()
            .and_then(|route| route.get(crawl.waypoint))
        else {
            return CrawlOutcome::Step(AgentStep::Stalled);
        };

        let offset = target - position;
        let distance = match offset.length() {
            length if length > 0.0 => length,
            _ => 1.0,
        };
        if distance <= self.waypoint_reach {
            crawl.waypoint += 1;
            return CrawlOutcome::Step(AgentStep::ReachedWaypoint);
        }

        let next = position + offset / distance * (speed * dt);
        let next_cell = self.grid.cell_from_point(next);
        if next_cell != current_cell && blocked.contains(next_cell) {
            let route = pathfinder.find_route(current_cell, self.goal_cell, blocked, rng);
            if crawl.adopt(route, self.retry_interval) {
                tracing::debug!(agent = id.get(), ?next_cell, "route obstructed, rerouted");
            } else {
                tracing::debug!(agent = id.get(), ?next_cell, "route obstructed, no alternative");
            }
            return CrawlOutcome::Step(AgentStep::Rerouted);
        }

        CrawlOutcome::Moved(next)
    }

    fn note_routeless(&self, id: AgentId, crawl: &mut Crawl, dt: f32) {
        crawl.routeless_for += dt;
        if !crawl.warned && crawl.routeless_for >= ROUTELESS_WARNING_AFTER {
            crawl.warned = true;
            tracing::warn!(
                agent = id.get(),
                seconds = crawl.routeless_for,
                "agent has been without a route"
            );
        }
    }
}

enum CrawlOutcome {
    Moved(Vec2),
    Step(AgentStep),
}
