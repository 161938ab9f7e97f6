#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement validator deciding whether player build actions may proceed.
//!
//! Validation never mutates the caller's state. Blocking placements are tested
//! against a copy of the blocked-cell set; on approval the copy and the route
//! set computed from it are handed back for the run controller to commit.

use hive_defence_core::{BlockedCells, CellCoord, Grid, RejectReason, RunState, Vec2};
use hive_defence_system_pathfinding::{Pathfinder, RouteSet};
use rand::Rng;

/// Read-only view of the run state a placement is judged against.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    /// Lifecycle state of the run.
    pub run_state: RunState,
    /// Spendable currency.
    pub scrap: u32,
    /// Grid the structures snap to.
    pub grid: Grid,
    /// Currently impassable cells.
    pub blocked: &'a BlockedCells,
}

/// Accepted blocking placement, ready to be committed.
#[derive(Clone, Debug)]
pub struct Approval {
    /// Cell the structure will occupy.
    pub cell: CellCoord,
    /// Scrap to deduct.
    pub cost: u32,
    /// Blocked-cell set including the new structure.
    pub blocked: BlockedCells,
    /// Route set computed against [`Approval::blocked`].
    pub routes: RouteSet,
}

/// Validator bound to the run's start and goal cells.
#[derive(Clone, Copy, Debug)]
pub struct Builder {
    start: CellCoord,
    goal: CellCoord,
}

impl Builder {
    /// Creates a validator protecting the provided endpoints.
    #[must_use]
    pub const fn new(start: CellCoord, goal: CellCoord) -> Self {
        Self { start, goal }
    }

    /// Validates a wall or tower at the cell containing `point`.
    ///
    /// Checks run in a fixed order: run state, currency, bounds, existing
    /// towers, existing blockers, the protected endpoints and finally
    /// connectivity. The `tower_at` closure should report whether a tower
    /// already stands on a cell.
    pub fn validate_structure<F, R>(
        &self,
        site: &Site<'_>,
        point: Vec2,
        cost: u32,
        tower_at: F,
        pathfinder: &mut Pathfinder,
        rng: &mut R,
    ) -> Result<Approval, RejectReason>
    where
        F: Fn(CellCoord) -> bool,
        R: Rng + ?Sized,
    {
        ensure_accepts_building(site.run_state)?;
        ensure_affordable(site.scrap, cost)?;

        let cell = site.grid.cell_from_point(point);
        if !site.grid.in_bounds(cell) {
            return Err(RejectReason::OutOfBounds);
        }
        if tower_at(cell) {
            return Err(RejectReason::Occupied);
        }
        if site.blocked.contains(cell) {
            return Err(RejectReason::CellBlocked);
        }
        if cell == self.start || cell == self.goal {
            return Err(RejectReason::StartOrGoal);
        }

        let blocked = site.blocked.with(cell);
        let Some(routes) = pathfinder.find_route_set(self.start, self.goal, &blocked, rng) else {
            tracing::debug!(?cell, "placement would disconnect start from goal");
            return Err(RejectReason::PathBlocked);
        };

        Ok(Approval {
            cell,
            cost,
            blocked,
            routes,
        })
    }

    /// Validates a trap at the cell containing `point`, returning that cell.
    ///
    /// Traps never block, so connectivity is not consulted.
    pub fn validate_trap<F, G>(
        &self,
        site: &Site<'_>,
        point: Vec2,
        cost: u32,
        tower_at: F,
        trap_at: G,
    ) -> Result<CellCoord, RejectReason>
    where
        F: Fn(CellCoord) -> bool,
        G: Fn(CellCoord) -> bool,
    {
        ensure_accepts_building(site.run_state)?;
        ensure_affordable(site.scrap, cost)?;

        let cell = site.grid.cell_from_point(point);
        if !site.grid.in_bounds(cell) {
            return Err(RejectReason::OutOfBounds);
        }
        if tower_at(cell) {
            return Err(RejectReason::Occupied);
        }
        if site.blocked.contains(cell) {
            return Err(RejectReason::CellBlocked);
        }
        if trap_at(cell) {
            return Err(RejectReason::TrapPresent);
        }
        Ok(cell)
    }

    /// Validates buying one tier on a tower track.
    ///
    /// `tier` is the track's current tier, or `None` when no tower stands on
    /// the targeted cell.
    pub fn validate_upgrade(
        &self,
        site: &Site<'_>,
        tier: Option<u32>,
        max_tier: u32,
        cost: u32,
    ) -> Result<(), RejectReason> {
        ensure_accepts_building(site.run_state)?;
        let Some(tier) = tier else {
            return Err(RejectReason::NoTower);
        };
        ensure_affordable(site.scrap, cost)?;
        if tier >= max_tier {
            return Err(RejectReason::MaxTier);
        }
        Ok(())
    }

    /// Validates selling whatever stands on a cell.
    ///
    /// `sellable` reports whether the cell holds a tower or a player-built
    /// wall; border and layout walls are never sellable.
    pub fn validate_sale(&self, site: &Site<'_>, sellable: bool) -> Result<(), RejectReason> {
        ensure_accepts_building(site.run_state)?;
        if sellable {
            Ok(())
        } else {
            Err(RejectReason::NothingToSell)
        }
    }
}

/// Scrap returned when selling a structure with `invested` cumulative cost.
#[must_use]
pub fn refund(invested: u32, rate: f32) -> u32 {
    let value = (f64::from(invested) * f64::from(rate)).round();
    if value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}

fn ensure_accepts_building(state: RunState) -> Result<(), RejectReason> {
    match state {
        RunState::Over => Err(RejectReason::GameOver),
        RunState::Paused => Err(RejectReason::Paused),
        _ => Ok(()),
    }
}

fn ensure_affordable(scrap: u32, cost: u32) -> Result<(), RejectReason> {
    if scrap < cost {
        Err(RejectReason::InsufficientScrap)
    } else {
        Ok(())
    }
}
