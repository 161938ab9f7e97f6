#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid A* router that produces single routes and diversified route sets.
//!
//! Costs are uniform and movement is restricted to the four cardinal
//! directions. Each expansion shuffles its neighbours and perturbs the
//! priority of newly discovered cells with a small amount of noise drawn from
//! the caller's random source, so repeated searches on the same grid spread
//! agents across equally short corridors. Passing a seeded source makes the
//! output reproducible.

use std::{cmp::Ordering, collections::BinaryHeap};

use hive_defence_core::{BlockedCells, CellCoord, Grid, Route, Vec2};
use rand::{seq::SliceRandom, Rng};

const TIE_BREAK_NOISE: f32 = 0.05;
const MAX_DETOURS: usize = 3;
const DETOUR_ATTEMPTS: u32 = 40;
const OPEN_CELL_SAMPLES: u32 = 50;
const DETOUR_CLEARANCE: f32 = 40.0;
const DETOUR_LENGTH_FACTOR: f32 = 1.8;
const MIDPOINT_SEPARATION: f32 = 30.0;
const UNVISITED: usize = usize::MAX;

/// Main route followed by up to three detours.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSet {
    routes: Vec<Route>,
}

impl RouteSet {
    /// Shortest route found between the endpoints.
    #[must_use]
    pub fn main(&self) -> &Route {
        &self.routes[0]
    }

    /// Every route in the set, main route first.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of detours accepted alongside the main route.
    #[must_use]
    pub fn detour_count(&self) -> usize {
        self.routes.len() - 1
    }

    /// Picks one of the routes uniformly at random.
    #[must_use]
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Route {
        self.routes.choose(rng).unwrap_or(&self.routes[0])
    }
}

/// Reusable A* search over a fixed grid.
///
/// The scratch buffers survive between searches so that agents rerouting
/// mid-wave do not allocate per request.
#[derive(Clone, Debug)]
pub struct Pathfinder {
    grid: Grid,
    costs: Vec<u32>,
    came_from: Vec<usize>,
    open: BinaryHeap<OpenNode>,
}

impl Pathfinder {
    /// Creates a pathfinder for the provided grid.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            costs: Vec::new(),
            came_from: Vec::new(),
            open: BinaryHeap::new(),
        }
    }

    /// Grid the pathfinder searches.
    #[must_use]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Finds a shortest 4-connected route from `start` to `goal`.
    ///
    /// The start cell is expanded even when it is blocked so that an agent
    /// standing on a freshly built structure can still walk out of it. Returns
    /// `None` when either endpoint lies outside the grid or the open set
    /// drains before the goal is reached.
    pub fn find_route<R: Rng + ?Sized>(
        &mut self,
        start: CellCoord,
        goal: CellCoord,
        blocked: &BlockedCells,
        rng: &mut R,
    ) -> Option<Route> {
        let start_index = self.grid.index(start)?;
        let goal_index = self.grid.index(goal)?;
        self.prepare();

        self.costs[start_index] = 0;
        self.open.push(OpenNode {
            priority: start.manhattan_distance(goal) as f32,
            cost: 0,
            index: start_index,
        });

        while let Some(node) = self.open.pop() {
            if node.cost > self.costs[node.index] {
                continue;
            }
            if node.index == goal_index {
                return self.reconstruct(start_index, goal_index);
            }

            let Some(cell) = self.grid.cell_at(node.index) else {
                continue;
            };
            let mut neighbors = self.grid.neighbors(cell);
            neighbors.as_mut_slice().shuffle(rng);

            for &neighbor in neighbors.as_slice() {
                if blocked.contains(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = self.grid.index(neighbor) else {
                    continue;
                };
                let tentative = node.cost + 1;
                if tentative >= self.costs[neighbor_index] {
                    continue;
                }

                self.costs[neighbor_index] = tentative;
                self.came_from[neighbor_index] = node.index;
                let noise = rng.gen::<f32>() * TIE_BREAK_NOISE;
                self.open.push(OpenNode {
                    priority: tentative as f32 + neighbor.manhattan_distance(goal) as f32 + noise,
                    cost: tentative,
                    index: neighbor_index,
                });
            }
        }

        tracing::trace!(?start, ?goal, "no route between cells");
        None
    }

    /// Finds the main route plus up to three detours through random open cells.
    ///
    /// A detour candidate is discarded when its waypoint lies within 40 units
    /// of an accepted route, when it has more than 1.8 times the main route's
    /// waypoints, or when its midpoint falls within 30 units of an accepted
    /// route's midpoint. Returns `None` only when the main route fails.
    pub fn find_route_set<R: Rng + ?Sized>(
        &mut self,
        start: CellCoord,
        goal: CellCoord,
        blocked: &BlockedCells,
        rng: &mut R,
    ) -> Option<RouteSet> {
        let main = self.find_route(start, goal, blocked, rng)?;
        let main_len = main.len() as f32;
        let mut routes = vec![main];

        let mut attempts = 0;
        while routes.len() < 1 + MAX_DETOURS && attempts < DETOUR_ATTEMPTS {
            attempts += 1;
            let Some(waypoint) = self.random_open_cell(start, goal, blocked, rng) else {
                break;
            };
            let point = self.grid.point_from_cell(waypoint);
            let clearance = routes
                .iter()
                .map(|route| route.distance_to(point))
                .fold(f32::INFINITY, f32::min);
            if clearance < DETOUR_CLEARANCE {
                continue;
            }

            let Some(first) = self.find_route(start, waypoint, blocked, rng) else {
                continue;
            };
            let Some(second) = self.find_route(waypoint, goal, blocked, rng) else {
                continue;
            };
            let detour = first.concat(second);
            if detour.len() as f32 > main_len * DETOUR_LENGTH_FACTOR {
                continue;
            }

            let Some(midpoint) = detour.midpoint() else {
                continue;
            };
            let similar = routes.iter().any(|route| {
                route
                    .midpoint()
                    .is_some_and(|existing| existing.distance(midpoint) < MIDPOINT_SEPARATION)
            });
            if similar {
                continue;
            }

            routes.push(detour);
        }

        tracing::debug!(
            detours = routes.len() - 1,
            attempts,
            main_waypoints = main_len,
            "route set computed"
        );
        Some(RouteSet { routes })
    }

    /// Copies `route`, offsetting each interior waypoint by up to `amount` per axis.
    ///
    /// Endpoints are never moved and an offset that lands in a blocked cell is
    /// dropped for that waypoint.
    pub fn jitter_route<R: Rng + ?Sized>(
        &self,
        route: &Route,
        amount: f32,
        blocked: &BlockedCells,
        rng: &mut R,
    ) -> Route {
        let points = route.points();
        if amount <= 0.0 || points.len() <= 2 {
            return route.clone();
        }

        let last = points.len() - 1;
        let jittered = points
            .iter()
            .enumerate()
            .map(|(index, &point)| {
                if index == 0 || index == last {
                    return point;
                }
                let offset = Vec2::new(
                    rng.gen_range(-1.0_f32..1.0) * amount,
                    rng.gen_range(-1.0_f32..1.0) * amount,
                );
                let candidate = point + offset;
                if blocked.contains(self.grid.cell_from_point(candidate)) {
                    point
                } else {
                    candidate
                }
            })
            .collect();
        Route::new(jittered)
    }

    fn prepare(&mut self) {
        let cell_count = self.grid.cell_count();
        if self.costs.len() != cell_count {
            self.costs = vec![u32::MAX; cell_count];
            self.came_from = vec![UNVISITED; cell_count];
        } else {
            self.costs.fill(u32::MAX);
            self.came_from.fill(UNVISITED);
        }
        self.open.clear();
    }

    fn reconstruct(&self, start_index: usize, goal_index: usize) -> Option<Route> {
        let mut indices = vec![goal_index];
        let mut current = goal_index;
        while current != start_index {
            current = *self.came_from.get(current)?;
            if current == UNVISITED || indices.len() > self.costs.len() {
                return None;
            }
            indices.push(current);
        }

        let points = indices
            .into_iter()
            .rev()
            .filter_map(|index| self.grid.cell_at(index))
            .map(|cell| self.grid.point_from_cell(cell))
            .collect();
        Some(Route::new(points))
    }

    fn random_open_cell<R: Rng + ?Sized>(
        &self,
        start: CellCoord,
        goal: CellCoord,
        blocked: &BlockedCells,
        rng: &mut R,
    ) -> Option<CellCoord> {
        if self.grid.columns() <= 0 || self.grid.rows() <= 0 {
            return None;
        }
        for _ in 0..OPEN_CELL_SAMPLES {
            let cell = CellCoord::new(
                rng.gen_range(0..self.grid.columns()),
                rng.gen_range(0..self.grid.rows()),
            );
            if blocked.contains(cell) || cell == start || cell == goal {
                continue;
            }
            return Some(cell);
        }
        None
    }
}

/// Open-set entry ordered so that the lowest priority pops first.
#[derive(Clone, Copy, Debug)]
struct OpenNode {
    priority: f32,
    cost: u32,
    index: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.index.cmp(&self.index))
    }
}
