use crate::algorithms::common::Planner;
use crate::algorithms::frontier::{Frontier, Key};
use crate::error::{PlannerError, Result};
use crate::grid::{Grid, Position};
use crate::vertex::{Consistency, Cost, Vertex, VertexStore, INFINITY};
use log::{debug, trace, warn};
use rustc_hash::FxHashSet;

/// Tuning for the D* Lite engine.
#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    /// Maximum number of vertex expansions per `compute_shortest_path` call.
    /// `None` runs every call to convergence.
    pub max_expansions: Option<usize>,
    /// Re-anchor the heuristic and termination test to the agent as it moves.
    /// Off by default: the start captured at construction is kept for the whole run.
    pub anchor_to_agent: bool,
}

/// Running totals of engine work, for progress reporting and locality checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCounters {
    pub update_vertex_calls: usize,
    pub expansions: usize,
    pub pushes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The start is consistent and nothing left in the frontier can improve it.
    Converged,
    /// The expansion budget ran out; calling again resumes the search.
    BudgetExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub expansions: usize,
    pub status: SearchStatus,
}

/// Manhattan distance between two cells.
pub fn heuristic(a: Position, b: Position) -> Cost {
    a.manhattan_distance(&b) as Cost
}

fn key_for(vertices: &VertexStore, start: Position, pos: Position) -> Key {
    let vertex = vertices.vertex(pos);
    let min_score = vertex.g.min(vertex.rhs);
    Key {
        k1: min_score.saturating_add(heuristic(pos, start)),
        k2: min_score,
    }
}

/// Incremental D* Lite planner.
///
/// Searches backwards from the goal, keeping a `g`/`rhs` pair per cell so that
/// newly discovered obstacles only disturb the vertices whose estimates
/// actually depend on them.
pub struct DStarLite {
    vertices: VertexStore,
    frontier: Frontier,
    start: Position,
    goal: Position,
    visited: FxHashSet<Position>,
    counters: SearchCounters,
    config: PlannerConfig,
    search_pending: bool,
}

impl DStarLite {
    pub fn new(
        vertices: VertexStore,
        start: Position,
        goal: Position,
        config: PlannerConfig,
    ) -> Result<Self> {
        let bounds = vertices.bounds();
        bounds.check(start)?;
        bounds.check(goal)?;
        Ok(DStarLite {
            vertices,
            frontier: Frontier::new(),
            start,
            goal,
            visited: FxHashSet::default(),
            counters: SearchCounters::default(),
            config,
            search_pending: false,
        })
    }

    /// Builds a planner that knows every cell currently blocked in `grid`.
    pub fn from_grid(grid: &Grid, config: PlannerConfig) -> Result<Self> {
        let vertices =
            VertexStore::with_obstacles(grid.width(), grid.height(), grid.blocked_cells())?;
        Self::new(vertices, grid.start, grid.goal, config)
    }

    /// Seeds the goal and runs the first search.
    pub fn initialize(&mut self) -> Result<SearchReport> {
        if self.vertices.vertex(self.goal).is_obstacle
            || self.vertices.vertex(self.start).is_obstacle
        {
            return Err(PlannerError::NoPathFound { from: self.start });
        }

        self.vertices.vertex_mut(self.goal).rhs = 0;
        self.push(self.goal);
        let report = self.compute_shortest_path();
        debug!(
            "Initial search from {:?} to {:?}: {} expansions, g(start) = {}",
            self.start,
            self.goal,
            report.expansions,
            self.vertices.vertex(self.start).g
        );
        Ok(report)
    }

    pub fn edge_cost(&self, u: Position, v: Position) -> Result<Cost> {
        let bounds = self.vertices.bounds();
        bounds.check(u)?;
        bounds.check(v)?;
        Ok(self.cost(u, v))
    }

    /// Cost of stepping from `_u` into `v`; depends only on the target cell.
    fn cost(&self, _u: Position, v: Position) -> Cost {
        if self.vertices.vertex(v).is_obstacle {
            INFINITY
        } else {
            1
        }
    }

    pub fn key(&self, pos: Position) -> Result<Key> {
        self.vertices.bounds().check(pos)?;
        Ok(self.calculate_key(pos))
    }

    fn calculate_key(&self, pos: Position) -> Key {
        key_for(&self.vertices, self.start, pos)
    }

    /// Recomputes `rhs(u)` and requeues `u` if it is inconsistent.
    ///
    /// Neighbors are not touched; callers update every vertex whose `rhs`
    /// may depend on a change.
    pub fn update_vertex(&mut self, u: Position) -> Result<()> {
        self.vertices.bounds().check(u)?;
        self.refresh(u);
        Ok(())
    }

    fn refresh(&mut self, u: Position) {
        self.counters.update_vertex_calls += 1;

        if u != self.goal {
            let rhs = self
                .vertices
                .neighbors_unchecked(u)
                .into_iter()
                .map(|s| self.cost(u, s).saturating_add(self.vertices.vertex(s).g))
                .min()
                .unwrap_or(INFINITY);
            self.vertices.vertex_mut(u).rhs = rhs;
        }

        self.frontier.remove(u);

        let vertex = self.vertices.vertex(u);
        if !vertex.is_consistent() {
            trace!("Queueing {:?} (g = {}, rhs = {})", u, vertex.g, vertex.rhs);
            self.push(u);
        }
    }

    fn push(&mut self, u: Position) {
        let key = self.calculate_key(u);
        if self.frontier.push(u, key) {
            self.counters.pushes += 1;
            self.visited.insert(u);
        }
    }

    /// Expands vertices until the start is consistent and no queued vertex
    /// is prioritized ahead of it, the frontier empties, or the budget runs out.
    pub fn compute_shortest_path(&mut self) -> SearchReport {
        let mut expansions = 0;
        let mut status = SearchStatus::Converged;

        while !self.frontier.is_empty() {
            let start = *self.vertices.vertex(self.start);
            let start_key = self.calculate_key(self.start);
            if start_key <= self.frontier.peek_key() && start.rhs == start.g {
                break;
            }

            if self.config.max_expansions.is_some_and(|max| expansions >= max) {
                status = SearchStatus::BudgetExhausted;
                break;
            }

            let Some((_, u)) = self.frontier.pop() else {
                break;
            };
            expansions += 1;
            self.expand(u);
        }

        self.search_pending = status == SearchStatus::BudgetExhausted;
        if self.search_pending {
            debug!(
                "Search budget of {} expansions exhausted with {} vertices queued",
                expansions,
                self.frontier.len()
            );
        }
        SearchReport { expansions, status }
    }

    fn expand(&mut self, u: Position) {
        self.counters.expansions += 1;
        self.visited.insert(u);

        let vertex = *self.vertices.vertex(u);
        if vertex.consistency() == Consistency::Overconsistent {
            self.vertices.vertex_mut(u).g = vertex.rhs;
        } else {
            self.vertices.vertex_mut(u).g = INFINITY;
            self.refresh(u);
        }
        for s in self.vertices.neighbors_unchecked(u) {
            self.refresh(s);
        }
    }

    /// Expands every queued vertex, ignoring the termination test and budget.
    ///
    /// Afterwards every vertex is consistent, so `g` is exact for each cell
    /// under the known obstacles, not only along paths from the start.
    pub fn settle(&mut self) -> usize {
        let mut expansions = 0;
        while let Some((_, u)) = self.frontier.pop() {
            expansions += 1;
            self.expand(u);
        }
        self.search_pending = false;
        expansions
    }

    /// Picks the non-obstacle neighbor of `current` minimizing `cost + g`.
    ///
    /// Ties go to the first neighbor in direction order. Fails with
    /// `NoPathFound` when no neighbor offers a finite cost.
    pub fn get_next_move(&self, current: Position) -> Result<Position> {
        self.vertices.bounds().check(current)?;

        let mut best: Option<(Cost, Position)> = None;
        for s in self.vertices.neighbors_unchecked(current) {
            if self.vertices.vertex(s).is_obstacle {
                continue;
            }
            let cost = self.cost(current, s).saturating_add(self.vertices.vertex(s).g);
            if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                best = Some((cost, s));
            }
        }

        match best {
            Some((cost, next)) if cost != INFINITY => Ok(next),
            _ => Err(PlannerError::NoPathFound { from: current }),
        }
    }

    /// Marks `pos` as an obstacle and updates its neighbors, then the cell itself.
    ///
    /// Returns `false` without touching anything if the cell was already known.
    pub fn mark_obstacle(&mut self, pos: Position) -> Result<bool> {
        if !self.vertices.mark_obstacle(pos)? {
            return Ok(false);
        }
        self.cascade(pos);
        Ok(true)
    }

    fn cascade(&mut self, pos: Position) {
        debug!("Obstacle discovered at {:?}", pos);
        for s in self.vertices.neighbors_unchecked(pos) {
            self.refresh(s);
        }
        // Kept for state consistency; a blocked cell's own estimate never
        // enters a path cost.
        self.refresh(pos);
    }

    /// Applies newly blocked cells and restores consistency.
    pub fn replan(&mut self, cells: &[Position]) -> Result<SearchReport> {
        let mut changed = Vec::with_capacity(cells.len());
        for &pos in cells {
            if self.vertices.mark_obstacle(pos)? {
                changed.push(pos);
            }
        }
        for &pos in &changed {
            self.cascade(pos);
        }

        let report = self.compute_shortest_path();
        debug!(
            "Replanned after {} new obstacles: {} expansions, g(start) = {}",
            changed.len(),
            report.expansions,
            self.vertices.vertex(self.start).g
        );
        Ok(report)
    }

    /// Moves the search anchor to `pos` and rebuilds every queued key.
    pub fn set_start(&mut self, pos: Position) -> Result<()> {
        self.vertices.bounds().check(pos)?;
        if pos == self.start {
            return Ok(());
        }
        self.start = pos;
        let vertices = &self.vertices;
        self.frontier.rekey(|p| key_for(vertices, pos, p));
        Ok(())
    }

    /// Follows `get_next_move` from `from` to the goal.
    pub fn extract_path(&self, from: Position) -> Result<Vec<Position>> {
        let mut path = vec![from];
        let mut current = from;
        while current != self.goal {
            current = self.get_next_move(current)?;
            path.push(current);
            if path.len() > self.vertices.len() {
                return Err(PlannerError::NoPathFound { from });
            }
        }
        Ok(path)
    }

    pub fn g(&self, pos: Position) -> Result<Cost> {
        Ok(self.vertices.get(pos)?.g)
    }

    pub fn rhs(&self, pos: Position) -> Result<Cost> {
        Ok(self.vertices.get(pos)?.rhs)
    }

    pub fn vertex(&self, pos: Position) -> Result<&Vertex> {
        self.vertices.get(pos)
    }

    pub fn vertices(&self) -> &VertexStore {
        &self.vertices
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Every vertex that has been queued or expanded.
    pub fn visited(&self) -> &FxHashSet<Position> {
        &self.visited
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn frontier_physical_len(&self) -> usize {
        self.frontier.physical_len()
    }

    pub fn counters(&self) -> SearchCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = SearchCounters::default();
    }

    pub fn is_search_pending(&self) -> bool {
        self.search_pending
    }
}

impl Planner for DStarLite {
    fn name(&self) -> &'static str {
        "d_star_lite"
    }

    fn observe_obstacles(&mut self, cells: &[Position]) -> Result<()> {
        self.replan(cells)?;
        Ok(())
    }

    fn advance(&mut self, position: Position) -> Result<()> {
        if self.config.anchor_to_agent {
            self.set_start(position)?;
            self.compute_shortest_path();
        }
        Ok(())
    }

    fn next_move(&mut self, current: Position) -> Result<Position> {
        let mut slices = 0;
        while self.search_pending {
            self.compute_shortest_path();
            slices += 1;
        }
        if slices > 0 {
            warn!("Search needed {} more budgeted slices before moving", slices);
        }

        // Keys stay anchored to the start, so estimates away from it may still
        // be queued. Moving only from consistent cells keeps `g` descending.
        let stale = !self.vertices.get(current)?.is_consistent();
        match self.get_next_move(current) {
            Ok(next) if !stale => Ok(next),
            result if self.frontier.is_empty() => result,
            _ => {
                let expansions = self.settle();
                debug!(
                    "Settled {} queued vertices before moving from {:?}",
                    expansions, current
                );
                self.get_next_move(current)
            }
        }
    }

    fn planned_path(&self, from: Position) -> Vec<Position> {
        self.extract_path(from).unwrap_or_default()
    }

    fn cost_to_goal(&self, pos: Position) -> Option<Cost> {
        self.g(pos).ok()
    }

    fn expansions(&self) -> usize {
        self.counters.expansions
    }

    fn touched(&self) -> Option<&FxHashSet<Position>> {
        Some(&self.visited)
    }
}
