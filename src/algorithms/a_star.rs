use crate::algorithms::common::Planner;
use crate::error::{PlannerError, Result};
use crate::grid::{Bounds, Grid, Position};
use log::trace;
use pathfinding::prelude::astar;
use rustc_hash::FxHashSet;

/// Full-replanning baseline: runs A* from scratch on every move, using the
/// `pathfinding` crate.
pub struct AStarReplanner {
    bounds: Bounds,
    goal: Position,
    known_obstacles: FxHashSet<Position>,
    expansions: usize,
    last_path: Vec<Position>,
}

impl AStarReplanner {
    pub fn new<I>(bounds: Bounds, goal: Position, known_obstacles: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        AStarReplanner {
            bounds,
            goal,
            known_obstacles: known_obstacles.into_iter().collect(),
            expansions: 0,
            last_path: Vec::new(),
        }
    }

    /// Builds a planner that knows every cell currently blocked in `grid`.
    pub fn from_grid(grid: &Grid) -> Self {
        Self::new(grid.bounds(), grid.goal, grid.blocked_cells())
    }

    /// Finds a path from `from` to the goal avoiding known obstacles.
    ///
    /// # Returns
    ///
    /// The path including both endpoints, or `None` if the goal is unreachable.
    pub fn find_path(&mut self, from: Position) -> Result<Option<Vec<Position>>> {
        self.bounds.check(from)?;
        let goal = self.goal;
        let bounds = self.bounds;
        let known = &self.known_obstacles;
        let mut expanded = 0;

        let result = astar(
            &from,
            |p| {
                expanded += 1;
                bounds
                    .neighbors_unchecked(*p)
                    .into_iter()
                    .filter(|n| !known.contains(n))
                    .map(|n| (n, 1usize))
                    .collect::<Vec<_>>()
            },
            |p| p.manhattan_distance(&goal),
            |p| *p == goal,
        );

        self.expansions += expanded;
        trace!("A* from {:?} expanded {} nodes", from, expanded);
        Ok(result.map(|(path, _)| path))
    }
}

impl Planner for AStarReplanner {
    fn name(&self) -> &'static str {
        "a_star"
    }

    fn observe_obstacles(&mut self, cells: &[Position]) -> Result<()> {
        for &pos in cells {
            self.known_obstacles.insert(self.bounds.check(pos)?);
        }
        Ok(())
    }

    fn next_move(&mut self, current: Position) -> Result<Position> {
        let path = self.find_path(current)?.unwrap_or_default();
        let next = path
            .get(1)
            .copied()
            .ok_or(PlannerError::NoPathFound { from: current });
        self.last_path = path;
        next
    }

    fn planned_path(&self, from: Position) -> Vec<Position> {
        match self.last_path.iter().position(|p| *p == from) {
            Some(index) => self.last_path[index..].to_vec(),
            None => Vec::new(),
        }
    }

    fn expansions(&self) -> usize {
        self.expansions
    }
}

/// Length of the shortest path between `from` and `to` through the grid's free cells.
pub fn shortest_path_length(grid: &Grid, from: Position, to: Position) -> Result<Option<usize>> {
    let bounds = grid.bounds();
    bounds.check(from)?;
    bounds.check(to)?;

    let result = astar(
        &from,
        |p| {
            bounds
                .neighbors_unchecked(*p)
                .into_iter()
                .filter(|n| matches!(grid.is_blocked(*n), Ok(false)))
                .map(|n| (n, 1usize))
                .collect::<Vec<_>>()
        },
        |p| p.manhattan_distance(&to),
        |p| *p == to,
    );
    Ok(result.map(|(_, cost)| cost))
}
