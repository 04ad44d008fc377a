use crate::error::Result;
use crate::grid::Position;
use crate::vertex::Cost;
use rustc_hash::FxHashSet;

/// What the simulation driver needs from a planner.
pub trait Planner {
    fn name(&self) -> &'static str;

    /// Reports cells newly found to be blocked and restores the plan.
    fn observe_obstacles(&mut self, cells: &[Position]) -> Result<()>;

    /// Called after the agent has moved to `position`.
    fn advance(&mut self, _position: Position) -> Result<()> {
        Ok(())
    }

    /// Next hop from `current` toward the goal.
    fn next_move(&mut self, current: Position) -> Result<Position>;

    /// Projected route from `from` to the goal, empty if none is known.
    fn planned_path(&self, from: Position) -> Vec<Position>;

    /// Current cost-to-goal estimate, for planners that keep one per cell.
    fn cost_to_goal(&self, _pos: Position) -> Option<Cost> {
        None
    }

    /// Total vertices expanded so far.
    fn expansions(&self) -> usize;

    /// Cells touched by the search, for rendering.
    fn touched(&self) -> Option<&FxHashSet<Position>> {
        None
    }
}
