use crate::config::MapLayout;
use crate::error::{PlannerError, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Neighbor enumeration order. `get_next_move` breaks ties by this order.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 0), (0, -1)];

/// Dimensions of a grid and the 4-connected neighborhood inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PlannerError::Config(format!(
                "grid dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Bounds { width, height })
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Rejects out-of-bounds positions instead of clamping them.
    pub fn check(&self, pos: Position) -> Result<Position> {
        if self.contains(pos) {
            Ok(pos)
        } else {
            Err(PlannerError::InvalidCoordinate {
                position: pos,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Row-major index of an in-bounds position.
    pub fn index(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    pub fn position(&self, index: usize) -> Position {
        Position {
            x: index % self.width,
            y: index / self.width,
        }
    }

    /// In-bounds 4-connected neighbors of `pos`, in `DIRECTIONS` order.
    pub fn neighbors(&self, pos: Position) -> Result<Vec<Position>> {
        self.check(pos)?;
        Ok(self.neighbors_unchecked(pos))
    }

    pub(crate) fn neighbors_unchecked(&self, pos: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(DIRECTIONS.len());
        for (dx, dy) in DIRECTIONS {
            let nx = pos.x.checked_add_signed(dx);
            let ny = pos.y.checked_add_signed(dy);
            if let (Some(x), Some(y)) = (nx, ny) {
                let next = Position { x, y };
                if self.contains(next) {
                    neighbors.push(next);
                }
            }
        }
        neighbors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    /// Static obstacle seeded from the map layout.
    Wall,
    /// Obstacle that appeared while the agent was moving.
    Obstacle,
}

/// Ground-truth world the agent moves through.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: Bounds,
    cells: Vec<Cell>,
    pub start: Position,
    pub goal: Position,
}

impl Grid {
    pub fn new(width: usize, height: usize, start: Position, goal: Position) -> Result<Self> {
        let bounds = Bounds::new(width, height)?;
        bounds.check(start)?;
        bounds.check(goal)?;
        Ok(Grid {
            bounds,
            cells: vec![Cell::Empty; bounds.cell_count()],
            start,
            goal,
        })
    }

    pub fn from_layout(layout: &MapLayout) -> Result<Self> {
        layout.validate()?;
        let mut grid = Grid::new(layout.width, layout.height, layout.start, layout.goal)?;
        for run in &layout.obstacle_runs {
            for pos in run.cells() {
                let index = grid.bounds.check(pos).map(|p| grid.bounds.index(p))?;
                grid.cells[index] = Cell::Wall;
            }
        }
        Ok(grid)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn width(&self) -> usize {
        self.bounds.width
    }

    pub fn height(&self) -> usize {
        self.bounds.height
    }

    pub fn cell(&self, pos: Position) -> Result<Cell> {
        let pos = self.bounds.check(pos)?;
        Ok(self.cells[self.bounds.index(pos)])
    }

    pub fn is_blocked(&self, pos: Position) -> Result<bool> {
        Ok(self.cell(pos)? != Cell::Empty)
    }

    /// Marks `pos` as a dynamic obstacle. Returns `false` if it was already blocked.
    pub fn place_obstacle(&mut self, pos: Position) -> Result<bool> {
        let pos = self.bounds.check(pos)?;
        let index = self.bounds.index(pos);
        if self.cells[index] != Cell::Empty {
            return Ok(false);
        }
        self.cells[index] = Cell::Obstacle;
        Ok(true)
    }

    pub fn neighbors(&self, pos: Position) -> Result<Vec<Position>> {
        self.bounds.neighbors(pos)
    }

    /// Every blocked cell, walls and dynamic obstacles alike.
    pub fn blocked_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell != Cell::Empty)
            .map(|(index, _)| self.bounds.position(index))
    }

    /// Text picture of the grid with the agent, projected path and searched cells.
    pub fn render(
        &self,
        agent: Option<Position>,
        path: &[Position],
        touched: Option<&FxHashSet<Position>>,
    ) -> String {
        let path: FxHashSet<Position> = path.iter().copied().collect();
        let mut out = String::new();
        out.push_str("Legend: S=Start, G=Goal, A=Agent, #=Wall, O=Obstacle, *=Path, +=Searched, .=Empty\n");

        out.push_str("   ");
        for x in 0..self.width() {
            let _ = write!(out, "{} ", x % 10);
        }
        out.push('\n');

        for y in 0..self.height() {
            let _ = write!(out, "{:2} ", y);
            for x in 0..self.width() {
                let pos = Position { x, y };
                let symbol = if Some(pos) == agent {
                    'A'
                } else if pos == self.start {
                    'S'
                } else if pos == self.goal {
                    'G'
                } else {
                    match self.cells[self.bounds.index(pos)] {
                        Cell::Wall => '#',
                        Cell::Obstacle => 'O',
                        Cell::Empty if path.contains(&pos) => '*',
                        Cell::Empty if touched.is_some_and(|t| t.contains(&pos)) => '+',
                        Cell::Empty => '.',
                    }
                };
                out.push(symbol);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_follow_direction_order() {
        let bounds = Bounds::new(3, 3).unwrap();
        let neighbors = bounds.neighbors(Position::new(1, 1)).unwrap();
        assert_eq!(
            neighbors,
            vec![
                Position::new(1, 2),
                Position::new(2, 1),
                Position::new(0, 1),
                Position::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_corner_has_two_neighbors() {
        let bounds = Bounds::new(5, 5).unwrap();
        let neighbors = bounds.neighbors(Position::new(0, 0)).unwrap();
        assert_eq!(neighbors, vec![Position::new(0, 1), Position::new(1, 0)]);

        let neighbors = bounds.neighbors(Position::new(4, 4)).unwrap();
        assert_eq!(neighbors, vec![Position::new(3, 4), Position::new(4, 3)]);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let bounds = Bounds::new(4, 2).unwrap();
        let err = bounds.neighbors(Position::new(4, 0)).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::InvalidCoordinate { width: 4, height: 2, .. }
        ));
        assert!(bounds.check(Position::new(0, 2)).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(Bounds::new(0, 5).is_err());
    }

    #[test]
    fn test_place_obstacle_only_once() {
        let mut grid = Grid::new(3, 3, Position::new(0, 0), Position::new(2, 2)).unwrap();
        assert!(grid.place_obstacle(Position::new(1, 1)).unwrap());
        assert!(!grid.place_obstacle(Position::new(1, 1)).unwrap());
        assert_eq!(grid.cell(Position::new(1, 1)).unwrap(), Cell::Obstacle);
        assert!(grid.is_blocked(Position::new(1, 1)).unwrap());
        assert!(grid.place_obstacle(Position::new(3, 1)).is_err());
    }

    #[test]
    fn test_render_marks_agent_and_path() {
        let mut grid = Grid::new(3, 2, Position::new(0, 0), Position::new(2, 1)).unwrap();
        grid.place_obstacle(Position::new(1, 0)).unwrap();
        let picture = grid.render(Some(Position::new(0, 1)), &[Position::new(1, 1)], None);
        let rows: Vec<&str> = picture.lines().skip(2).collect();
        assert_eq!(rows[0].trim_end(), " 0 S O .");
        assert_eq!(rows[1].trim_end(), " 1 A * G");
    }
}
