use crate::error::Result;
use crate::grid::{Grid, Position};
use rustc_hash::FxHashSet;

pub struct Agent {
    pub position: Position,
    pub sensor_range: usize,
    pub known_obstacles: FxHashSet<Position>,
}

impl Agent {
    /// Creates an agent that already knows the obstacles blocked in `grid` at startup.
    pub fn new(grid: &Grid, sensor_range: usize) -> Self {
        Agent {
            position: grid.start,
            sensor_range,
            known_obstacles: grid.blocked_cells().collect(),
        }
    }

    /// Returns blocked cells in range that the agent has not seen before.
    ///
    /// Range 1 covers the four neighbors; larger ranges cover the square window.
    pub fn observe(&mut self, grid: &Grid) -> Result<Vec<Position>> {
        let candidates = if self.sensor_range == 1 {
            grid.neighbors(self.position)?
        } else {
            let (min_x, max_x, min_y, max_y) = self.field_of_view_bounds(grid);
            (min_x..=max_x)
                .flat_map(|x| (min_y..=max_y).map(move |y| Position { x, y }))
                .filter(|pos| *pos != self.position)
                .collect()
        };

        let mut discovered = Vec::new();
        for pos in candidates {
            if grid.is_blocked(pos)? && self.known_obstacles.insert(pos) {
                discovered.push(pos);
            }
        }
        Ok(discovered)
    }

    /// Records cells reported to the agent without sensing them.
    pub fn learn(&mut self, cells: &[Position]) {
        self.known_obstacles.extend(cells.iter().copied());
    }

    pub fn move_to(&mut self, new_pos: Position) {
        self.position = new_pos;
    }

    pub fn field_of_view_bounds(&self, grid: &Grid) -> (usize, usize, usize, usize) {
        let min_x = self.position.x.saturating_sub(self.sensor_range);
        let max_x = (self.position.x + self.sensor_range).min(grid.width() - 1);
        let min_y = self.position.y.saturating_sub(self.sensor_range);
        let max_y = (self.position.y + self.sensor_range).min(grid.height() - 1);
        (min_x, max_x, min_y, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_reports_each_obstacle_once() {
        let mut grid = Grid::new(5, 5, Position::new(2, 2), Position::new(4, 4)).unwrap();
        let mut agent = Agent::new(&grid, 1);
        grid.place_obstacle(Position::new(2, 3)).unwrap();
        grid.place_obstacle(Position::new(3, 3)).unwrap();

        // (3,3) is diagonal and outside the four-neighborhood.
        assert_eq!(agent.observe(&grid).unwrap(), vec![Position::new(2, 3)]);
        assert!(agent.observe(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_wider_range_sees_window() {
        let mut grid = Grid::new(6, 6, Position::new(0, 0), Position::new(5, 5)).unwrap();
        let mut agent = Agent::new(&grid, 2);
        grid.place_obstacle(Position::new(2, 2)).unwrap();
        grid.place_obstacle(Position::new(3, 0)).unwrap();

        assert_eq!(agent.observe(&grid).unwrap(), vec![Position::new(2, 2)]);
        assert_eq!(agent.field_of_view_bounds(&grid), (0, 2, 0, 2));
    }

    #[test]
    fn test_startup_obstacles_are_known() {
        let mut grid = Grid::new(3, 3, Position::new(0, 0), Position::new(2, 2)).unwrap();
        grid.place_obstacle(Position::new(1, 0)).unwrap();
        let mut agent = Agent::new(&grid, 1);
        assert!(agent.observe(&grid).unwrap().is_empty());

        agent.learn(&[Position::new(0, 1)]);
        grid.place_obstacle(Position::new(0, 1)).unwrap();
        assert!(agent.observe(&grid).unwrap().is_empty());
    }
}
