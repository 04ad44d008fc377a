//! Per-cell incremental search state.
//!
//! The store holds the planner's knowledge of the grid: one [`Vertex`] for
//! every cell, created up front and kept for the lifetime of the planner.

use crate::error::Result;
use crate::grid::{Bounds, Position};

/// Path cost. [`INFINITY`] marks an unreachable or blocked estimate.
pub type Cost = u32;

pub const INFINITY: Cost = Cost::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    Consistent,
    /// `g > rhs`: a cost decrease still has to be propagated.
    Overconsistent,
    /// `g < rhs`: the estimate is stale and has to be invalidated.
    Underconsistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    pub position: Position,
    pub g: Cost,
    pub rhs: Cost,
    pub is_obstacle: bool,
}

impl Vertex {
    fn new(position: Position) -> Self {
        Vertex {
            position,
            g: INFINITY,
            rhs: INFINITY,
            is_obstacle: false,
        }
    }

    pub fn consistency(&self) -> Consistency {
        use std::cmp::Ordering;
        match self.g.cmp(&self.rhs) {
            Ordering::Equal => Consistency::Consistent,
            Ordering::Greater => Consistency::Overconsistent,
            Ordering::Less => Consistency::Underconsistent,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.g == self.rhs
    }
}

#[derive(Debug, Clone)]
pub struct VertexStore {
    bounds: Bounds,
    vertices: Vec<Vertex>,
}

impl VertexStore {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let bounds = Bounds::new(width, height)?;
        let vertices = (0..bounds.cell_count())
            .map(|index| Vertex::new(bounds.position(index)))
            .collect();
        Ok(VertexStore { bounds, vertices })
    }

    /// Builds a store whose obstacle flags are already set for `obstacles`.
    pub fn with_obstacles<I>(width: usize, height: usize, obstacles: I) -> Result<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut store = Self::new(width, height)?;
        for pos in obstacles {
            store.mark_obstacle(pos)?;
        }
        Ok(store)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn get(&self, pos: Position) -> Result<&Vertex> {
        let pos = self.bounds.check(pos)?;
        Ok(self.vertex(pos))
    }

    pub fn is_obstacle(&self, pos: Position) -> Result<bool> {
        Ok(self.get(pos)?.is_obstacle)
    }

    pub fn neighbors(&self, pos: Position) -> Result<Vec<Position>> {
        self.bounds.neighbors(pos)
    }

    /// Sets the obstacle flag. Returns `false` if the cell was already an obstacle.
    pub fn mark_obstacle(&mut self, pos: Position) -> Result<bool> {
        let pos = self.bounds.check(pos)?;
        let vertex = self.vertex_mut(pos);
        if vertex.is_obstacle {
            return Ok(false);
        }
        vertex.is_obstacle = true;
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // Unchecked accessors for positions already known to be in bounds.

    pub(crate) fn vertex(&self, pos: Position) -> &Vertex {
        &self.vertices[self.bounds.index(pos)]
    }

    pub(crate) fn vertex_mut(&mut self, pos: Position) -> &mut Vertex {
        let index = self.bounds.index(pos);
        &mut self.vertices[index]
    }

    pub(crate) fn neighbors_unchecked(&self, pos: Position) -> Vec<Position> {
        self.bounds.neighbors_unchecked(pos)
    }
}
