use crate::algorithms::d_star_lite::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::grid::{Bounds, Position};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    #[value(name = "d_star_lite")]
    DStarLite,
    #[value(name = "a_star")]
    AStar,
    /// Run every planner on the same environment and compare.
    All,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::DStarLite => write!(f, "d_star_lite"),
            Algorithm::AStar => write!(f, "a_star"),
            Algorithm::All => write!(f, "all"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// TOML map layout; the built-in 20x20 layout is used when omitted
    #[arg(long)]
    pub map: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Algorithm::DStarLite)]
    pub algorithm: Algorithm,

    /// How far the agent sees obstacles around itself
    #[arg(long, default_value_t = 1)]
    pub sensor_range: usize,

    /// Steps between random obstacle waves
    #[arg(long, default_value_t = 5)]
    pub obstacle_interval: usize,

    /// Random obstacles per wave (0 disables waves)
    #[arg(long, default_value_t = 0)]
    pub obstacles_per_wave: usize,

    /// Seed for random obstacle waves
    #[arg(long)]
    pub seed: Option<u64>,

    /// Expansion budget per search call
    #[arg(long)]
    pub max_expansions: Option<usize>,

    /// Re-anchor the D* Lite heuristic to the agent after every move
    #[arg(long, default_value_t = false)]
    pub anchor_to_agent: bool,

    /// Step limit (0 = four times the cell count)
    #[arg(long, default_value_t = 0)]
    pub max_steps: usize,

    #[arg(long, default_value_t = 50)]
    pub delay_ms: u64,

    #[arg(long, default_value_t = false)]
    pub no_visualization: bool,

    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map: None,
            algorithm: Algorithm::DStarLite,
            sensor_range: 1,
            obstacle_interval: 5,
            obstacles_per_wave: 0,
            seed: None,
            max_expansions: None,
            anchor_to_agent: false,
            max_steps: 0,
            delay_ms: 50,
            no_visualization: true,
            quiet: true,
        }
    }
}

impl Config {
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_expansions: self.max_expansions,
            anchor_to_agent: self.anchor_to_agent,
        }
    }

    pub fn load_layout(&self) -> Result<MapLayout> {
        match &self.map {
            Some(path) => MapLayout::load(path),
            None => Ok(MapLayout::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensor_range == 0 {
            return Err(PlannerError::Config(
                "sensor_range must be at least 1".to_string(),
            ));
        }
        if self.obstacles_per_wave > 0 && self.obstacle_interval == 0 {
            return Err(PlannerError::Config(
                "obstacle_interval must be positive when obstacle waves are enabled".to_string(),
            ));
        }
        if self.max_expansions == Some(0) {
            return Err(PlannerError::Config(
                "max_expansions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Inclusive rectangle of static obstacle cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleRun {
    pub from: Position,
    pub to: Position,
}

impl ObstacleRun {
    pub fn new(from: Position, to: Position) -> Self {
        ObstacleRun { from, to }
    }

    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let (x0, x1) = (self.from.x.min(self.to.x), self.from.x.max(self.to.x));
        let (y0, y1) = (self.from.y.min(self.to.y), self.from.y.max(self.to.y));
        (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| Position { x, y }))
    }

    pub fn contains(&self, pos: Position) -> bool {
        let (x0, x1) = (self.from.x.min(self.to.x), self.from.x.max(self.to.x));
        let (y0, y1) = (self.from.y.min(self.to.y), self.from.y.max(self.to.y));
        (x0..=x1).contains(&pos.x) && (y0..=y1).contains(&pos.y)
    }
}

/// Cells that become obstacles once the agent has taken `step` moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleEvent {
    pub step: usize,
    pub cells: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    pub width: usize,
    pub height: usize,
    pub start: Position,
    pub goal: Position,
    #[serde(default)]
    pub obstacle_runs: Vec<ObstacleRun>,
    #[serde(default)]
    pub events: Vec<ObstacleEvent>,
}

impl Default for MapLayout {
    fn default() -> Self {
        let run = |x0, y0, x1, y1| ObstacleRun::new(Position::new(x0, y0), Position::new(x1, y1));
        MapLayout {
            width: 20,
            height: 20,
            start: Position::new(2, 3),
            goal: Position::new(17, 14),
            obstacle_runs: vec![
                run(5, 8, 9, 8),
                run(15, 5, 15, 14),
                run(12, 2, 12, 6),
                run(8, 12, 8, 15),
                run(1, 10, 3, 10),
            ],
            events: Vec::new(),
        }
    }
}

impl MapLayout {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let layout: MapLayout = toml::from_str(&text)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        let bounds = Bounds::new(self.width, self.height)?;
        bounds.check(self.start)?;
        bounds.check(self.goal)?;
        if self.start == self.goal {
            return Err(PlannerError::Config(
                "start and goal must be different cells".to_string(),
            ));
        }

        for run in &self.obstacle_runs {
            bounds.check(run.from)?;
            bounds.check(run.to)?;
            if run.contains(self.start) || run.contains(self.goal) {
                return Err(PlannerError::Config(format!(
                    "obstacle run {:?}..{:?} covers the start or goal",
                    run.from, run.to
                )));
            }
        }

        for event in &self.events {
            for &cell in &event.cells {
                bounds.check(cell)?;
            }
        }
        Ok(())
    }
}
