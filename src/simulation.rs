use crate::agent::Agent;
use crate::algorithms::a_star::{shortest_path_length, AStarReplanner};
use crate::algorithms::common::Planner;
use crate::algorithms::d_star_lite::DStarLite;
use crate::config::{Algorithm, Config, MapLayout};
use crate::error::{PlannerError, Result};
use crate::grid::{Grid, Position};
use crate::statistics::{Statistics, TimingData};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use std::thread;
use std::time::{Duration, Instant};

/// Map layout plus the pre-generated random obstacle waves, shared by every
/// planner in a comparison run.
#[derive(Debug, Clone)]
pub struct EnvironmentSetup {
    pub layout: MapLayout,
    pub seed: u64,
    pub obstacle_waves: Vec<Vec<Position>>,
    pub wave_interval: usize,
}

impl EnvironmentSetup {
    pub fn generate(layout: MapLayout, config: &Config, seed: u64) -> Result<Self> {
        layout.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let static_cells: FxHashSet<Position> = layout
            .obstacle_runs
            .iter()
            .flat_map(|run| run.cells())
            .collect();

        let mut obstacle_waves = Vec::new();
        if config.obstacles_per_wave > 0 && config.obstacle_interval > 0 {
            let max_steps = max_steps_for(config, &layout);
            let num_waves = max_steps / config.obstacle_interval;

            for _ in 0..num_waves {
                let mut wave = Vec::with_capacity(config.obstacles_per_wave);
                let mut attempts = 0;
                let max_attempts = config.obstacles_per_wave * 10;

                while wave.len() < config.obstacles_per_wave && attempts < max_attempts {
                    let pos = Position {
                        x: rng.gen_range(0..layout.width),
                        y: rng.gen_range(0..layout.height),
                    };
                    if pos != layout.start
                        && pos != layout.goal
                        && !static_cells.contains(&pos)
                        && !wave.contains(&pos)
                    {
                        wave.push(pos);
                    }
                    attempts += 1;
                }
                obstacle_waves.push(wave);
            }
        }

        debug!(
            "Generated environment with seed {}: {} obstacle waves",
            seed,
            obstacle_waves.len()
        );

        Ok(EnvironmentSetup {
            layout,
            seed,
            obstacle_waves,
            wave_interval: config.obstacle_interval,
        })
    }
}

fn max_steps_for(config: &Config, layout: &MapLayout) -> usize {
    if config.max_steps > 0 {
        config.max_steps
    } else {
        layout.width * layout.height * 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ReachedGoal,
    /// The planner had no move left; terminal for this run.
    NoPath,
    StepLimit,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub termination: Termination,
    pub path: Vec<Position>,
    pub statistics: Statistics,
    pub timing: TimingData,
}

impl RunOutcome {
    pub fn reached_goal(&self) -> bool {
        self.termination == Termination::ReachedGoal
    }
}

#[derive(Debug, Clone)]
pub struct AlgorithmResult {
    pub name: String,
    pub outcome: RunOutcome,
}

/// Builds a ready-to-use planner for `world`.
pub fn build_planner(
    algorithm: Algorithm,
    world: &Grid,
    config: &Config,
) -> Result<Box<dyn Planner>> {
    match algorithm {
        Algorithm::DStarLite => {
            let mut planner = DStarLite::from_grid(world, config.planner_config())?;
            planner.initialize()?;
            Ok(Box::new(planner))
        }
        Algorithm::AStar => Ok(Box::new(AStarReplanner::from_grid(world))),
        Algorithm::All => Err(PlannerError::Config(
            "'all' runs a comparison, not a single planner".to_string(),
        )),
    }
}

pub struct Simulation {
    world: Grid,
    agent: Agent,
    planner: Box<dyn Planner>,
    config: Config,
    environment: EnvironmentSetup,
    optimal_path_length: Option<usize>,
    max_steps: usize,
}

impl Simulation {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let layout = config.load_layout()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let environment = EnvironmentSetup::generate(layout, &config, seed)?;
        let algorithm = config.algorithm;
        Self::with_environment(config, environment, algorithm)
    }

    pub fn with_environment(
        config: Config,
        environment: EnvironmentSetup,
        algorithm: Algorithm,
    ) -> Result<Self> {
        let world = Grid::from_layout(&environment.layout)?;
        let optimal_path_length = shortest_path_length(&world, world.start, world.goal)?;
        if optimal_path_length.is_none() {
            warn!("Goal {:?} is unreachable from {:?} at startup", world.goal, world.start);
        }
        let planner = build_planner(algorithm, &world, &config)?;
        let agent = Agent::new(&world, config.sensor_range);
        let max_steps = max_steps_for(&config, &environment.layout);

        Ok(Simulation {
            world,
            agent,
            planner,
            config,
            environment,
            optimal_path_length,
            max_steps,
        })
    }

    pub fn world(&self) -> &Grid {
        &self.world
    }

    pub fn agent_position(&self) -> Position {
        self.agent.position
    }

    pub fn planner(&self) -> &dyn Planner {
        self.planner.as_ref()
    }

    /// Shortest start-to-goal length on the initial map, if the goal is reachable.
    pub fn optimal_path_length(&self) -> Option<usize> {
        self.optimal_path_length
    }

    fn visualize(&self) -> bool {
        !self.config.no_visualization && !self.config.quiet
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        let mut stats = Statistics::new(self.optimal_path_length);
        let mut timing = TimingData::new();
        let mut path = vec![self.agent.position];
        let mut step = 0;

        info!(
            "Running {} from {:?} to {:?} (optimal length {:?})",
            self.planner.name(),
            self.world.start,
            self.world.goal,
            self.optimal_path_length
        );

        self.sense_and_replan(step, &mut stats, &mut timing)?;
        if self.visualize() {
            self.render_frame(step, &stats, &[]);
        }

        let termination = loop {
            if self.agent.position == self.world.goal {
                break Termination::ReachedGoal;
            }
            if step >= self.max_steps {
                warn!("Step limit of {} reached at {:?}", self.max_steps, self.agent.position);
                break Termination::StepLimit;
            }

            let move_start = Instant::now();
            let next = match self.planner.next_move(self.agent.position) {
                Ok(next) => next,
                Err(PlannerError::NoPathFound { from }) => {
                    warn!("No path to the goal from {:?}, stopping", from);
                    break Termination::NoPath;
                }
                Err(e) => return Err(e),
            };
            timing.move_times.push(move_start.elapsed());

            self.agent.move_to(next);
            self.planner.advance(next)?;
            path.push(next);
            stats.total_moves += 1;
            step += 1;

            let discovered = self.sense_and_replan(step, &mut stats, &mut timing)?;
            self.report_progress(step, &stats, &discovered);
        };

        stats.expansions = self.planner.expansions();
        stats.calculate_efficiency();

        if self.visualize() {
            self.render_frame(step, &stats, &[]);
            match termination {
                Termination::ReachedGoal => println!("SUCCESS: Agent reached the goal!"),
                Termination::NoPath => println!("FAILED: No path to the goal"),
                Termination::StepLimit => println!("FAILED: Step limit reached"),
            }
        }

        Ok(RunOutcome {
            termination,
            path,
            statistics: stats,
            timing,
        })
    }

    /// Applies this step's obstacles, senses, and feeds every new cell to the planner.
    fn sense_and_replan(
        &mut self,
        step: usize,
        stats: &mut Statistics,
        timing: &mut TimingData,
    ) -> Result<Vec<Position>> {
        let reported = self.apply_obstacles(step)?;
        self.agent.learn(&reported);

        let mut discovered = self.agent.observe(&self.world)?;
        discovered.extend(reported);

        if !discovered.is_empty() {
            let replan_start = Instant::now();
            self.planner.observe_obstacles(&discovered)?;
            timing.replan_times.push(replan_start.elapsed());
            stats.replans += 1;
            stats.obstacles_discovered += discovered.len();
        }
        Ok(discovered)
    }

    /// Places scripted and random obstacles due at `step`. Returns the
    /// scripted cells, which the planner is told about directly.
    fn apply_obstacles(&mut self, step: usize) -> Result<Vec<Position>> {
        let scripted: Vec<Position> = self
            .environment
            .layout
            .events
            .iter()
            .filter(|event| event.step == step)
            .flat_map(|event| event.cells.iter().copied())
            .collect();

        let mut reported = Vec::new();
        for pos in scripted {
            if self.is_valid_obstacle_position(pos) && self.world.place_obstacle(pos)? {
                info!("New obstacle at {:?}", pos);
                reported.push(pos);
            }
        }

        let interval = self.environment.wave_interval;
        if interval > 0 && step > 0 && step % interval == 0 {
            if let Some(wave) = self.environment.obstacle_waves.get(step / interval - 1) {
                let wave = wave.clone();
                let mut placed = 0;
                for pos in wave {
                    if self.is_valid_obstacle_position(pos) && self.world.place_obstacle(pos)? {
                        placed += 1;
                    }
                }
                debug!("Obstacle wave at step {}: {} cells placed", step, placed);
            }
        }
        Ok(reported)
    }

    fn is_valid_obstacle_position(&self, pos: Position) -> bool {
        pos != self.world.start && pos != self.world.goal && pos != self.agent.position
    }

    fn report_progress(&self, step: usize, stats: &Statistics, discovered: &[Position]) {
        info!("Step {}: agent at {:?}", step, self.agent.position);
        if log::log_enabled!(log::Level::Debug) {
            for node in self.planner.planned_path(self.agent.position) {
                match self.planner.cost_to_goal(node) {
                    Some(g) => debug!("  path node {:?}, g = {}", node, g),
                    None => debug!("  path node {:?}", node),
                }
            }
        }
        if self.visualize() {
            self.render_frame(step, stats, discovered);
        }
    }

    fn render_frame(&self, step: usize, stats: &Statistics, discovered: &[Position]) {
        self.clear_screen();
        println!("=== D* LITE REPLANNING ===");
        println!(
            "Planner: {} | Step: {} | Moves: {} | Replans: {}",
            self.planner.name(),
            step,
            stats.total_moves,
            stats.replans
        );
        println!(
            "Agent: ({}, {}) | Goal: ({}, {}) | Optimal length at start: {}",
            self.agent.position.x,
            self.agent.position.y,
            self.world.goal.x,
            self.world.goal.y,
            self.optimal_path_length
                .map_or_else(|| "unreachable".to_string(), |n| n.to_string())
        );
        if !discovered.is_empty() {
            println!("New obstacles: {:?}", discovered);
        }
        let planned = self.planner.planned_path(self.agent.position);
        print!(
            "{}",
            self.world
                .render(Some(self.agent.position), &planned, self.planner.touched())
        );
        thread::sleep(Duration::from_millis(self.config.delay_ms));
    }

    fn clear_screen(&self) {
        print!("\x1B[2J\x1B[1;1H");
    }

    /// Runs every planner on one shared environment.
    pub fn run_comparison(config: Config) -> Result<Vec<AlgorithmResult>> {
        config.validate()?;
        let layout = config.load_layout()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let environment = EnvironmentSetup::generate(layout, &config, seed)?;

        println!("Running comparison with environment seed {} (for reproducibility)", seed);

        let mut results = Vec::new();
        for algorithm in [Algorithm::DStarLite, Algorithm::AStar] {
            let mut run_config = config.clone();
            run_config.no_visualization = true;
            run_config.algorithm = algorithm;

            let mut simulation =
                Simulation::with_environment(run_config, environment.clone(), algorithm)?;
            let outcome = simulation.run()?;
            println!(
                "Completed: {} - Success: {}, Moves: {}",
                algorithm,
                outcome.reached_goal(),
                outcome.statistics.total_moves
            );
            results.push(AlgorithmResult {
                name: algorithm.to_string(),
                outcome,
            });
        }
        Ok(results)
    }

    pub fn print_comparison_results(results: &[AlgorithmResult]) {
        println!("\n=== ALGORITHM COMPARISON RESULTS ===\n");
        println!(
            "{:<14} {:<8} {:<8} {:<8} {:<11} {:<10} {:<12} {:<15}",
            "Algorithm", "Success", "Moves", "Optimal", "Efficiency", "Replans", "Expansions", "Avg Replan"
        );
        println!("{}", "-".repeat(92));

        for result in results {
            let stats = &result.outcome.statistics;
            let success_str = if result.outcome.reached_goal() { "✓" } else { "✗" };
            println!(
                "{:<14} {:<8} {:<8} {:<8} {:<11.3} {:<10} {:<12} {:<15}",
                result.name,
                success_str,
                stats.total_moves,
                stats
                    .optimal_path_length
                    .map_or_else(|| "-".to_string(), |n| n.to_string()),
                stats.route_efficiency,
                stats.replans,
                stats.expansions,
                format!("{:.2?}", result.outcome.timing.average_replan_time()),
            );
        }

        let fewest_expansions = results
            .iter()
            .filter(|r| r.outcome.reached_goal())
            .min_by_key(|r| r.outcome.statistics.expansions);
        match fewest_expansions {
            Some(best) => println!(
                "\nFewest expansions: {} ({})",
                best.name, best.outcome.statistics.expansions
            ),
            None => println!("\nNo algorithm reached the goal."),
        }
    }
}
