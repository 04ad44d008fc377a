use dstar_replan::algorithms::a_star::shortest_path_length;
use dstar_replan::config::{Algorithm, Config, MapLayout};
use dstar_replan::grid::Grid;
use dstar_replan::simulation::{Simulation, Termination};
use dstar_replan::Position;
use std::io::Write;

const MAP: &str = r#"
width = 10
height = 6
start = { x = 0, y = 0 }
goal = { x = 9, y = 5 }

[[obstacle_runs]]
from = { x = 3, y = 0 }
to = { x = 3, y = 3 }

[[obstacle_runs]]
from = { x = 6, y = 2 }
to = { x = 6, y = 5 }

[[events]]
step = 0
cells = [{ x = 3, y = 5 }]
"#;

fn write_map(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn assert_contiguous(path: &[Position]) {
    for pair in path.windows(2) {
        assert_eq!(pair[0].manhattan_distance(&pair[1]), 1, "{:?}", pair);
    }
}

#[test]
fn test_map_file_run_matches_final_shortest_path() {
    let file = write_map(MAP);
    let layout = MapLayout::load(file.path()).unwrap();

    // Expected length once the step-0 event has closed the lower gap.
    let mut world = Grid::from_layout(&layout).unwrap();
    world.place_obstacle(Position::new(3, 5)).unwrap();
    let expected = shortest_path_length(&world, layout.start, layout.goal)
        .unwrap()
        .unwrap();

    for algorithm in [Algorithm::DStarLite, Algorithm::AStar] {
        let config = Config {
            map: Some(file.path().to_path_buf()),
            algorithm,
            seed: Some(3),
            ..Config::default()
        };
        let mut simulation = Simulation::new(config).unwrap();
        let outcome = simulation.run().unwrap();

        assert_eq!(outcome.termination, Termination::ReachedGoal, "{}", algorithm);
        assert_eq!(outcome.statistics.total_moves, expected, "{}", algorithm);
        assert_eq!(outcome.statistics.replans, 1);
        assert!(!outcome.path.contains(&Position::new(3, 5)));
        assert_contiguous(&outcome.path);
    }
}

#[test]
fn test_comparison_runs_both_planners() {
    let config = Config {
        algorithm: Algorithm::All,
        seed: Some(11),
        ..Config::default()
    };
    let results = Simulation::run_comparison(config).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["d_star_lite", "a_star"]);

    for result in &results {
        assert!(result.outcome.reached_goal());
        assert_eq!(
            Some(result.outcome.statistics.total_moves),
            result.outcome.statistics.optimal_path_length
        );
    }
    assert_eq!(results[0].outcome.statistics.replans, 0);
    assert!(results[1].outcome.statistics.expansions > 0);
}

fn wave_config(seed: u64, anchor_to_agent: bool) -> Config {
    Config {
        seed: Some(seed),
        obstacles_per_wave: 6,
        obstacle_interval: 3,
        sensor_range: 2,
        anchor_to_agent,
        ..Config::default()
    }
}

#[test]
fn test_random_waves_reach_goal_while_reachable() {
    for seed in 0..40u64 {
        for anchor_to_agent in [false, true] {
            let mut simulation = Simulation::new(wave_config(seed, anchor_to_agent)).unwrap();
            let outcome = simulation.run().unwrap();
            let agent = simulation.agent_position();
            let world = simulation.world();

            assert_contiguous(&outcome.path);
            assert_eq!(outcome.path.len() - 1, outcome.statistics.total_moves);
            assert_eq!(outcome.path.last().copied(), Some(agent));
            assert!(!world.is_blocked(agent).unwrap());

            if outcome.reached_goal() {
                assert_eq!(agent, world.goal);
            } else {
                // Stopping short is only allowed once the goal is sealed off.
                assert_eq!(
                    shortest_path_length(world, agent, world.goal).unwrap(),
                    None,
                    "seed {} anchor {} stopped at {:?} ({:?})",
                    seed,
                    anchor_to_agent,
                    agent,
                    outcome.termination
                );
            }
        }
    }
}

#[test]
fn test_agent_away_from_start_settles_before_giving_up() {
    // This seed strands the agent among unexpanded estimates far from the
    // fixed start while a way to the goal is still open.
    let mut simulation = Simulation::new(wave_config(12, false)).unwrap();
    let outcome = simulation.run().unwrap();
    assert_eq!(outcome.termination, Termination::ReachedGoal);
    assert_eq!(simulation.agent_position(), simulation.world().goal);
}

#[test]
fn test_budgeted_search_still_reaches_goal() {
    let config = Config {
        seed: Some(5),
        max_expansions: Some(7),
        ..Config::default()
    };
    let mut simulation = Simulation::new(config).unwrap();
    let optimal = simulation.optimal_path_length().unwrap();
    let outcome = simulation.run().unwrap();

    // Every move waits for the resumed search to converge.
    assert!(outcome.reached_goal());
    assert_eq!(outcome.statistics.total_moves, optimal);
}

#[test]
fn test_missing_map_file_is_io_error() {
    let config = Config {
        map: Some("/nonexistent/map.toml".into()),
        ..Config::default()
    };
    assert!(matches!(
        Simulation::new(config),
        Err(dstar_replan::PlannerError::Io(_))
    ));
}
