use clap::Parser;

use dstar_replan::config::{Algorithm, Config};
use dstar_replan::simulation::Simulation;

fn main() {
    env_logger::init();
    let config = Config::parse();

    println!("Starting replanning simulation...");
    match &config.map {
        Some(path) => println!("Map: {}", path.display()),
        None => println!("Map: built-in 20x20 layout"),
    }
    println!("Algorithm: {}", config.algorithm);
    if config.obstacles_per_wave > 0 {
        println!(
            "Obstacle waves: {} cells every {} steps",
            config.obstacles_per_wave, config.obstacle_interval
        );
    }

    if config.no_visualization || config.quiet {
        println!("Visualization disabled - running in fast mode");
    } else {
        println!("Visualization enabled with {}ms delay", config.delay_ms);
        println!("Press Ctrl+C to stop the simulation");
        std::thread::sleep(std::time::Duration::from_millis(1000));
    }
    println!();

    if config.algorithm == Algorithm::All {
        match Simulation::run_comparison(config) {
            Ok(results) => Simulation::print_comparison_results(&results),
            Err(e) => {
                eprintln!("Error running comparison: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let outcome = Simulation::new(config).and_then(|mut simulation| simulation.run());
    match outcome {
        Ok(outcome) => {
            println!("\n=== FINAL RESULTS ===");
            println!("Termination: {:?}", outcome.termination);
            println!("{}", outcome.statistics);

            println!("=== TIMING ANALYSIS ===");
            println!("Moves chosen: {}", outcome.timing.total_calls());
            println!(
                "Average move selection time: {:.2?}",
                outcome.timing.average_move_time()
            );
            println!(
                "Average replan time: {:.2?} over {} replans",
                outcome.timing.average_replan_time(),
                outcome.timing.replan_times.len()
            );
            println!("Total replan time: {:.2?}", outcome.timing.total_replan_time());
        }
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    }
}
