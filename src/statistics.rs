use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Statistics {
    pub total_moves: usize,
    pub optimal_path_length: Option<usize>,
    pub replans: usize,
    pub obstacles_discovered: usize,
    pub expansions: usize,
    pub route_efficiency: f64,
}

impl Statistics {
    pub fn new(optimal_path_length: Option<usize>) -> Self {
        Statistics {
            total_moves: 0,
            optimal_path_length,
            replans: 0,
            obstacles_discovered: 0,
            expansions: 0,
            route_efficiency: 0.0,
        }
    }

    pub fn calculate_efficiency(&mut self) {
        self.route_efficiency = match self.optimal_path_length {
            Some(optimal) if optimal > 0 && self.total_moves > 0 => {
                self.total_moves as f64 / optimal as f64
            }
            _ => 0.0,
        };
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Moves: {}", self.total_moves)?;
        match self.optimal_path_length {
            Some(optimal) => writeln!(f, "Optimal Path Length: {}", optimal)?,
            None => writeln!(f, "Optimal Path Length: unreachable")?,
        }
        writeln!(f, "Replans: {}", self.replans)?;
        writeln!(f, "Obstacles Discovered: {}", self.obstacles_discovered)?;
        writeln!(f, "Vertices Expanded: {}", self.expansions)?;
        writeln!(f, "Route Efficiency: {:.3}", self.route_efficiency)?;

        if let Some(optimal) = self.optimal_path_length {
            if self.route_efficiency > 1.0 {
                let extra_moves = self.total_moves.saturating_sub(optimal);
                writeln!(f, "Extra moves due to new obstacles: {}", extra_moves)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimingData {
    pub replan_times: Vec<Duration>,
    pub move_times: Vec<Duration>,
}

impl TimingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn average_replan_time(&self) -> Duration {
        average(&self.replan_times)
    }

    pub fn average_move_time(&self) -> Duration {
        average(&self.move_times)
    }

    pub fn total_replan_time(&self) -> Duration {
        self.replan_times.iter().sum()
    }

    pub fn total_calls(&self) -> usize {
        self.move_times.len()
    }
}

fn average(times: &[Duration]) -> Duration {
    if times.is_empty() {
        Duration::ZERO
    } else {
        let total: Duration = times.iter().sum();
        total / times.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_ratio() {
        let mut stats = Statistics::new(Some(10));
        stats.total_moves = 12;
        stats.calculate_efficiency();
        assert!((stats.route_efficiency - 1.2).abs() < 1e-9);
        assert!(stats.to_string().contains("Extra moves due to new obstacles: 2"));
    }

    #[test]
    fn test_efficiency_without_moves_is_zero() {
        let mut stats = Statistics::new(Some(0));
        stats.calculate_efficiency();
        assert_eq!(stats.route_efficiency, 0.0);

        let mut stats = Statistics::new(None);
        stats.total_moves = 3;
        stats.calculate_efficiency();
        assert_eq!(stats.route_efficiency, 0.0);
        assert!(stats.to_string().contains("Optimal Path Length: unreachable"));
    }

    #[test]
    fn test_average_times() {
        let mut timing = TimingData::new();
        assert_eq!(timing.average_replan_time(), Duration::ZERO);
        timing.replan_times.push(Duration::from_millis(2));
        timing.replan_times.push(Duration::from_millis(4));
        assert_eq!(timing.average_replan_time(), Duration::from_millis(3));
        assert_eq!(timing.total_replan_time(), Duration::from_millis(6));
    }
}
