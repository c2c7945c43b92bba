pub mod animal;
pub mod cell;
pub mod checkpoint;
pub mod error;
pub mod island;
pub mod log;
pub mod map;
pub mod simulation;
pub mod stats;

pub use animal::{Animal, AnimalId};
pub use cell::{Cell, Direction, Migration};
pub use error::SimError;
pub use island::Island;
pub use map::{IslandMap, MapError};
pub use simulation::Simulation;
pub use stats::{AnimalSamples, CellCount, Histogram, PopulationHistory, SpeciesCount, YearStats};

use shared::PopulationRecord;

/// Run a complete simulation and return the yearly island totals
pub fn run_simulation(
    map: &str,
    population: &[PopulationRecord],
    seed: u64,
    years: u32,
) -> Result<PopulationHistory, SimError> {
    let mut simulation = Simulation::new(map, population, seed)?;
    simulation.simulate(years)?;
    Ok(simulation.history().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AnimalRecord, Species};

    const MAP: &str = "WWWWW\nWLLLW\nWHDHW\nWWWWW";

    #[test]
    fn test_simulation_runs() {
        let population = vec![PopulationRecord::new(
            (2, 3),
            vec![AnimalRecord::new(Species::Herbivore, 5, 20.0); 20],
        )];
        let history = run_simulation(MAP, &population, 42, 10).unwrap();

        assert_eq!(history.len(), 10);
        assert!(history.carnivores.iter().all(|&n| n == 0));
    }

    #[test]
    fn test_simulation_rejects_bad_input() {
        let population = vec![PopulationRecord::new(
            (1, 1),
            vec![AnimalRecord::new(Species::Herbivore, 5, 20.0)],
        )];
        assert!(run_simulation(MAP, &population, 42, 10).is_err());
        assert!(run_simulation("LWW\nWLW\nWWW", &[], 42, 10).is_err());
    }
}
