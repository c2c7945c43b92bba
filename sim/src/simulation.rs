use crate::checkpoint;
use crate::error::SimError;
use crate::island::Island;
use crate::log::PopulationLog;
use crate::stats::{PopulationHistory, SpeciesCount, YearStats};
use serde::{Deserialize, Serialize};
use shared::{ParameterUpdate, Parameters, PopulationRecord, Species, Terrain};
use std::ops::ControlFlow;
use std::path::Path;

/// Top-level driver: owns the island, counts years and keeps the
/// population history. Visualisation and logging poll it after each year.
#[derive(Debug, Serialize, Deserialize)]
pub struct Simulation {
    island: Island,
    year: u32,
    history: PopulationHistory,
    #[serde(skip)]
    log: Option<PopulationLog>,
}

impl Simulation {
    pub fn new(map: &str, population: &[PopulationRecord], seed: u64) -> Result<Self, SimError> {
        Self::with_parameters(map, population, seed, Parameters::default())
    }

    pub fn with_parameters(
        map: &str,
        population: &[PopulationRecord],
        seed: u64,
        params: Parameters,
    ) -> Result<Self, SimError> {
        let mut island = Island::with_parameters(map, seed, params)?;
        island.add_population(population)?;

        Ok(Self {
            island,
            year: 0,
            history: PopulationHistory::default(),
            log: None,
        })
    }

    /// Set parameters for `"Herbivore"` or `"Carnivore"`
    pub fn set_animal_parameters(
        &mut self,
        species: &str,
        update: &ParameterUpdate,
    ) -> Result<(), SimError> {
        let species: Species = species.parse()?;
        self.island.set_animal_parameters(species, update)
    }

    /// Set parameters for a landscape code; only `L` and `H` have any
    pub fn set_landscape_parameters(
        &mut self,
        landscape: char,
        update: &ParameterUpdate,
    ) -> Result<(), SimError> {
        let terrain = Terrain::from_code(landscape)?;
        self.island.set_landscape_parameters(terrain, update)
    }

    pub fn add_population(&mut self, population: &[PopulationRecord]) -> Result<(), SimError> {
        self.island.add_population(population)
    }

    /// Write yearly totals to a CSV file from now on
    pub fn attach_log<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SimError> {
        self.log = Some(PopulationLog::create(path)?);
        Ok(())
    }

    /// Run `years` more years
    pub fn simulate(&mut self, years: u32) -> Result<(), SimError> {
        self.simulate_with(years, |_| ControlFlow::Continue(()))?;
        Ok(())
    }

    /// Run up to `years` more years, calling `observer` after each one.
    /// The observer may stop the run early; returns the number of years run.
    pub fn simulate_with<F>(&mut self, years: u32, mut observer: F) -> Result<u32, SimError>
    where
        F: FnMut(&Simulation) -> ControlFlow<()>,
    {
        tracing::info!(
            from_year = self.year,
            years,
            herbivores = self.num_animals_per_species().herbivores,
            carnivores = self.num_animals_per_species().carnivores,
            "starting simulation"
        );

        let mut completed = 0;
        for _ in 0..years {
            let before = self.island.population();
            let totals = self.island.yearly_cycle()?.totals;
            self.year += 1;
            completed += 1;
            self.history.push(totals);

            for species in Species::ALL {
                if before.get(species) > 0 && totals.get(species) == 0 {
                    tracing::warn!(year = self.year, %species, "population went extinct");
                }
            }

            if let Some(log) = self.log.as_mut() {
                log.record(self.year, totals)?;
            }

            if observer(self).is_break() {
                tracing::info!(year = self.year, "simulation stopped by observer");
                break;
            }
        }

        tracing::info!(
            year = self.year,
            herbivores = self.num_animals_per_species().herbivores,
            carnivores = self.num_animals_per_species().carnivores,
            "simulation finished"
        );
        Ok(completed)
    }

    /// Last year simulated
    pub fn year(&self) -> u32 {
        self.year
    }

    /// Total number of animals on the island
    pub fn num_animals(&self) -> usize {
        self.island.population().total()
    }

    pub fn num_animals_per_species(&self) -> SpeciesCount {
        self.island.population()
    }

    pub fn history(&self) -> &PopulationHistory {
        &self.history
    }

    /// Statistics of the most recent year
    pub fn last_year(&self) -> &YearStats {
        self.island.last_year()
    }

    pub fn island(&self) -> &Island {
        &self.island
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        checkpoint::save(self, path)
    }

    /// Restore a saved simulation. A CSV log is not part of the checkpoint
    /// and has to be attached again.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        checkpoint::load(path)
    }
}
