use crate::animal::AnimalIds;
use crate::cell::{Cell, Migration};
use crate::error::SimError;
use crate::map::IslandMap;
use crate::stats::{CellCount, SpeciesCount, YearStats};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shared::{Location, ParameterUpdate, Parameters, PopulationRecord, Species, Terrain};

/// The whole grid and the single random stream that drives it.
///
/// Cells are stored row-major; `habitable` holds the indices of the cells
/// that take part in the annual cycle, in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Island {
    map: IslandMap,
    cells: Vec<Cell>,
    habitable: Vec<usize>,
    params: Parameters,
    ids: AnimalIds,
    rng: ChaCha8Rng,
    last_year: YearStats,
}

impl Island {
    /// Build an island from a map string with default parameters
    pub fn new(map: &str, seed: u64) -> Result<Self, SimError> {
        Self::with_parameters(map, seed, Parameters::default())
    }

    /// Build an island from a map string.
    ///
    /// The map is fully validated before any cell is created.
    pub fn with_parameters(map: &str, seed: u64, params: Parameters) -> Result<Self, SimError> {
        let map = IslandMap::parse(map)?;
        params.herbivore.validate()?;
        params.carnivore.validate()?;
        params.lowland.validate()?;
        params.highland.validate()?;

        let cells: Vec<Cell> = map
            .iter()
            .map(|(location, terrain)| Cell::new(location, terrain, &params))
            .collect();
        let habitable = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_habitable())
            .map(|(idx, _)| idx)
            .collect();

        Ok(Self {
            map,
            cells,
            habitable,
            params,
            ids: AnimalIds::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_year: YearStats::default(),
        })
    }

    pub fn rows(&self) -> usize {
        self.map.rows
    }

    pub fn cols(&self) -> usize {
        self.map.cols
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn index(&self, location: Location) -> Option<usize> {
        self.map.index(location)
    }

    fn habitable_index(&self, location: Location) -> Option<usize> {
        self.map
            .terrain_at(location)
            .filter(|terrain| terrain.is_habitable())
            .and(self.map.index(location))
    }

    pub fn cell(&self, location: Location) -> Option<&Cell> {
        self.index(location).map(|idx| &self.cells[idx])
    }

    /// All cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn habitable_cells(&self) -> impl Iterator<Item = &Cell> {
        self.habitable.iter().map(|&idx| &self.cells[idx])
    }

    /// Current head count over the whole island
    pub fn population(&self) -> SpeciesCount {
        self.habitable_cells()
            .fold(SpeciesCount::default(), |mut total, cell| {
                total += SpeciesCount {
                    herbivores: cell.herbivore_count(),
                    carnivores: cell.carnivore_count(),
                };
                total
            })
    }

    /// Statistics of the most recent annual cycle
    pub fn last_year(&self) -> &YearStats {
        &self.last_year
    }

    /// Place animals. Fails on the first record that names a location
    /// outside the grid or a water cell, or that describes an invalid animal.
    pub fn add_population(&mut self, records: &[PopulationRecord]) -> Result<(), SimError> {
        for record in records {
            let idx = self
                .index(record.loc)
                .ok_or(SimError::OutOfBounds { location: record.loc })?;
            for animal in &record.pop {
                self.cells[idx].add_animal(animal, &self.params, &mut self.ids)?;
            }
        }
        Ok(())
    }

    /// Update species parameters and refresh every cached fitness value
    pub fn set_animal_parameters(
        &mut self,
        species: Species,
        update: &ParameterUpdate,
    ) -> Result<(), SimError> {
        self.params.set_animal(species, update)?;
        for &idx in &self.habitable {
            self.cells[idx].refresh_fitness(species, &self.params);
        }
        Ok(())
    }

    /// Update fodder parameters and refill the affected cells
    pub fn set_landscape_parameters(
        &mut self,
        terrain: Terrain,
        update: &ParameterUpdate,
    ) -> Result<(), SimError> {
        self.params.set_landscape(terrain, update)?;
        for cell in self.cells.iter_mut().filter(|cell| cell.terrain() == terrain) {
            cell.reset_fodder(&self.params);
        }
        Ok(())
    }

    /// Run one simulated year.
    ///
    /// Every habitable cell runs its phases in turn and reports who wants to
    /// leave; the moves are applied only after the last cell is done.
    pub fn yearly_cycle(&mut self) -> Result<&YearStats, SimError> {
        let mut stats = YearStats::default();
        let mut migrations: Vec<Migration> = Vec::new();

        for &idx in &self.habitable {
            let cell = &mut self.cells[idx];

            stats.cells.push(CellCount {
                location: cell.location(),
                count: SpeciesCount {
                    herbivores: cell.herbivore_count(),
                    carnivores: cell.carnivore_count(),
                },
            });
            for animal in cell.animals() {
                stats.samples_mut(animal.species).record(animal);
            }

            cell.add_newborns(&self.params, &mut self.ids, &mut self.rng);
            cell.feed_animals(&self.params, &mut self.rng);
            migrations.extend(cell.moving_animals_list(&self.params, &mut self.rng));
            cell.age_animals();
            cell.loss_of_weight(&self.params);
            cell.animal_death(&self.params, &mut self.rng);
            cell.reset_fodder(&self.params);
        }

        let wanted = migrations.len();
        let moved = self.apply_migrations(migrations)?;
        stats.totals = self.population();

        tracing::debug!(
            herbivores = stats.totals.herbivores,
            carnivores = stats.totals.carnivores,
            wanted,
            moved,
            "annual cycle complete"
        );

        self.last_year = stats;
        Ok(&self.last_year)
    }

    /// Realise migration wishes in queue order. A wish is dropped when the
    /// destination is not a habitable cell or when the animal died this
    /// year; the animal then stays where it is.
    fn apply_migrations(&mut self, migrations: Vec<Migration>) -> Result<usize, SimError> {
        let mut moved = 0;

        for migration in migrations {
            let Some(dest) = migration.to.and_then(|to| self.habitable_index(to)) else {
                continue;
            };
            let Some(src) = self.index(migration.from) else {
                continue;
            };
            let Some(animal) = self.cells[src].take(migration.species, migration.animal) else {
                continue;
            };
            self.cells[dest].insert(animal)?;
            moved += 1;
        }

        Ok(moved)
    }
}
