//! Statistics gathered during the annual cycle.

use crate::animal::Animal;
use serde::{Deserialize, Serialize};
use shared::{Location, Species};

/// Head count per species
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCount {
    pub herbivores: usize,
    pub carnivores: usize,
}

impl SpeciesCount {
    pub fn get(&self, species: Species) -> usize {
        match species {
            Species::Herbivore => self.herbivores,
            Species::Carnivore => self.carnivores,
        }
    }

    pub fn total(&self) -> usize {
        self.herbivores + self.carnivores
    }
}

impl std::ops::AddAssign for SpeciesCount {
    fn add_assign(&mut self, rhs: Self) {
        self.herbivores += rhs.herbivores;
        self.carnivores += rhs.carnivores;
    }
}

/// Population of one habitable cell at the start of a year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellCount {
    pub location: Location,
    pub count: SpeciesCount,
}

/// Individual ages, weights and fitness values of one species
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimalSamples {
    pub age: Vec<u32>,
    pub weight: Vec<f64>,
    pub fitness: Vec<f64>,
}

impl AnimalSamples {
    pub fn record(&mut self, animal: &Animal) {
        self.age.push(animal.age());
        self.weight.push(animal.weight());
        self.fitness.push(animal.fitness());
    }

    pub fn len(&self) -> usize {
        self.age.len()
    }

    pub fn is_empty(&self) -> bool {
        self.age.is_empty()
    }
}

/// Everything observed during one annual cycle.
///
/// Per-cell counts and samples are taken before the cell's phases run;
/// `totals` is the island population after migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    pub cells: Vec<CellCount>,
    pub herbivores: AnimalSamples,
    pub carnivores: AnimalSamples,
    pub totals: SpeciesCount,
}

impl YearStats {
    pub fn samples(&self, species: Species) -> &AnimalSamples {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    pub(crate) fn samples_mut(&mut self, species: Species) -> &mut AnimalSamples {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    /// Start-of-year count for one cell
    pub fn cell(&self, location: Location) -> Option<SpeciesCount> {
        self.cells
            .iter()
            .find(|cell| cell.location == location)
            .map(|cell| cell.count)
    }
}

/// Island totals per species, one entry per simulated year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationHistory {
    pub herbivores: Vec<usize>,
    pub carnivores: Vec<usize>,
}

impl PopulationHistory {
    pub fn push(&mut self, count: SpeciesCount) {
        self.herbivores.push(count.herbivores);
        self.carnivores.push(count.carnivores);
    }

    pub fn len(&self) -> usize {
        self.herbivores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.herbivores.is_empty()
    }

    pub fn series(&self, species: Species) -> &[usize] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }
}

/// Fixed-width histogram over `[0, max)`; values at or above `max` land in
/// the last bin
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub delta: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn new(values: impl IntoIterator<Item = f64>, max: f64, delta: f64) -> Self {
        let bins = if delta > 0.0 && max > 0.0 {
            (max / delta).ceil() as usize
        } else {
            1
        };
        let mut counts = vec![0; bins];
        for value in values {
            if !value.is_finite() {
                continue;
            }
            let bin = if delta > 0.0 {
                ((value.max(0.0) / delta) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Self { delta, counts }
    }

    /// Lower edge of a bin
    pub fn edge(&self, bin: usize) -> f64 {
        bin as f64 * self.delta
    }
}
