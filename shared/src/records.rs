use crate::kinds::{Species, UnknownSpecies};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 1-based (row, column) grid coordinate.
///
/// Serialized as a two-element sequence, matching the `loc: [row, col]`
/// form used in population files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Location {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Location> for (usize, usize) {
    fn from(loc: Location) -> Self {
        (loc.row, loc.col)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One individual as described in a population list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimalRecord {
    pub species: String,
    pub age: i64,
    pub weight: f64,
}

/// A validated [`AnimalRecord`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimalSpec {
    pub species: Species,
    pub age: u32,
    pub weight: f64,
}

impl AnimalRecord {
    pub fn new(species: Species, age: i64, weight: f64) -> Self {
        Self {
            species: species.name().to_string(),
            age,
            weight,
        }
    }

    /// Check species name, age and weight
    pub fn validate(&self) -> Result<AnimalSpec, RecordError> {
        let species: Species = self.species.parse()?;
        let age = u32::try_from(self.age).map_err(|_| RecordError::InvalidAge(self.age))?;
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(RecordError::InvalidWeight(self.weight));
        }
        Ok(AnimalSpec {
            species,
            age,
            weight: self.weight,
        })
    }
}

/// Animals to place in one cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub loc: Location,
    pub pop: Vec<AnimalRecord>,
}

impl PopulationRecord {
    pub fn new(loc: impl Into<Location>, pop: Vec<AnimalRecord>) -> Self {
        Self {
            loc: loc.into(),
            pop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Species(#[from] UnknownSpecies),

    #[error("invalid age {0}, age must be a non-negative integer")]
    InvalidAge(i64),

    #[error("invalid weight {0}, weight must be a positive number")]
    InvalidWeight(f64),
}
