use crate::map::MapError;
use shared::{Location, ParameterError, RecordError, Terrain, UnknownSpecies, UnknownTerrain};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid island map: {0}")]
    Map(#[from] MapError),

    #[error("invalid animal record: {0}")]
    Record(#[from] RecordError),

    #[error("invalid parameters: {0}")]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Species(#[from] UnknownSpecies),

    #[error(transparent)]
    Terrain(#[from] UnknownTerrain),

    #[error("cannot place animals in {terrain} cell at {location}")]
    NotHabitable { location: Location, terrain: Terrain },

    #[error("location {location} is outside the island")]
    OutOfBounds { location: Location },

    #[error("unsupported checkpoint version {found}, expected {expected}")]
    CheckpointVersion { found: u32, expected: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
