//! Save and restore a whole simulation as JSON.
//!
//! The random generator state is part of the island, so a restored run
//! continues exactly where the saved one stopped.

use crate::error::SimError;
use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CheckpointRef<'a> {
    version: u32,
    simulation: &'a Simulation,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Deserialize)]
struct Checkpoint {
    simulation: Simulation,
}

pub fn save<P: AsRef<Path>>(simulation: &Simulation, path: P) -> Result<(), SimError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let checkpoint = CheckpointRef {
        version: CHECKPOINT_VERSION,
        simulation,
    };
    serde_json::to_writer(&mut writer, &checkpoint)?;
    writer.flush()?;
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Simulation, SimError> {
    let text = fs::read_to_string(path)?;

    let header: Header = serde_json::from_str(&text)?;
    if header.version != CHECKPOINT_VERSION {
        return Err(SimError::CheckpointVersion {
            found: header.version,
            expected: CHECKPOINT_VERSION,
        });
    }

    let checkpoint: Checkpoint = serde_json::from_str(&text)?;
    Ok(checkpoint.simulation)
}
