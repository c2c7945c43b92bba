use crate::error::SimError;
use crate::stats::SpeciesCount;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Yearly island totals written as CSV (`Year,Herbivore,Carnivore`)
#[derive(Debug)]
pub struct PopulationLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl PopulationLog {
    /// Create (or truncate) the log file and write the header
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "Year,Herbivore,Carnivore")?;
        writer.flush()?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row; flushed so the file is readable while a run is going
    pub fn record(&mut self, year: u32, count: SpeciesCount) -> Result<(), SimError> {
        writeln!(
            self.writer,
            "{},{},{}",
            year, count.herbivores, count.carnivores
        )?;
        self.writer.flush()?;
        Ok(())
    }
}
