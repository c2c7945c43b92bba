use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared::{ParameterUpdate, PopulationRecord};
use sim::Simulation;

fn default_seed() -> u64 {
    12345
}

fn default_years() -> u32 {
    10
}

/// A simulation setup read from YAML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_years")]
    pub years: u32,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    pub island_map: String,
    #[serde(default)]
    pub population: Vec<PopulationRecord>,
    /// Species name -> partial parameter map
    #[serde(default)]
    pub animal_parameters: BTreeMap<String, ParameterUpdate>,
    /// Landscape code -> partial parameter map
    #[serde(default)]
    pub landscape_parameters: BTreeMap<String, ParameterUpdate>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }

    /// Create the island, apply parameter overrides, then place the
    /// initial population
    pub fn build(&self, seed_override: Option<u64>) -> Result<Simulation> {
        let seed = seed_override.unwrap_or(self.seed);
        let mut simulation =
            Simulation::new(&self.island_map, &[], seed).context("Invalid island map")?;

        for (species, update) in &self.animal_parameters {
            simulation
                .set_animal_parameters(species, update)
                .with_context(|| format!("Invalid parameters for {species}"))?;
        }

        for (code, update) in &self.landscape_parameters {
            let mut chars = code.chars();
            let (Some(landscape), None) = (chars.next(), chars.next()) else {
                bail!("Landscape key must be a single character, got {code:?}");
            };
            simulation
                .set_landscape_parameters(landscape, update)
                .with_context(|| format!("Invalid parameters for landscape {code}"))?;
        }

        simulation
            .add_population(&self.population)
            .context("Invalid initial population")?;

        Ok(simulation)
    }

    pub fn years(&self, override_years: Option<u32>) -> u32 {
        override_years.unwrap_or(self.years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Location, Species};
    use std::io::Write;

    const SCENARIO: &str = r#"
name: tiny
seed: 7
years: 3
island_map: |
  WWWWW
  WLLHW
  WDLLW
  WWWWW
population:
  - loc: [2, 2]
    pop:
      - {species: Herbivore, age: 5, weight: 20}
      - {species: Herbivore, age: 5, weight: 20}
  - loc: [3, 3]
    pop:
      - {species: Carnivore, age: 5, weight: 20}
animal_parameters:
  Carnivore: {F: 65, DeltaPhiMax: 9}
landscape_parameters:
  L: {f_max: 700}
"#;

    fn write_scenario(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_build() {
        let file = write_scenario(SCENARIO);
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("tiny"));
        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.years(None), 3);
        assert_eq!(scenario.years(Some(20)), 20);
        assert_eq!(scenario.population[0].loc, Location::new(2, 2));

        let simulation = scenario.build(None).unwrap();
        let params = simulation.island().parameters();
        assert_eq!(params.carnivore.f, 65.0);
        assert_eq!(params.carnivore.delta_phi_max, Some(9.0));
        assert_eq!(params.lowland.f_max, 700.0);
        assert_eq!(simulation.num_animals_per_species().get(Species::Herbivore), 2);
        assert_eq!(simulation.num_animals_per_species().get(Species::Carnivore), 1);
    }

    #[test]
    fn test_defaults() {
        let file = write_scenario("island_map: \"WWW\\nWLW\\nWWW\"\n");
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.seed, default_seed());
        assert_eq!(scenario.years, default_years());
        assert!(scenario.population.is_empty());
        assert_eq!(scenario.build(Some(1)).unwrap().num_animals(), 0);
    }

    #[test]
    fn test_bad_landscape_key() {
        let text = "island_map: \"WWW\\nWLW\\nWWW\"\nlandscape_parameters:\n  LL: {f_max: 1}\n";
        let file = write_scenario(text);
        let scenario = Scenario::load(file.path()).unwrap();
        assert!(scenario.build(None).is_err());
    }

    #[test]
    fn test_population_on_water_fails() {
        let text = r#"
island_map: "WWW\nWLW\nWWW"
population:
  - loc: [1, 1]
    pop: [{species: Herbivore, age: 1, weight: 10}]
"#;
        let file = write_scenario(text);
        let scenario = Scenario::load(file.path()).unwrap();
        let err = scenario.build(None).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid initial population"));
    }

    #[test]
    fn test_bundled_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../scenarios/rossumoya.yaml");
        let scenario = Scenario::load(path).unwrap();
        let simulation = scenario.build(None).unwrap();
        assert_eq!(simulation.num_animals_per_species().herbivores, 150);
        assert_eq!(simulation.num_animals_per_species().carnivores, 40);
        assert_eq!(simulation.island().rows(), 13);
        assert_eq!(simulation.island().cols(), 21);
    }

    #[test]
    fn test_missing_file() {
        assert!(Scenario::load("does/not/exist.yaml").is_err());
    }
}
