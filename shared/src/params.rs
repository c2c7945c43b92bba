use crate::kinds::{Species, Terrain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Partial parameter update keyed by parameter name, e.g. `{"mu": 0.3}`
pub type ParameterUpdate = BTreeMap<String, f64>;

/// Biological constants shared by every animal of one species.
///
/// Animals never copy these values; every behavioural method is handed the
/// set that belongs to its species, so an update takes effect for existing
/// and future individuals alike.
///
/// Field names serialize to the conventional parameter keys
/// (`w_birth`, `F`, `DeltaPhiMax`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalParams {
    /// Mean birth weight
    pub w_birth: f64,
    /// Standard deviation of the birth weight
    pub sigma_birth: f64,
    /// Fraction of eaten food turned into body weight
    pub beta: f64,
    /// Yearly fractional weight loss
    pub eta: f64,
    /// Age at which the age sigmoid is one half
    pub a_half: f64,
    /// Steepness of the age sigmoid
    pub phi_age: f64,
    /// Weight at which the weight sigmoid is one half
    pub w_half: f64,
    /// Steepness of the weight sigmoid
    pub phi_weight: f64,
    /// Migration coefficient
    pub mu: f64,
    /// Procreation coefficient
    pub gamma: f64,
    /// Birth weight multiple a mother must carry before giving birth
    pub zeta: f64,
    /// Weight a mother loses per unit of newborn weight
    pub xi: f64,
    /// Death coefficient
    pub omega: f64,
    /// Appetite: food eaten per year at most
    #[serde(rename = "F")]
    pub f: f64,
    /// Fitness difference at which a kill becomes certain (carnivores only)
    #[serde(
        rename = "DeltaPhiMax",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delta_phi_max: Option<f64>,
}

const COMMON_KEYS: [&str; 14] = [
    "w_birth",
    "sigma_birth",
    "beta",
    "eta",
    "a_half",
    "phi_age",
    "w_half",
    "phi_weight",
    "mu",
    "gamma",
    "zeta",
    "xi",
    "omega",
    "F",
];

impl AnimalParams {
    pub fn herbivore() -> Self {
        Self {
            w_birth: 8.0,
            sigma_birth: 1.5,
            beta: 0.9,
            eta: 0.05,
            a_half: 40.0,
            phi_age: 0.6,
            w_half: 10.0,
            phi_weight: 0.1,
            mu: 0.25,
            gamma: 0.2,
            zeta: 3.5,
            xi: 1.2,
            omega: 0.4,
            f: 10.0,
            delta_phi_max: None,
        }
    }

    pub fn carnivore() -> Self {
        Self {
            w_birth: 6.0,
            sigma_birth: 1.0,
            beta: 0.75,
            eta: 0.125,
            a_half: 40.0,
            phi_age: 0.3,
            w_half: 4.0,
            phi_weight: 0.4,
            mu: 0.4,
            gamma: 0.8,
            zeta: 3.5,
            xi: 1.1,
            omega: 0.8,
            f: 50.0,
            delta_phi_max: Some(10.0),
        }
    }

    /// Legal keys for this parameter set
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = COMMON_KEYS.to_vec();
        if self.delta_phi_max.is_some() {
            keys.push("DeltaPhiMax");
        }
        keys
    }

    /// Look up a parameter by its key
    pub fn get(&self, key: &str) -> Option<f64> {
        let value = match key {
            "w_birth" => self.w_birth,
            "sigma_birth" => self.sigma_birth,
            "beta" => self.beta,
            "eta" => self.eta,
            "a_half" => self.a_half,
            "phi_age" => self.phi_age,
            "w_half" => self.w_half,
            "phi_weight" => self.phi_weight,
            "mu" => self.mu,
            "gamma" => self.gamma,
            "zeta" => self.zeta,
            "xi" => self.xi,
            "omega" => self.omega,
            "F" => self.f,
            "DeltaPhiMax" => self.delta_phi_max?,
            _ => return None,
        };
        Some(value)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut f64> {
        let slot = match key {
            "w_birth" => &mut self.w_birth,
            "sigma_birth" => &mut self.sigma_birth,
            "beta" => &mut self.beta,
            "eta" => &mut self.eta,
            "a_half" => &mut self.a_half,
            "phi_age" => &mut self.phi_age,
            "w_half" => &mut self.w_half,
            "phi_weight" => &mut self.phi_weight,
            "mu" => &mut self.mu,
            "gamma" => &mut self.gamma,
            "zeta" => &mut self.zeta,
            "xi" => &mut self.xi,
            "omega" => &mut self.omega,
            "F" => &mut self.f,
            "DeltaPhiMax" => self.delta_phi_max.as_mut()?,
            _ => return None,
        };
        Some(slot)
    }

    /// Apply a partial update.
    ///
    /// The update is applied to a scratch copy first, so a rejected update
    /// leaves `self` untouched.
    pub fn update(&mut self, update: &ParameterUpdate) -> Result<(), ParameterError> {
        let mut next = self.clone();
        for (key, &value) in update {
            let legal = next.keys().join(", ");
            let slot = next.slot_mut(key).ok_or_else(|| ParameterError::UnknownKey {
                key: key.clone(),
                legal,
            })?;
            check_non_negative(key, value)?;
            *slot = value;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check the whole set: every value non-negative, `DeltaPhiMax` strictly
    /// positive and `eta` strictly below one.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for key in self.keys() {
            if let Some(value) = self.get(key) {
                check_non_negative(key, value)?;
            }
        }
        if let Some(delta_phi_max) = self.delta_phi_max {
            if delta_phi_max <= 0.0 {
                return Err(ParameterError::DeltaPhiMaxNotPositive(delta_phi_max));
            }
        }
        if self.eta >= 1.0 {
            return Err(ParameterError::EtaNotBelowOne(self.eta));
        }
        Ok(())
    }
}

fn check_non_negative(key: &str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative {
            key: key.to_string(),
            value,
        })
    }
}

/// Fodder settings for one fodder-bearing terrain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FodderParams {
    /// Fodder available at the start of every year
    pub f_max: f64,
}

impl FodderParams {
    /// `f_max` must be finite and non-negative
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_non_negative("f_max", self.f_max)
    }

    fn update(&mut self, update: &ParameterUpdate) -> Result<(), ParameterError> {
        let mut next = *self;
        for (key, &value) in update {
            if key != "f_max" {
                return Err(ParameterError::UnknownKey {
                    key: key.clone(),
                    legal: "f_max".to_string(),
                });
            }
            check_non_negative(key, value)?;
            next.f_max = value;
        }
        *self = next;
        Ok(())
    }
}

/// Every tunable constant of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub herbivore: AnimalParams,
    pub carnivore: AnimalParams,
    pub lowland: FodderParams,
    pub highland: FodderParams,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            herbivore: AnimalParams::herbivore(),
            carnivore: AnimalParams::carnivore(),
            lowland: FodderParams { f_max: 800.0 },
            highland: FodderParams { f_max: 300.0 },
        }
    }
}

impl Parameters {
    pub fn animal(&self, species: Species) -> &AnimalParams {
        match species {
            Species::Herbivore => &self.herbivore,
            Species::Carnivore => &self.carnivore,
        }
    }

    pub fn animal_mut(&mut self, species: Species) -> &mut AnimalParams {
        match species {
            Species::Herbivore => &mut self.herbivore,
            Species::Carnivore => &mut self.carnivore,
        }
    }

    /// Maximum fodder for a terrain, `None` where nothing grows
    pub fn f_max(&self, terrain: Terrain) -> Option<f64> {
        match terrain {
            Terrain::Lowland => Some(self.lowland.f_max),
            Terrain::Highland => Some(self.highland.f_max),
            Terrain::Water | Terrain::Desert => None,
        }
    }

    pub fn set_animal(
        &mut self,
        species: Species,
        update: &ParameterUpdate,
    ) -> Result<(), ParameterError> {
        self.animal_mut(species).update(update)
    }

    pub fn set_landscape(
        &mut self,
        terrain: Terrain,
        update: &ParameterUpdate,
    ) -> Result<(), ParameterError> {
        match terrain {
            Terrain::Lowland => self.lowland.update(update),
            Terrain::Highland => self.highland.update(update),
            Terrain::Water | Terrain::Desert => Err(ParameterError::NoTunableParameters(terrain)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("unknown parameter `{key}`, legal keys are: {legal}")]
    UnknownKey { key: String, legal: String },

    #[error("parameter `{key}` must be a non-negative number, got {value}")]
    Negative { key: String, value: f64 },

    #[error("DeltaPhiMax must be strictly positive, got {0}")]
    DeltaPhiMaxNotPositive(f64),

    #[error("eta must be less than 1, got {0}")]
    EtaNotBelowOne(f64),

    #[error("{0} cells have no tunable parameters")]
    NoTunableParameters(Terrain),
}
