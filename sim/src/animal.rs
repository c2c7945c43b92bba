use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};
use shared::{AnimalParams, AnimalSpec, Location, Species};

pub type AnimalId = u64;

/// Hands out island-unique animal ids
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimalIds {
    next: AnimalId,
}

impl AnimalIds {
    pub fn next_id(&mut self) -> AnimalId {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// One herbivore or carnivore.
///
/// `fitness` is cached and refreshed whenever age or weight changes; the
/// species parameters are never stored here, they are passed in by the
/// owning cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub species: Species,
    pub location: Location,
    age: u32,
    weight: f64,
    fitness: f64,
    alive: bool,
}

/// Two-sigmoid fitness score in `[0, 1]`
pub fn fitness(age: u32, weight: f64, params: &AnimalParams) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    let age_term = 1.0 / (1.0 + (params.phi_age * (age as f64 - params.a_half)).exp());
    let weight_term = 1.0 / (1.0 + (-params.phi_weight * (weight - params.w_half)).exp());
    age_term * weight_term
}

impl Animal {
    /// Create an animal from a validated record
    pub fn new(id: AnimalId, spec: AnimalSpec, location: Location, params: &AnimalParams) -> Self {
        Self {
            id,
            species: spec.species,
            location,
            age: spec.age,
            weight: spec.weight,
            fitness: fitness(spec.age, spec.weight, params),
            alive: true,
        }
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Recompute the cached fitness from age and weight
    pub fn refresh_fitness(&mut self, params: &AnimalParams) {
        self.fitness = fitness(self.age, self.weight, params);
    }

    /// Try to give birth to one offspring.
    ///
    /// `same_species_count` is the number of animals of this species in the
    /// cell, the mother included. Returns the newborn, already placed at the
    /// mother's location, or `None` if there is no birth this year.
    pub fn procreate<R: Rng>(
        &mut self,
        same_species_count: usize,
        params: &AnimalParams,
        ids: &mut AnimalIds,
        rng: &mut R,
    ) -> Option<Animal> {
        let offspring_threshold = params.zeta * (params.w_birth + params.sigma_birth);
        if self.weight < offspring_threshold {
            return None;
        }

        let probability = (params.gamma * self.fitness * same_species_count as f64).min(1.0);
        if rng.gen::<f64>() >= probability {
            return None;
        }

        let newborn_weight = birth_weight(params, rng)?;
        let parent_cost = params.xi * newborn_weight;
        if self.weight <= parent_cost {
            return None;
        }

        self.weight -= parent_cost;
        self.refresh_fitness(params);

        let spec = AnimalSpec {
            species: self.species,
            age: 0,
            weight: newborn_weight,
        };
        Some(Animal::new(ids.next_id(), spec, self.location, params))
    }

    /// Grow one year older. Fitness is refreshed by the following weight loss.
    pub fn age_one_year(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    /// Lose the yearly fraction `eta` of body weight
    pub fn lose_weight(&mut self, params: &AnimalParams) {
        self.weight -= params.eta * self.weight;
        self.refresh_fitness(params);
    }

    /// Decide whether the animal dies this year
    pub fn check_death<R: Rng>(&mut self, params: &AnimalParams, rng: &mut R) {
        if self.weight <= 0.0 {
            self.alive = false;
        } else if rng.gen::<f64>() < params.omega * (1.0 - self.fitness) {
            self.alive = false;
        }
    }

    /// Decide whether the animal wants to leave its cell this year
    pub fn wants_to_migrate<R: Rng>(&self, params: &AnimalParams, rng: &mut R) -> bool {
        rng.gen::<f64>() < params.mu * self.fitness
    }

    /// Herbivore feeding: eat up to `F` of the available fodder.
    /// Returns the amount eaten.
    pub fn graze(&mut self, available_fodder: f64, params: &AnimalParams) -> f64 {
        let eaten = available_fodder.min(params.f).max(0.0);
        self.weight += eaten * params.beta;
        self.refresh_fitness(params);
        eaten
    }

    /// Carnivore feeding.
    ///
    /// `prey` must be ordered weakest first. Each candidate is attacked once
    /// until the appetite `F` is met; killed prey are marked dead but stay in
    /// the slice. Returns the total weight eaten.
    pub fn hunt<R: Rng>(&mut self, prey: &mut [Animal], params: &AnimalParams, rng: &mut R) -> f64 {
        let Some(delta_phi_max) = params.delta_phi_max else {
            return 0.0;
        };
        let mut eaten = 0.0;

        for victim in prey.iter_mut() {
            if eaten >= params.f {
                break;
            }
            if !victim.alive {
                continue;
            }

            let kill_probability = kill_probability(self.fitness - victim.fitness, delta_phi_max);
            if rng.gen::<f64>() < kill_probability {
                let portion = (params.f - eaten).min(victim.weight);
                self.weight += portion * params.beta;
                self.refresh_fitness(params);
                victim.alive = false;
                eaten += portion;
            }
        }

        eaten
    }

    pub(crate) fn relocate(&mut self, location: Location) {
        self.location = location;
    }
}

fn kill_probability(fitness_difference: f64, delta_phi_max: f64) -> f64 {
    if fitness_difference < 0.0 {
        0.0
    } else if fitness_difference >= delta_phi_max {
        1.0
    } else {
        fitness_difference / delta_phi_max
    }
}

/// Draw a newborn weight whose log-normal mean and variance are `w_birth`
/// and `sigma_birth²`
fn birth_weight<R: Rng>(params: &AnimalParams, rng: &mut R) -> Option<f64> {
    let w2 = params.w_birth * params.w_birth;
    let s2 = params.sigma_birth * params.sigma_birth;
    let mu = (w2 / (w2 + s2).sqrt()).ln();
    let sigma = (1.0 + s2 / w2).ln().sqrt();
    let distribution = LogNormal::new(mu, sigma).ok()?;
    Some(distribution.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn herbivore(age: u32, weight: f64) -> Animal {
        let spec = AnimalSpec {
            species: Species::Herbivore,
            age,
            weight,
        };
        Animal::new(0, spec, Location::new(2, 2), &AnimalParams::herbivore())
    }

    fn carnivore(age: u32, weight: f64) -> Animal {
        let spec = AnimalSpec {
            species: Species::Carnivore,
            age,
            weight,
        };
        Animal::new(1, spec, Location::new(2, 2), &AnimalParams::carnivore())
    }

    #[test]
    fn test_animal_creation() {
        let animal = herbivore(5, 20.0);
        assert_eq!(animal.age(), 5);
        assert_eq!(animal.weight(), 20.0);
        assert!(animal.is_alive());
        assert!(animal.fitness() > 0.0 && animal.fitness() < 1.0);
    }

    #[test]
    fn test_fitness_zero_for_non_positive_weight() {
        let params = AnimalParams::herbivore();
        assert_eq!(fitness(3, 0.0, &params), 0.0);
        assert_eq!(fitness(3, -4.0, &params), 0.0);
    }

    #[test]
    fn test_fitness_known_value() {
        let params = AnimalParams::herbivore();
        // At a_half and w_half both sigmoids are exactly one half.
        let value = fitness(40, 10.0, &params);
        assert!((value - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_aging() {
        let mut animal = herbivore(0, 10.0);
        animal.age_one_year();
        animal.age_one_year();
        assert_eq!(animal.age(), 2);

        let mut ancient = herbivore(u32::MAX, 10.0);
        ancient.age_one_year();
        assert_eq!(ancient.age(), u32::MAX);
    }

    #[test]
    fn test_weight_loss() {
        let params = AnimalParams::herbivore();
        let mut animal = herbivore(4, 20.0);
        animal.lose_weight(&params);
        assert_eq!(animal.weight(), 20.0 - 0.05 * 20.0);
        assert_eq!(animal.fitness(), fitness(4, animal.weight(), &params));
    }

    #[test]
    fn test_death_certain_without_weight() {
        let params = AnimalParams::herbivore();
        let mut rng = StdRng::seed_from_u64(42);
        let mut animal = herbivore(4, 20.0);
        animal.weight = 0.0;
        animal.check_death(&params, &mut rng);
        assert!(!animal.is_alive());
    }

    #[test]
    fn test_death_impossible_at_full_fitness() {
        let params = AnimalParams::herbivore();
        let mut rng = StdRng::seed_from_u64(42);
        let mut animal = herbivore(4, 20.0);
        animal.fitness = 1.0;
        for _ in 0..1000 {
            animal.check_death(&params, &mut rng);
        }
        assert!(animal.is_alive());
    }

    #[test]
    fn test_grazing_limited_by_appetite_and_fodder() {
        let params = AnimalParams::herbivore();
        let mut animal = herbivore(4, 20.0);

        let eaten = animal.graze(100.0, &params);
        assert_eq!(eaten, params.f);
        assert!((animal.weight() - (20.0 + params.f * params.beta)).abs() < 1e-12);

        let eaten = animal.graze(3.0, &params);
        assert_eq!(eaten, 3.0);
    }

    #[test]
    fn test_migration_never_without_mu() {
        let mut params = AnimalParams::herbivore();
        params.mu = 0.0;
        let mut rng = StdRng::seed_from_u64(1);
        let animal = herbivore(4, 20.0);
        assert!((0..500).all(|_| !animal.wants_to_migrate(&params, &mut rng)));
    }

    #[test]
    fn test_procreation_deducts_mother_weight() {
        let mut params = AnimalParams::herbivore();
        params.gamma = 10.0;
        let mut ids = AnimalIds::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut mother = herbivore(5, 60.0);

        let child = mother
            .procreate(10, &params, &mut ids, &mut rng)
            .expect("probability saturates at one");
        assert_eq!(child.age(), 0);
        assert_eq!(child.species, Species::Herbivore);
        assert_eq!(child.location, mother.location);
        let expected = 60.0 - params.xi * child.weight();
        assert!((mother.weight() - expected).abs() < 1e-9);
        assert_eq!(mother.fitness(), fitness(5, mother.weight(), &params));
    }

    #[test]
    fn test_procreation_unaffordable_leaves_mother_untouched() {
        let mut params = AnimalParams::herbivore();
        params.gamma = 10.0;
        params.zeta = 0.0;
        params.xi = 1000.0;
        let mut ids = AnimalIds::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut mother = herbivore(5, 30.0);

        for _ in 0..100 {
            assert!(mother.procreate(10, &params, &mut ids, &mut rng).is_none());
        }
        assert_eq!(mother.weight(), 30.0);
    }

    #[test]
    fn test_kill_probability_curve() {
        assert_eq!(kill_probability(-0.1, 0.5), 0.0);
        assert_eq!(kill_probability(0.0, 0.5), 0.0);
        assert_eq!(kill_probability(0.25, 0.5), 0.5);
        assert_eq!(kill_probability(0.5, 0.5), 1.0);
        assert_eq!(kill_probability(0.9, 0.5), 1.0);
    }

    #[test]
    fn test_saturated_kill_is_certain() {
        let mut params = AnimalParams::carnivore();
        params.delta_phi_max = Some(0.1);
        let herbivore_params = AnimalParams::herbivore();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut predator = carnivore(5, 30.0);
            predator.fitness = 1.0;
            let mut prey = vec![herbivore(90, 5.0)];
            prey[0].refresh_fitness(&herbivore_params);
            assert!(prey[0].fitness() < 0.01);

            let eaten = predator.hunt(&mut prey, &params, &mut rng);
            assert!(!prey[0].is_alive());
            assert_eq!(eaten, 5.0);
        }
    }

    #[test]
    fn test_weaker_predator_never_kills() {
        let params = AnimalParams::carnivore();
        let mut rng = StdRng::seed_from_u64(3);
        let mut predator = carnivore(90, 1.0);
        let mut prey: Vec<Animal> = (0..20).map(|_| herbivore(2, 40.0)).collect();
        assert!(predator.fitness() < prey[0].fitness());

        let eaten = predator.hunt(&mut prey, &params, &mut rng);
        assert_eq!(eaten, 0.0);
        assert!(prey.iter().all(Animal::is_alive));
    }

    proptest! {
        #[test]
        fn prop_fitness_in_open_unit_interval(age in 0u32..100, weight in 0.01f64..100.0) {
            let herbivore = fitness(age, weight, &AnimalParams::herbivore());
            let carnivore = fitness(age, weight, &AnimalParams::carnivore());
            prop_assert!(herbivore > 0.0 && herbivore < 1.0);
            prop_assert!(carnivore > 0.0 && carnivore < 1.0);
        }

        #[test]
        fn prop_weight_loss_is_exact(weight in 0.1f64..500.0, eta in 0.0f64..0.99) {
            let mut params = AnimalParams::herbivore();
            params.eta = eta;
            let mut animal = herbivore(3, weight);
            animal.lose_weight(&params);
            prop_assert_eq!(animal.weight(), weight - eta * weight);
        }

        #[test]
        fn prop_light_mothers_never_give_birth(weight in 0.1f64..33.25, seed in any::<u64>()) {
            // Herbivore threshold is 3.5 * (8.0 + 1.5) = 33.25
            let mut params = AnimalParams::herbivore();
            params.gamma = 100.0;
            let mut ids = AnimalIds::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut mother = herbivore(5, weight);
            prop_assert!(mother.procreate(50, &params, &mut ids, &mut rng).is_none());
            prop_assert_eq!(mother.weight(), weight);
        }

        #[test]
        fn prop_appetite_never_exceeded(
            weights in proptest::collection::vec(0.5f64..80.0, 0..30),
            seed in any::<u64>(),
        ) {
            let mut params = AnimalParams::carnivore();
            params.delta_phi_max = Some(0.01);
            let herbivore_params = AnimalParams::herbivore();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut predator = carnivore(5, 40.0);
            predator.fitness = 1.0;
            let mut prey: Vec<Animal> = weights.iter().map(|&w| herbivore(60, w)).collect();
            for victim in &mut prey {
                victim.refresh_fitness(&herbivore_params);
            }

            let eaten = predator.hunt(&mut prey, &params, &mut rng);
            prop_assert!(eaten <= params.f + 1e-9);
        }
    }
}
