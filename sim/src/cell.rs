use crate::animal::{Animal, AnimalId, AnimalIds};
use crate::error::SimError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{AnimalRecord, Location, Parameters, Species, Terrain};
use std::cmp::Ordering;

/// The four orthogonal neighbours of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Neighbouring location, `None` when it would leave the coordinate range
    pub fn step(self, from: Location) -> Option<Location> {
        let Location { row, col } = from;
        match self {
            Direction::North => row.checked_sub(1).map(|row| Location::new(row, col)),
            Direction::South => Some(Location::new(row + 1, col)),
            Direction::West => col.checked_sub(1).map(|col| Location::new(row, col)),
            Direction::East => Some(Location::new(row, col + 1)),
        }
    }
}

/// An animal's wish to move, decided during the per-cell phase and
/// realised by the island once every cell has been processed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Migration {
    pub animal: AnimalId,
    pub species: Species,
    pub from: Location,
    pub to: Option<Location>,
}

/// One grid tile with its fodder and its two populations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    location: Location,
    terrain: Terrain,
    fodder: Option<f64>,
    herbivores: Vec<Animal>,
    carnivores: Vec<Animal>,
}

fn by_fitness(a: &Animal, b: &Animal) -> Ordering {
    a.fitness().total_cmp(&b.fitness())
}

impl Cell {
    pub fn new(location: Location, terrain: Terrain, params: &Parameters) -> Self {
        Self {
            location,
            terrain,
            fodder: params.f_max(terrain),
            herbivores: Vec::new(),
            carnivores: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn is_habitable(&self) -> bool {
        self.terrain.is_habitable()
    }

    /// Fodder left this year, `None` on terrain without fodder
    pub fn fodder(&self) -> Option<f64> {
        self.fodder
    }

    pub fn population(&self, species: Species) -> &[Animal] {
        match species {
            Species::Herbivore => &self.herbivores,
            Species::Carnivore => &self.carnivores,
        }
    }

    fn population_mut(&mut self, species: Species) -> &mut Vec<Animal> {
        match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Carnivore => &mut self.carnivores,
        }
    }

    pub fn count(&self, species: Species) -> usize {
        self.population(species).len()
    }

    pub fn herbivore_count(&self) -> usize {
        self.herbivores.len()
    }

    pub fn carnivore_count(&self) -> usize {
        self.carnivores.len()
    }

    /// All residents, herbivores first
    pub fn animals(&self) -> impl Iterator<Item = &Animal> {
        self.herbivores.iter().chain(self.carnivores.iter())
    }

    /// Validate a record and add the described animal
    pub fn add_animal(
        &mut self,
        record: &AnimalRecord,
        params: &Parameters,
        ids: &mut AnimalIds,
    ) -> Result<AnimalId, SimError> {
        if !self.is_habitable() {
            return Err(SimError::NotHabitable {
                location: self.location,
                terrain: self.terrain,
            });
        }
        let spec = record.validate()?;
        let animal = Animal::new(
            ids.next_id(),
            spec,
            self.location,
            params.animal(spec.species),
        );
        let id = animal.id;
        self.population_mut(spec.species).push(animal);
        Ok(id)
    }

    /// Move an existing animal into this cell
    pub fn insert(&mut self, mut animal: Animal) -> Result<(), SimError> {
        if !self.is_habitable() {
            return Err(SimError::NotHabitable {
                location: self.location,
                terrain: self.terrain,
            });
        }
        animal.relocate(self.location);
        self.population_mut(animal.species).push(animal);
        Ok(())
    }

    /// Remove an animal by id, keeping the order of the others
    pub fn take(&mut self, species: Species, id: AnimalId) -> Option<Animal> {
        let population = self.population_mut(species);
        let index = population.iter().position(|animal| animal.id == id)?;
        Some(population.remove(index))
    }

    /// Give every resident one chance to procreate.
    ///
    /// The count passed to each mother is the population size before any
    /// birth this year, and newborns join only after the whole pass.
    pub fn add_newborns<R: Rng>(&mut self, params: &Parameters, ids: &mut AnimalIds, rng: &mut R) {
        for species in Species::ALL {
            let animal_params = params.animal(species);
            let population = self.population_mut(species);
            let count = population.len();
            let newborns: Vec<Animal> = population
                .iter_mut()
                .filter_map(|animal| animal.procreate(count, animal_params, ids, rng))
                .collect();
            population.extend(newborns);
        }
    }

    /// Grazing (fittest herbivores first) followed by predation
    pub fn feed_animals<R: Rng>(&mut self, params: &Parameters, rng: &mut R) {
        if let Some(fodder) = self.fodder.as_mut() {
            self.herbivores.sort_by(|a, b| by_fitness(b, a));
            for herbivore in self.herbivores.iter_mut() {
                if *fodder <= 0.0 {
                    break;
                }
                *fodder -= herbivore.graze(*fodder, &params.herbivore);
            }
        }

        self.feed_carnivores(params, rng);
    }

    /// Carnivores hunt in random order, weakest herbivores are attacked
    /// first, and each kill is removed before the next carnivore's turn
    fn feed_carnivores<R: Rng>(&mut self, params: &Parameters, rng: &mut R) {
        if self.herbivores.is_empty() {
            return;
        }

        self.herbivores.sort_by(by_fitness);
        self.carnivores.shuffle(rng);

        for carnivore in self.carnivores.iter_mut() {
            carnivore.hunt(&mut self.herbivores, &params.carnivore, rng);
            self.herbivores.retain(Animal::is_alive);
        }
    }

    /// Decide who wants to leave and where to. Cell membership is unchanged.
    pub fn moving_animals_list<R: Rng>(&self, params: &Parameters, rng: &mut R) -> Vec<Migration> {
        let mut moving = Vec::new();

        for animal in self.animals().filter(|animal| animal.is_alive()) {
            if animal.wants_to_migrate(params.animal(animal.species), rng) {
                let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                moving.push(Migration {
                    animal: animal.id,
                    species: animal.species,
                    from: self.location,
                    to: direction.step(self.location),
                });
            }
        }

        moving
    }

    pub fn age_animals(&mut self) {
        for animal in self.herbivores.iter_mut().chain(self.carnivores.iter_mut()) {
            animal.age_one_year();
        }
    }

    pub fn loss_of_weight(&mut self, params: &Parameters) {
        for species in Species::ALL {
            let animal_params = params.animal(species);
            for animal in self.population_mut(species).iter_mut() {
                animal.lose_weight(animal_params);
            }
        }
    }

    /// Evaluate death for every resident, then drop the dead
    pub fn animal_death<R: Rng>(&mut self, params: &Parameters, rng: &mut R) {
        for species in Species::ALL {
            let animal_params = params.animal(species);
            let population = self.population_mut(species);
            for animal in population.iter_mut() {
                animal.check_death(animal_params, rng);
            }
            population.retain(Animal::is_alive);
        }
    }

    /// Refill fodder to the terrain maximum
    pub fn reset_fodder(&mut self, params: &Parameters) {
        self.fodder = params.f_max(self.terrain);
    }

    /// Bring cached fitness in line with changed species parameters
    pub fn refresh_fitness(&mut self, species: Species, params: &Parameters) {
        let animal_params = params.animal(species);
        for animal in self.population_mut(species).iter_mut() {
            animal.refresh_fitness(animal_params);
        }
    }
}
