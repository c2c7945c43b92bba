use shared::{AnimalRecord, Location, ParameterUpdate, Parameters, PopulationRecord, Species, Terrain};
use sim::animal::AnimalIds;
use sim::{Cell, Island, MapError, SimError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

fn update(pairs: &[(&str, f64)]) -> ParameterUpdate {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn lone_lowland_cell_can_only_grow_or_hold() {
    let mut island = Island::new("WWW\nWLW\nWWW", 2024).unwrap();
    island
        .set_animal_parameters(Species::Herbivore, &update(&[("omega", 0.0)]))
        .unwrap();
    island
        .add_population(&[PopulationRecord::new(
            (2, 2),
            vec![AnimalRecord::new(Species::Herbivore, 5, 20.0); 2],
        )])
        .unwrap();

    let totals = island.yearly_cycle().unwrap().totals;
    let cell = island.cell(Location::new(2, 2)).unwrap();

    assert!((2..=3).contains(&cell.herbivore_count()));
    assert_eq!(totals.herbivores, cell.herbivore_count());
    assert_eq!(totals.carnivores, 0);
}

#[test]
fn land_on_the_border_is_rejected() {
    let result = Island::new("LWW\nWLW\nWWW", 1);
    assert!(matches!(
        result,
        Err(SimError::Map(MapError::BorderNotWater {
            terrain: Terrain::Lowland,
            ..
        }))
    ));
}

#[test]
fn saturated_kill_probability_takes_weak_prey() {
    let mut params = Parameters::default();
    params
        .set_animal(Species::Carnivore, &update(&[("DeltaPhiMax", 0.1)]))
        .unwrap();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ids = AnimalIds::default();
        let mut cell = Cell::new(Location::new(2, 2), Terrain::Desert, &params);
        // Young, heavy predator: fitness within 1e-4 of one.
        cell.add_animal(&AnimalRecord::new(Species::Carnivore, 0, 100.0), &params, &mut ids)
            .unwrap();
        // Old, light prey: fitness close to zero, weight below the appetite.
        cell.add_animal(&AnimalRecord::new(Species::Herbivore, 100, 4.0), &params, &mut ids)
            .unwrap();

        cell.feed_animals(&params, &mut rng);
        assert_eq!(cell.herbivore_count(), 0, "seed {seed}");
        assert!(cell.population(Species::Carnivore)[0].weight() > 100.0);
    }
}

#[test]
fn survivors_move_at_most_one_step_per_year() {
    let map = "
        WWW
        WLW
        WLW
        WLW
        WLW
        WLW
        WWW
    ";
    let mut island = Island::new(map, 99).unwrap();
    island
        .set_animal_parameters(Species::Herbivore, &update(&[("mu", 100000.0), ("eta", 0.0)]))
        .unwrap();
    let population: Vec<PopulationRecord> = (2..=6)
        .map(|row| {
            PopulationRecord::new(
                (row, 2),
                vec![AnimalRecord::new(Species::Herbivore, 5, 20.0); 4],
            )
        })
        .collect();
    island.add_population(&population).unwrap();

    let positions = |island: &Island| -> HashMap<u64, Location> {
        island
            .habitable_cells()
            .flat_map(|cell| cell.population(Species::Herbivore))
            .map(|animal| (animal.id, animal.location))
            .collect()
    };

    let mut moved_total = 0;
    for _ in 0..10 {
        let before = positions(&island);
        island.yearly_cycle().unwrap();
        let after = positions(&island);

        for (id, now) in &after {
            let Some(then) = before.get(id) else {
                continue;
            };
            let distance = now.row.abs_diff(then.row) + now.col.abs_diff(then.col);
            assert!(distance <= 1, "animal {id} jumped from {then} to {now}");
            assert_eq!(now.col, 2);
            if distance == 1 {
                assert_ne!(now.row % 2, then.row % 2);
                moved_total += 1;
            }
        }
    }
    assert!(moved_total > 0);
}

#[test]
fn migration_never_changes_island_total() {
    let map = "
        WWWWW
        WLLLW
        WLLLW
        WLLLW
        WWWWW
    ";
    let mut island = Island::new(map, 5).unwrap();
    island
        .set_animal_parameters(
            Species::Herbivore,
            &update(&[("mu", 1000.0), ("omega", 0.0), ("gamma", 0.0)]),
        )
        .unwrap();
    island
        .add_population(&[PopulationRecord::new(
            (3, 3),
            vec![AnimalRecord::new(Species::Herbivore, 5, 20.0); 30],
        )])
        .unwrap();

    for _ in 0..5 {
        let totals = island.yearly_cycle().unwrap().totals;
        assert_eq!(totals.herbivores, 30);
    }
    assert!(island.cell(Location::new(3, 3)).unwrap().herbivore_count() < 30);
}
