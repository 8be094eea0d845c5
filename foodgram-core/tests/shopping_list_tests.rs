//! End-to-end tests for the shopping cart pipeline: store → aggregation → CSV.

use foodgram_core::{
    aggregate_shopping_cart, render_shopping_list, AggregateError, AggregatedLine, MemoryStore,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn aggregated(name: &str, unit: &str, total_amount: u64) -> AggregatedLine {
    AggregatedLine {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        total_amount,
    }
}

/// Cart with R1 (Flour 200 g, Sugar 50 g) and R2 (Flour 100 g, Egg 2 pcs).
fn baking_store(user: Uuid) -> MemoryStore {
    let r1 = Uuid::new_v4();
    let r2 = Uuid::new_v4();
    MemoryStore::new()
        .with_recipe(r1, &[("Flour", "g", 200), ("Sugar", "g", 50)])
        .with_recipe(r2, &[("Flour", "g", 100), ("Egg", "pcs", 2)])
        .with_cart_entry(user, r1)
        .with_cart_entry(user, r2)
}

#[test]
fn test_baking_scenario() {
    let user = Uuid::new_v4();
    let mut store = baking_store(user);

    let lines = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(
        lines,
        vec![
            aggregated("Egg", "pcs", 2),
            aggregated("Flour", "g", 300),
            aggregated("Sugar", "g", 50),
        ]
    );

    let export = render_shopping_list(&lines).unwrap();
    assert_eq!(
        String::from_utf8(export.body).unwrap(),
        "Egg,pcs,2\r\nFlour,g,300\r\nSugar,g,50\r\n"
    );
}

#[test]
fn test_only_cart_recipes_are_counted() {
    let user = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    let in_cart = Uuid::new_v4();
    let not_in_cart = Uuid::new_v4();
    let someone_elses = Uuid::new_v4();

    let mut store = MemoryStore::new()
        .with_recipe(in_cart, &[("Rice", "g", 150), ("Salt", "g", 3)])
        .with_recipe(not_in_cart, &[("Rice", "g", 1000)])
        .with_recipe(someone_elses, &[("Salt", "g", 50), ("Pepper", "g", 2)])
        .with_cart_entry(user, in_cart)
        .with_cart_entry(other_user, someone_elses);

    let lines = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(
        lines,
        vec![aggregated("Rice", "g", 150), aggregated("Salt", "g", 3)]
    );
}

#[test]
fn test_totals_match_line_sums_without_duplicate_keys() {
    let user = Uuid::new_v4();
    let recipes: Vec<(Uuid, Vec<(&str, &str, u32)>)> = vec![
        (Uuid::new_v4(), vec![("onion", "pcs", 1), ("oil", "ml", 30), ("garlic", "clove", 2)]),
        (Uuid::new_v4(), vec![("onion", "pcs", 2), ("oil", "tbsp", 1)]),
        (Uuid::new_v4(), vec![("garlic", "clove", 4), ("oil", "ml", 15), ("tomato", "g", 400)]),
    ];

    let mut store = MemoryStore::new();
    let mut expected: HashMap<(String, String), u64> = HashMap::new();
    for (recipe_id, lines) in &recipes {
        store = store.with_recipe(*recipe_id, lines).with_cart_entry(user, *recipe_id);
        for (name, unit, amount) in lines {
            *expected
                .entry((name.to_string(), unit.to_string()))
                .or_default() += u64::from(*amount);
        }
    }

    let lines = aggregate_shopping_cart(&mut store, user).unwrap();

    let keys: HashSet<(String, String)> = lines
        .iter()
        .map(|l| (l.name.clone(), l.measurement_unit.clone()))
        .collect();
    assert_eq!(keys.len(), lines.len(), "duplicate keys in {:?}", lines);
    assert_eq!(lines.len(), expected.len());

    for line in &lines {
        let key = (line.name.clone(), line.measurement_unit.clone());
        assert_eq!(Some(&line.total_amount), expected.get(&key));
        assert!(line.total_amount > 0);
    }
}

#[test]
fn test_empty_cart_is_empty_export() {
    let user = Uuid::new_v4();
    let mut store = MemoryStore::new().with_recipe(Uuid::new_v4(), &[("Milk", "ml", 200)]);

    for _ in 0..2 {
        let lines = aggregate_shopping_cart(&mut store, user).unwrap();
        assert!(lines.is_empty());
        let export = render_shopping_list(&lines).unwrap();
        assert!(export.body.is_empty());
        assert_eq!(export.filename, "shopping_list.csv");
    }
}

#[test]
fn test_rows_sorted_and_stable_across_runs() {
    let user = Uuid::new_v4();
    let mut store = baking_store(user);

    let first = aggregate_shopping_cart(&mut store, user).unwrap();
    let second = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(first, second);

    let names: Vec<&str> = first.iter().map(|l| l.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    assert_eq!(
        render_shopping_list(&first).unwrap(),
        render_shopping_list(&second).unwrap()
    );
}

#[test]
fn test_cart_changes_are_reflected_on_next_export() {
    let user = Uuid::new_v4();
    let soup = Uuid::new_v4();
    let salad = Uuid::new_v4();
    let mut store = MemoryStore::new()
        .with_recipe(soup, &[("Carrot", "pcs", 2)])
        .with_recipe(salad, &[("Carrot", "pcs", 1), ("Lettuce", "head", 1)])
        .with_cart_entry(user, soup);

    let before = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(before, vec![aggregated("Carrot", "pcs", 2)]);

    store.add_to_cart(user, salad);
    let after_add = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(
        after_add,
        vec![aggregated("Carrot", "pcs", 3), aggregated("Lettuce", "head", 1)]
    );

    store.delete_recipe(soup);
    let after_delete = aggregate_shopping_cart(&mut store, user).unwrap();
    assert_eq!(
        after_delete,
        vec![aggregated("Carrot", "pcs", 1), aggregated("Lettuce", "head", 1)]
    );
}

#[test]
fn test_round_trip_through_csv_reader() {
    let user = Uuid::new_v4();
    let recipe = Uuid::new_v4();
    let mut store = MemoryStore::new()
        .with_recipe(
            recipe,
            &[
                ("salt, kosher", "g", 12),
                ("\"heavy\" cream", "ml", 250),
                ("сахар", "г", 75),
                ("eggs", "pcs", 3),
            ],
        )
        .with_cart_entry(user, recipe);

    let lines = aggregate_shopping_cart(&mut store, user).unwrap();
    let export = render_shopping_list(&lines).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(export.body.as_slice());

    let mut parsed = Vec::new();
    for record in reader.records() {
        let record = record.unwrap();
        assert_eq!(record.len(), 3);
        parsed.push(aggregated(
            &record[0],
            &record[1],
            record[2].parse::<u64>().unwrap(),
        ));
    }

    assert_eq!(parsed, lines);
}

#[test]
fn test_store_failure_propagates() {
    let user = Uuid::new_v4();
    let mut store = baking_store(user).unavailable();

    match aggregate_shopping_cart(&mut store, user) {
        Err(AggregateError::Store(_)) => {}
        other => panic!("expected store error, got {:?}", other),
    }
}
