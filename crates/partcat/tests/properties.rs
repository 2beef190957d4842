use partcat::commands::{build, define, reorder, resolve, DefineMode};
use partcat::model::{AttributeScope, DataType};
use partcat::spec::{AttributeDef, CategorySpec};
use partcat::store::{DataStore, InMemoryStore};
use partcat::TaxonomyError;
use proptest::prelude::*;
use proptest::test_runner::Config;
use std::collections::HashSet;

const NAME_POOL: [&str; 6] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

/// Turns a parent-choice vector into a nested forest. Node `i` hangs below
/// `choice % i` when a choice is given, otherwise it becomes a root.
fn forest(choices: &[Option<usize>]) -> Vec<CategorySpec> {
    let parents: Vec<Option<usize>> = choices
        .iter()
        .enumerate()
        .map(|(i, c)| if i == 0 { None } else { c.map(|p| p % i) })
        .collect();

    fn node(i: usize, level: u32, parents: &[Option<usize>]) -> CategorySpec {
        let children = parents
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(i))
            .map(|(c, _)| node(c, level + 1, parents))
            .collect();
        CategorySpec::new(format!("node-{i}"), format!("Node {i}"), level, i as u32)
            .with_children(children)
    }

    parents
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_none())
        .map(|(i, _)| node(i, 0, &parents))
        .collect()
}

fn chain(depth: usize) -> Vec<CategorySpec> {
    let mut spec = CategorySpec::new(format!("level-{}", depth - 1), "leaf", (depth - 1) as u32, 0);
    for level in (0..depth - 1).rev() {
        spec = CategorySpec::new(format!("level-{level}"), "level", level as u32, 0).child(spec);
    }
    vec![spec]
}

fn decimal(name: &str, sort_order: u32) -> AttributeDef {
    AttributeDef::new(name, DataType::Decimal, AttributeScope::Part).sort_order(sort_order)
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn build_is_idempotent(choices in prop::collection::vec(prop::option::of(any::<usize>()), 1..24)) {
        let specs = forest(&choices);
        let mut store = InMemoryStore::new();

        let first = build::run(&mut store, &specs, None).unwrap();
        let snapshot = store.list_categories().unwrap();
        let second = build::run(&mut store, &specs, None).unwrap();

        prop_assert_eq!(first.len(), choices.len());
        prop_assert_eq!(first, second);
        prop_assert_eq!(store.list_categories().unwrap(), snapshot);
    }

    #[test]
    fn every_built_child_sits_one_level_below_its_parent(
        choices in prop::collection::vec(prop::option::of(any::<usize>()), 1..24)
    ) {
        let mut store = InMemoryStore::new();
        build::run(&mut store, &forest(&choices), None).unwrap();
        for node in store.list_categories().unwrap() {
            if let Some(parent_id) = node.parent_id {
                let parent = store.get_category(&parent_id).unwrap();
                prop_assert_eq!(node.level, parent.level + 1);
            }
        }
    }

    #[test]
    fn reorder_applies_any_permutation(order in Just(NAME_POOL.to_vec()).prop_shuffle()) {
        let mut store = InMemoryStore::new();
        let slugs = build::run(&mut store, &chain(1), None).unwrap();
        let id = slugs["level-0"];
        let defs: Vec<AttributeDef> = NAME_POOL
            .iter()
            .enumerate()
            .map(|(i, n)| decimal(n, i as u32))
            .collect();
        define::run(&mut store, &id, &defs, DefineMode::AllOrNothing).unwrap();

        reorder::attributes(&mut store, &id, &order).unwrap();
        let stored = store.list_definitions(&id).unwrap();
        let names: Vec<&str> = stored.iter().map(|d| d.name.as_str()).collect();
        let positions: Vec<u32> = stored.iter().map(|d| d.sort_order).collect();
        prop_assert_eq!(names, order);
        prop_assert_eq!(positions, (0..NAME_POOL.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn reorder_rejects_incomplete_sets(drop in 0..NAME_POOL.len(), dup in 0..NAME_POOL.len()) {
        let mut store = InMemoryStore::new();
        let slugs = build::run(&mut store, &chain(1), None).unwrap();
        let id = slugs["level-0"];
        let defs: Vec<AttributeDef> = NAME_POOL
            .iter()
            .enumerate()
            .map(|(i, n)| decimal(n, i as u32))
            .collect();
        define::run(&mut store, &id, &defs, DefineMode::AllOrNothing).unwrap();
        let before = store.list_definitions(&id).unwrap();

        let mut order: Vec<&str> = NAME_POOL.to_vec();
        order.remove(drop);
        order.push(NAME_POOL[dup]);
        let result = reorder::attributes(&mut store, &id, &order);
        if drop == dup {
            // Removing and re-adding the same name is still a permutation.
            prop_assert!(result.is_ok());
        } else {
            let is_invalid_set = matches!(result, Err(TaxonomyError::InvalidReorderSet { .. }));
            prop_assert!(is_invalid_set);
            prop_assert_eq!(store.list_definitions(&id).unwrap(), before);
        }
    }

    #[test]
    fn nearest_declaration_wins(
        declared in prop::collection::vec(prop::sample::subsequence(NAME_POOL.to_vec(), 0..=NAME_POOL.len()), 1..6)
    ) {
        let depth = declared.len();
        let mut store = InMemoryStore::new();
        let slugs = build::run(&mut store, &chain(depth), None).unwrap();
        for (level, names) in declared.iter().enumerate() {
            let defs: Vec<AttributeDef> = names
                .iter()
                .enumerate()
                .map(|(i, n)| decimal(n, i as u32))
                .collect();
            define::run(&mut store, &slugs[&format!("level-{level}")], &defs, DefineMode::AllOrNothing)
                .unwrap();
        }

        let leaf = slugs[&format!("level-{}", depth - 1)];
        let schema = resolve::run(&store, &leaf, 64).unwrap();
        prop_assert_eq!(&schema, &resolve::run(&store, &leaf, 64).unwrap());

        let names: HashSet<&str> = schema.iter().map(|a| a.name()).collect();
        prop_assert_eq!(names.len(), schema.len());
        let expected: HashSet<&str> = declared.iter().flatten().copied().collect();
        prop_assert_eq!(names, expected);

        for attr in schema.iter() {
            let nearest = (0..depth)
                .rev()
                .find(|level| declared[*level].contains(&attr.name()))
                .unwrap();
            prop_assert_eq!(attr.owner_category_id, slugs[&format!("level-{nearest}")]);
            prop_assert_eq!(attr.is_inherited, nearest != depth - 1);
        }
    }
}
