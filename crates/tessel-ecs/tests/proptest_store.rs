//! Property tests for the component store.
//!
//! Random sequences of store operations are replayed against both the store
//! and a naive model (a plain map of maps). After every step the two indices
//! of the store must agree with each other and with the model, and queries
//! must return exactly the entities the model says hold every tag.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use tessel_ecs::prelude::*;

const TAGS: [&str; 4] = ["a", "b", "c", "d"];

/// Operations we can perform on the store.
#[derive(Debug, Clone)]
enum StoreOp {
    Add(u64, usize, i32),
    AddMany(u64, Vec<(usize, i32)>),
    Spawn(Vec<(usize, i32)>),
    RemoveComponent(u64, usize),
    RemoveEntity(u64),
    Query(Vec<usize>),
}

fn tag_index() -> impl Strategy<Value = usize> {
    0..TAGS.len()
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (1..20u64, tag_index(), any::<i32>()).prop_map(|(e, t, v)| StoreOp::Add(e, t, v)),
        (1..20u64, prop::collection::vec((tag_index(), any::<i32>()), 0..4))
            .prop_map(|(e, pairs)| StoreOp::AddMany(e, pairs)),
        prop::collection::vec((tag_index(), any::<i32>()), 1..4).prop_map(StoreOp::Spawn),
        (1..20u64, tag_index()).prop_map(|(e, t)| StoreOp::RemoveComponent(e, t)),
        (1..20u64).prop_map(StoreOp::RemoveEntity),
        prop::collection::vec(tag_index(), 0..5).prop_map(StoreOp::Query),
    ]
}

type Model = BTreeMap<u64, BTreeMap<&'static str, Component>>;

fn value(v: i32) -> Component {
    Component::Vec2(Vec2::new(v as f32, 0.0))
}

fn model_add(model: &mut Model, entity: u64, tag: usize, v: i32) {
    model.entry(entity).or_default().insert(TAGS[tag], value(v));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_index_symmetry(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = ComponentStore::new();
        let mut model = Model::new();

        for op in ops {
            match op {
                StoreOp::Add(e, t, v) => {
                    store.add_component(EntityId::new(e), TAGS[t], value(v));
                    model_add(&mut model, e, t, v);
                }
                StoreOp::AddMany(e, pairs) => {
                    store.add_components(
                        EntityId::new(e),
                        pairs.iter().map(|&(t, v)| (TAGS[t], value(v))),
                    );
                    for (t, v) in pairs {
                        model_add(&mut model, e, t, v);
                    }
                }
                StoreOp::Spawn(pairs) => {
                    let e = store.spawn(pairs.iter().map(|&(t, v)| (TAGS[t], value(v))));
                    prop_assert!(!model.contains_key(&e.to_raw()), "spawn reused a live id");
                    for (t, v) in pairs {
                        model_add(&mut model, e.to_raw(), t, v);
                    }
                }
                StoreOp::RemoveComponent(e, t) => {
                    let removed = store.remove_component(EntityId::new(e), TAGS[t]);
                    let expected = model.get_mut(&e).and_then(|row| row.remove(TAGS[t]));
                    if model.get(&e).is_some_and(|row| row.is_empty()) {
                        model.remove(&e);
                    }
                    prop_assert_eq!(removed, expected);
                }
                StoreOp::RemoveEntity(e) => {
                    let removed = store.remove_entity(EntityId::new(e));
                    prop_assert_eq!(removed, model.remove(&e).is_some());
                }
                StoreOp::Query(tags) => {
                    let wanted: BTreeSet<&str> = tags.iter().map(|&t| TAGS[t]).collect();
                    let result = store.query(tags.iter().map(|&t| TAGS[t]).collect::<Vec<_>>());
                    let expected: Vec<u64> = if wanted.is_empty() {
                        Vec::new()
                    } else {
                        model
                            .iter()
                            .filter(|(_, row)| wanted.iter().all(|tag| row.contains_key(tag)))
                            .map(|(e, _)| *e)
                            .collect()
                    };
                    let actual: Vec<u64> = result.entities().map(EntityId::to_raw).collect();
                    prop_assert_eq!(actual, expected);
                    for (_, row) in result.iter() {
                        prop_assert_eq!(row.len(), wanted.len());
                    }
                }
            }

            // Invariant: both indices agree.
            prop_assert!(store.check_consistency().is_ok());

            // Invariant: store contents equal the model, seen from either index.
            prop_assert_eq!(store.entity_count(), model.len());
            for (e, row) in &model {
                let id = EntityId::new(*e);
                prop_assert_eq!(store.components_of(id).count(), row.len());
                for (tag, v) in row {
                    prop_assert_eq!(store.get(id, tag), Some(v));
                    let via_index = store.entities_with(tag).find(|(entity, _)| *entity == id);
                    prop_assert_eq!(via_index.map(|(_, c)| c), Some(v));
                }
            }
            for tag in TAGS {
                let holders = model.values().filter(|row| row.contains_key(tag)).count();
                prop_assert_eq!(store.count_with(tag), holders);
            }
        }
    }

    /// Overwriting a pair any number of times leaves one association holding
    /// the last value.
    #[test]
    fn upsert_keeps_last_value(values in prop::collection::vec(any::<i32>(), 1..10)) {
        let mut store = ComponentStore::new();
        let e = EntityId::new(1);
        for v in &values {
            store.add_component(e, "x", value(*v));
        }
        let last = value(*values.last().unwrap());
        prop_assert_eq!(store.get(e, "x"), Some(&last));
        prop_assert_eq!(store.count_with("x"), 1);
        prop_assert_eq!(store.components_of(e).count(), 1);
    }
}
