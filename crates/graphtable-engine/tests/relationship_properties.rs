//! Property tests for relationship invariants.

use graphtable_engine::{Catalog, EntityId, OwnerOutcome, RelationshipEngine};
use graphtable_store::{MemoryStore, RecordStore};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const OWNERSHIP: &str = "VIDEO-OWNERSHIP";
const ASSOCIATION: &str = "VIDEO-CHANNEL-ASSOCIATION";
const SUBSCRIBE: &str = "VIEWER-SUBSCRIBE-CHANNEL";

fn engine() -> RelationshipEngine<MemoryStore> {
    let catalog = Catalog::builder()
        .entity("USER")
        .entity("VIDEO")
        .entity("CHANNEL")
        .one_to_many(OWNERSHIP, "USER", "VIDEO")
        .many_to_many(ASSOCIATION, "VIDEO", "CHANNEL")
        .many_to_many(SUBSCRIBE, "USER", "CHANNEL")
        .build()
        .unwrap();
    RelationshipEngine::new(MemoryStore::new(), catalog)
}

fn id_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,3}-[0-9]{1,2}"
}

fn set(ids: Vec<EntityId>) -> BTreeSet<String> {
    ids.into_iter().map(String::from).collect()
}

proptest! {
    /// However many reassignments happen, each video has at most one owner
    /// and it is the last one assigned.
    #[test]
    fn prop_single_owner_after_any_sequence(
        ops in prop::collection::vec((0usize..4, 0usize..4), 1..40)
    ) {
        let engine = engine();
        let mut expected: BTreeMap<String, String> = BTreeMap::new();

        for (video, user) in ops {
            let video = format!("v-{video}");
            let user = format!("u-{user}");
            engine.set_owner(OWNERSHIP, &video, &user).unwrap();
            expected.insert(video, user);
        }

        for (video, user) in &expected {
            let partition = engine
                .store()
                .query_by_primary_key(&format!("{video}_{OWNERSHIP}"))
                .unwrap();
            prop_assert_eq!(partition.len(), 1);
            prop_assert_eq!(
                engine.find_owner(OWNERSHIP, video).unwrap().map(String::from),
                Some(user.clone())
            );
        }

        // Reverse traversal agrees with the forward view.
        for user in 0..4 {
            let user = format!("u-{user}");
            let owned = set(engine.list_owned_by(OWNERSHIP, &user).unwrap());
            let want: BTreeSet<String> = expected
                .iter()
                .filter(|(_, owner)| **owner == user)
                .map(|(video, _)| video.clone())
                .collect();
            prop_assert_eq!(owned, want);
        }
    }

    /// Re-applying the current owner never changes the table.
    #[test]
    fn prop_set_owner_is_idempotent(video in id_strategy(), user in id_strategy()) {
        let engine = engine();
        engine.set_owner(OWNERSHIP, &video, &user).unwrap();
        let before = engine.store().snapshot();

        prop_assert_eq!(engine.set_owner(OWNERSHIP, &video, &user).unwrap(), OwnerOutcome::Unchanged);
        prop_assert_eq!(engine.store().snapshot(), before);
    }

    /// Linking a pair any number of times leaves exactly one edge.
    #[test]
    fn prop_link_is_idempotent(left in id_strategy(), right in id_strategy(), repeats in 1usize..5) {
        let engine = engine();
        for _ in 0..repeats {
            engine.link_m2m(ASSOCIATION, &left, &right).unwrap();
        }
        prop_assert_eq!(engine.store().len(), 1);
    }

    /// Forward and reverse many-to-many traversals describe the same edge set.
    #[test]
    fn prop_m2m_traversals_agree(
        pairs in prop::collection::btree_set((id_strategy(), id_strategy()), 0..25)
    ) {
        let engine = engine();
        for (left, right) in &pairs {
            engine.link_m2m(ASSOCIATION, left, right).unwrap();
        }

        let lefts: BTreeSet<&String> = pairs.iter().map(|(l, _)| l).collect();
        let rights: BTreeSet<&String> = pairs.iter().map(|(_, r)| r).collect();

        let mut forward = BTreeSet::new();
        for left in lefts {
            for right in engine.list_left_of_m2m(ASSOCIATION, left).unwrap() {
                forward.insert((left.clone(), String::from(right)));
            }
        }
        let mut reverse = BTreeSet::new();
        for right in rights {
            for left in engine.list_right_of_m2m(ASSOCIATION, right).unwrap() {
                reverse.insert((String::from(left), right.clone()));
            }
        }

        prop_assert_eq!(&forward, &pairs);
        prop_assert_eq!(&reverse, &pairs);
    }

    /// Edges of one kind never show up in another kind's queries, even when
    /// the ids coincide.
    #[test]
    fn prop_kinds_do_not_collide(a in id_strategy(), b in id_strategy()) {
        let engine = engine();
        engine.link_m2m(ASSOCIATION, &a, &b).unwrap();

        prop_assert!(engine.list_left_of_m2m(SUBSCRIBE, &a).unwrap().is_empty());
        prop_assert!(engine.list_right_of_m2m(SUBSCRIBE, &b).unwrap().is_empty());
        prop_assert!(engine.list_owned_by(OWNERSHIP, &b).unwrap().is_empty());
        prop_assert_eq!(engine.find_owner(OWNERSHIP, &a).unwrap(), None);
    }

    /// Ids containing the separator are rejected before anything is written.
    #[test]
    fn prop_separator_ids_rejected(prefix in "[a-z]{1,4}", suffix in "[a-z]{1,4}") {
        let engine = engine();
        let bad = format!("{prefix}_{suffix}");
        prop_assert!(engine.create_entity("USER", &bad, "x").is_err());
        prop_assert!(engine.set_owner(OWNERSHIP, &bad, "u-1").is_err());
        prop_assert!(engine.link_m2m(ASSOCIATION, "c-1", &bad).is_err());
        prop_assert!(engine.store().is_empty());
    }
}
