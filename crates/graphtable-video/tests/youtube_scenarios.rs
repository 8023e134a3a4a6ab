//! Scenario tests over the demonstration dataset.

use graphtable_engine::{CreateOutcome, EngineError, EntityId, LinkOutcome, OwnerOutcome};
use graphtable_store::{MemoryStore, RecordStore};
use graphtable_video::{seed_demo, VideoPlatform};
use std::collections::BTreeSet;

fn seeded() -> VideoPlatform<MemoryStore> {
    let platform = VideoPlatform::new(MemoryStore::new()).unwrap();
    seed_demo(&platform).unwrap();
    platform
}

fn ids(result: Result<Vec<EntityId>, EngineError>) -> BTreeSet<String> {
    result.unwrap().into_iter().map(String::from).collect()
}

fn set(expected: &[&str]) -> BTreeSet<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_ownership_queries() {
    let p = seeded();

    assert_eq!(ids(p.videos_created_by("u-1")), set(&["v-1-1", "v-1-2"]));
    assert_eq!(
        ids(p.videos_created_by("u-2")),
        set(&["v-2-1", "v-2-2", "v-2-3", "v-2-4"])
    );
    assert_eq!(ids(p.channels_created_by("u-1")), set(&["c-1-1"]));
    assert_eq!(ids(p.channels_created_by("u-2")), set(&["c-2-1", "c-2-2"]));
    assert_eq!(ids(p.playlists_created_by("u-3")), set(&["p-3-1", "p-3-2"]));
    assert!(ids(p.playlists_created_by("u-4")).is_empty());
}

#[test]
fn test_video_channel_queries() {
    let p = seeded();

    assert_eq!(ids(p.videos_in_channel("c-2-1")), set(&["v-2-1", "v-2-2", "v-2-3"]));
    assert_eq!(ids(p.videos_in_channel("c-2-2")), set(&["v-2-2", "v-2-3", "v-2-4"]));
    assert!(ids(p.videos_in_channel("c-1-1")).is_empty());

    assert_eq!(ids(p.channels_with_video("v-2-1")), set(&["c-2-1"]));
    assert_eq!(ids(p.channels_with_video("v-2-2")), set(&["c-2-1", "c-2-2"]));
    assert_eq!(ids(p.channels_with_video("v-2-3")), set(&["c-2-1", "c-2-2"]));
    assert_eq!(ids(p.channels_with_video("v-2-4")), set(&["c-2-2"]));
}

#[test]
fn test_video_playlist_queries() {
    let p = seeded();

    assert_eq!(ids(p.videos_in_playlist("p-3-1")), set(&["v-2-1", "v-2-2", "v-2-3"]));
    assert_eq!(ids(p.videos_in_playlist("p-3-2")), set(&["v-2-2", "v-2-3", "v-2-4"]));

    assert_eq!(ids(p.playlists_with_video("v-2-1")), set(&["p-3-1"]));
    assert_eq!(ids(p.playlists_with_video("v-2-2")), set(&["p-3-1", "p-3-2"]));
    assert_eq!(ids(p.playlists_with_video("v-2-3")), set(&["p-3-1", "p-3-2"]));
    assert_eq!(ids(p.playlists_with_video("v-2-4")), set(&["p-3-2"]));
}

#[test]
fn test_user_subscription_queries() {
    let p = seeded();

    assert_eq!(ids(p.followers_of_user("u-1")), set(&["u-2", "u-3", "u-4"]));
    assert_eq!(ids(p.followers_of_user("u-2")), set(&["u-1", "u-3"]));
    assert_eq!(ids(p.followers_of_user("u-3")), set(&["u-4"]));
    assert!(ids(p.followers_of_user("u-4")).is_empty());

    assert_eq!(ids(p.subscribed_youtubers("u-1")), set(&["u-2"]));
    assert_eq!(ids(p.subscribed_youtubers("u-2")), set(&["u-1"]));
    assert_eq!(ids(p.subscribed_youtubers("u-3")), set(&["u-1", "u-2"]));
    assert_eq!(ids(p.subscribed_youtubers("u-4")), set(&["u-1", "u-3"]));
}

#[test]
fn test_channel_subscription_queries() {
    let p = seeded();

    assert_eq!(ids(p.followers_of_channel("c-1-1")), set(&["u-2", "u-3"]));
    assert_eq!(ids(p.followers_of_channel("c-2-1")), set(&["u-1", "u-3"]));
    assert_eq!(ids(p.followers_of_channel("c-2-2")), set(&["u-1", "u-4"]));

    assert_eq!(ids(p.subscribed_channels("u-1")), set(&["c-2-1", "c-2-2"]));
    assert_eq!(ids(p.subscribed_channels("u-2")), set(&["c-1-1"]));
    assert_eq!(ids(p.subscribed_channels("u-3")), set(&["c-1-1", "c-2-1"]));
    assert_eq!(ids(p.subscribed_channels("u-4")), set(&["c-2-2"]));
}

#[test]
fn test_video_reassignment() {
    let p = VideoPlatform::new(MemoryStore::new()).unwrap();
    p.create_user("u-1", "Alice").unwrap();
    p.create_user("u-2", "Bob").unwrap();
    p.create_video("v-1", "Clip").unwrap();

    p.set_video_owner("v-1", "u-1").unwrap();
    p.set_video_owner("v-1", "u-2").unwrap();

    assert!(ids(p.videos_created_by("u-1")).is_empty());
    assert_eq!(ids(p.videos_created_by("u-2")), set(&["v-1"]));
    assert_eq!(p.owner_of_video("v-1").unwrap().unwrap(), "u-2");
    assert_eq!(
        p.store()
            .query_by_primary_key("v-1_VIDEO-OWNERSHIP")
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_video_in_two_channels() {
    let p = VideoPlatform::new(MemoryStore::new()).unwrap();
    assert_eq!(p.add_video_to_channel("v-2-2", "c-2-1").unwrap(), LinkOutcome::Linked);
    assert_eq!(p.add_video_to_channel("v-2-2", "c-2-2").unwrap(), LinkOutcome::Linked);
    assert_eq!(
        p.add_video_to_channel("v-2-2", "c-2-2").unwrap(),
        LinkOutcome::AlreadyLinked
    );

    assert_eq!(ids(p.channels_with_video("v-2-2")), set(&["c-2-1", "c-2-2"]));
    assert_eq!(ids(p.videos_in_channel("c-2-1")), set(&["v-2-2"]));
    assert_eq!(ids(p.videos_in_channel("c-2-2")), set(&["v-2-2"]));
}

#[test]
fn test_reseeding_reports_existing_state() {
    let p = seeded();
    assert_eq!(p.create_user("u-1", "Someone").unwrap(), CreateOutcome::AlreadyExists);
    assert_eq!(p.set_video_owner("v-1-1", "u-1").unwrap(), OwnerOutcome::Unchanged);
    assert_eq!(p.subscribe_user("u-1", "u-2").unwrap(), LinkOutcome::AlreadyLinked);

    let alice = p
        .list_users()
        .unwrap()
        .into_iter()
        .find(|r| r.primary_key == "u-1")
        .unwrap();
    assert_eq!(alice.display_name.as_deref(), Some("Alice"));
}

#[test]
fn test_transfer_moves_video_between_owner_lists() {
    let p = seeded();
    let outcome = p.set_video_owner("v-2-4", "u-1").unwrap();
    assert_eq!(
        outcome,
        OwnerOutcome::Assigned {
            previous: vec![EntityId::new("u-2").unwrap()]
        }
    );
    assert_eq!(ids(p.videos_created_by("u-1")), set(&["v-1-1", "v-1-2", "v-2-4"]));
    assert_eq!(ids(p.videos_created_by("u-2")), set(&["v-2-1", "v-2-2", "v-2-3"]));
    // Associations are independent of ownership.
    assert_eq!(ids(p.channels_with_video("v-2-4")), set(&["c-2-2"]));
}
