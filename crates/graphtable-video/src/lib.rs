//! Video platform model on top of the relationship engine.
//!
//! Four entity kinds and seven relationship kinds:
//!
//! | Kind                         | Category     | From     | To       |
//! |------------------------------|--------------|----------|----------|
//! | `VIDEO-OWNERSHIP`            | one-to-many  | VIDEO    | USER     |
//! | `CHANNEL-OWNERSHIP`          | one-to-many  | CHANNEL  | USER     |
//! | `PLAYLIST-OWNERSHIP`         | one-to-many  | PLAYLIST | USER     |
//! | `VIDEO-CHANNEL-ASSOCIATION`  | many-to-many | VIDEO    | CHANNEL  |
//! | `VIDEO-PLAYLIST-ASSOCIATION` | many-to-many | VIDEO    | PLAYLIST |
//! | `VIEWER-SUBSCRIBE-YOUTUBER`  | many-to-many | USER     | USER     |
//! | `VIEWER-SUBSCRIBE-CHANNEL`   | many-to-many | USER     | CHANNEL  |
//!
//! "From" is the partition side of the edge, "To" is reached through the
//! lookup index.
//!
//! [`VideoPlatform`] names every operation after what it means on the
//! platform and delegates to [`RelationshipEngine`].

pub mod demo;

use graphtable_engine::{
    Catalog, CatalogError, CreateOutcome, EngineResult, EntityId, LinkOutcome, OwnerOutcome,
    RelationshipEngine,
};
use graphtable_store::{Record, RecordStore};
use std::sync::Arc;

pub use demo::{query_report, seed_demo, ReportSection};

/// Kind tags of the video platform.
pub mod kinds {
    pub const USER: &str = "USER";
    pub const VIDEO: &str = "VIDEO";
    pub const CHANNEL: &str = "CHANNEL";
    pub const PLAYLIST: &str = "PLAYLIST";

    pub const VIDEO_OWNERSHIP: &str = "VIDEO-OWNERSHIP";
    pub const CHANNEL_OWNERSHIP: &str = "CHANNEL-OWNERSHIP";
    pub const PLAYLIST_OWNERSHIP: &str = "PLAYLIST-OWNERSHIP";

    pub const VIDEO_CHANNEL_ASSOCIATION: &str = "VIDEO-CHANNEL-ASSOCIATION";
    pub const VIDEO_PLAYLIST_ASSOCIATION: &str = "VIDEO-PLAYLIST-ASSOCIATION";
    pub const VIEWER_SUBSCRIBE_YOUTUBER: &str = "VIEWER-SUBSCRIBE-YOUTUBER";
    pub const VIEWER_SUBSCRIBE_CHANNEL: &str = "VIEWER-SUBSCRIBE-CHANNEL";
}

use kinds::*;

/// The platform catalog.
pub fn video_catalog() -> Result<Catalog, CatalogError> {
    Catalog::builder()
        .entity(USER)
        .entity(VIDEO)
        .entity(CHANNEL)
        .entity(PLAYLIST)
        .one_to_many(VIDEO_OWNERSHIP, USER, VIDEO)
        .one_to_many(CHANNEL_OWNERSHIP, USER, CHANNEL)
        .one_to_many(PLAYLIST_OWNERSHIP, USER, PLAYLIST)
        .many_to_many(VIDEO_CHANNEL_ASSOCIATION, VIDEO, CHANNEL)
        .many_to_many(VIDEO_PLAYLIST_ASSOCIATION, VIDEO, PLAYLIST)
        .many_to_many(VIEWER_SUBSCRIBE_YOUTUBER, USER, USER)
        .many_to_many(VIEWER_SUBSCRIBE_CHANNEL, USER, CHANNEL)
        .build()
}

pub struct VideoPlatform<S> {
    engine: RelationshipEngine<S>,
}

impl<S: RecordStore> VideoPlatform<S> {
    pub fn new(store: S) -> EngineResult<Self> {
        Ok(Self {
            engine: RelationshipEngine::new(store, Arc::new(video_catalog()?)),
        })
    }

    pub fn engine(&self) -> &RelationshipEngine<S> {
        &self.engine
    }

    pub fn store(&self) -> &S {
        self.engine.store()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn create_user(&self, id: &str, name: &str) -> EngineResult<CreateOutcome> {
        self.engine.create_entity(USER, id, name)
    }

    pub fn create_video(&self, id: &str, name: &str) -> EngineResult<CreateOutcome> {
        self.engine.create_entity(VIDEO, id, name)
    }

    pub fn create_channel(&self, id: &str, name: &str) -> EngineResult<CreateOutcome> {
        self.engine.create_entity(CHANNEL, id, name)
    }

    pub fn create_playlist(&self, id: &str, name: &str) -> EngineResult<CreateOutcome> {
        self.engine.create_entity(PLAYLIST, id, name)
    }

    pub fn list_users(&self) -> EngineResult<Vec<Record>> {
        self.engine.list_entities(USER)
    }

    pub fn list_videos(&self) -> EngineResult<Vec<Record>> {
        self.engine.list_entities(VIDEO)
    }

    pub fn list_channels(&self) -> EngineResult<Vec<Record>> {
        self.engine.list_entities(CHANNEL)
    }

    pub fn list_playlists(&self) -> EngineResult<Vec<Record>> {
        self.engine.list_entities(PLAYLIST)
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    pub fn set_video_owner(&self, video_id: &str, user_id: &str) -> EngineResult<OwnerOutcome> {
        self.engine.set_owner(VIDEO_OWNERSHIP, video_id, user_id)
    }

    pub fn set_channel_owner(&self, channel_id: &str, user_id: &str) -> EngineResult<OwnerOutcome> {
        self.engine.set_owner(CHANNEL_OWNERSHIP, channel_id, user_id)
    }

    pub fn set_playlist_owner(
        &self,
        playlist_id: &str,
        user_id: &str,
    ) -> EngineResult<OwnerOutcome> {
        self.engine.set_owner(PLAYLIST_OWNERSHIP, playlist_id, user_id)
    }

    pub fn videos_created_by(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_owned_by(VIDEO_OWNERSHIP, user_id)
    }

    pub fn channels_created_by(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_owned_by(CHANNEL_OWNERSHIP, user_id)
    }

    pub fn playlists_created_by(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_owned_by(PLAYLIST_OWNERSHIP, user_id)
    }

    pub fn owner_of_video(&self, video_id: &str) -> EngineResult<Option<EntityId>> {
        self.engine.find_owner(VIDEO_OWNERSHIP, video_id)
    }

    // ========================================================================
    // Associations and Subscriptions
    // ========================================================================

    pub fn add_video_to_channel(
        &self,
        video_id: &str,
        channel_id: &str,
    ) -> EngineResult<LinkOutcome> {
        self.engine.link_m2m(VIDEO_CHANNEL_ASSOCIATION, video_id, channel_id)
    }

    pub fn add_video_to_playlist(
        &self,
        video_id: &str,
        playlist_id: &str,
    ) -> EngineResult<LinkOutcome> {
        self.engine.link_m2m(VIDEO_PLAYLIST_ASSOCIATION, video_id, playlist_id)
    }

    /// `viewer_id` follows `youtuber_id`.
    pub fn subscribe_user(&self, viewer_id: &str, youtuber_id: &str) -> EngineResult<LinkOutcome> {
        self.engine.link_m2m(VIEWER_SUBSCRIBE_YOUTUBER, viewer_id, youtuber_id)
    }

    pub fn subscribe_channel(
        &self,
        viewer_id: &str,
        channel_id: &str,
    ) -> EngineResult<LinkOutcome> {
        self.engine.link_m2m(VIEWER_SUBSCRIBE_CHANNEL, viewer_id, channel_id)
    }

    pub fn videos_in_channel(&self, channel_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_right_of_m2m(VIDEO_CHANNEL_ASSOCIATION, channel_id)
    }

    pub fn channels_with_video(&self, video_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_left_of_m2m(VIDEO_CHANNEL_ASSOCIATION, video_id)
    }

    pub fn videos_in_playlist(&self, playlist_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_right_of_m2m(VIDEO_PLAYLIST_ASSOCIATION, playlist_id)
    }

    pub fn playlists_with_video(&self, video_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_left_of_m2m(VIDEO_PLAYLIST_ASSOCIATION, video_id)
    }

    /// Users subscribed to `user_id`.
    pub fn followers_of_user(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_right_of_m2m(VIEWER_SUBSCRIBE_YOUTUBER, user_id)
    }

    /// Users that `user_id` is subscribed to.
    pub fn subscribed_youtubers(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_left_of_m2m(VIEWER_SUBSCRIBE_YOUTUBER, user_id)
    }

    pub fn followers_of_channel(&self, channel_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_right_of_m2m(VIEWER_SUBSCRIBE_CHANNEL, channel_id)
    }

    pub fn subscribed_channels(&self, user_id: &str) -> EngineResult<Vec<EntityId>> {
        self.engine.list_left_of_m2m(VIEWER_SUBSCRIBE_CHANNEL, user_id)
    }
}
