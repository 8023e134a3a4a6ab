//! Demonstration dataset and the query report run against it.

use graphtable_engine::{EngineResult, EntityId};
use graphtable_store::RecordStore;
use serde::Serialize;

use crate::VideoPlatform;

pub const USERS: &[(&str, &str)] = &[
    ("u-1", "Alice"),
    ("u-2", "Bob"),
    ("u-3", "Cathy"),
    ("u-4", "David"),
];

/// `(video_id, name, owner)`
pub const VIDEOS: &[(&str, &str, &str)] = &[
    ("v-1-1", "Alice's Video 1", "u-1"),
    ("v-1-2", "Alice's Video 2", "u-1"),
    ("v-2-1", "Bob's Video 1", "u-2"),
    ("v-2-2", "Bob's Video 2", "u-2"),
    ("v-2-3", "Bob's Video 3", "u-2"),
    ("v-2-4", "Bob's Video 4", "u-2"),
];

/// `(channel_id, name, owner)`
pub const CHANNELS: &[(&str, &str, &str)] = &[
    ("c-1-1", "Alice's Channel 1", "u-1"),
    ("c-2-1", "Bob's Channel 1", "u-2"),
    ("c-2-2", "Bob's Channel 2", "u-2"),
];

/// `(playlist_id, name, owner)`
pub const PLAYLISTS: &[(&str, &str, &str)] = &[
    ("p-3-1", "Cathy's Playlist 1", "u-3"),
    ("p-3-2", "Cathy's Playlist 2", "u-3"),
];

/// `(video_id, channel_id)`
pub const VIDEO_CHANNELS: &[(&str, &str)] = &[
    ("v-2-1", "c-2-1"),
    ("v-2-2", "c-2-1"),
    ("v-2-3", "c-2-1"),
    ("v-2-2", "c-2-2"),
    ("v-2-3", "c-2-2"),
    ("v-2-4", "c-2-2"),
];

/// `(video_id, playlist_id)`
pub const VIDEO_PLAYLISTS: &[(&str, &str)] = &[
    ("v-2-1", "p-3-1"),
    ("v-2-2", "p-3-1"),
    ("v-2-3", "p-3-1"),
    ("v-2-2", "p-3-2"),
    ("v-2-3", "p-3-2"),
    ("v-2-4", "p-3-2"),
];

/// `(viewer_id, youtuber_id)`
pub const USER_SUBSCRIPTIONS: &[(&str, &str)] = &[
    ("u-1", "u-2"),
    ("u-2", "u-1"),
    ("u-3", "u-1"),
    ("u-3", "u-2"),
    ("u-4", "u-1"),
    ("u-4", "u-3"),
];

/// `(viewer_id, channel_id)`
pub const CHANNEL_SUBSCRIPTIONS: &[(&str, &str)] = &[
    ("u-1", "c-2-1"),
    ("u-1", "c-2-2"),
    ("u-2", "c-1-1"),
    ("u-3", "c-1-1"),
    ("u-3", "c-2-1"),
    ("u-4", "c-2-2"),
];

/// Load the demonstration dataset. Safe to run more than once.
pub fn seed_demo<S: RecordStore>(platform: &VideoPlatform<S>) -> EngineResult<()> {
    for (id, name) in USERS {
        platform.create_user(id, name)?;
    }
    for (id, name, owner) in VIDEOS {
        platform.create_video(id, name)?;
        platform.set_video_owner(id, owner)?;
    }
    for (id, name, owner) in CHANNELS {
        platform.create_channel(id, name)?;
        platform.set_channel_owner(id, owner)?;
    }
    for (id, name, owner) in PLAYLISTS {
        platform.create_playlist(id, name)?;
        platform.set_playlist_owner(id, owner)?;
    }
    for (video, channel) in VIDEO_CHANNELS {
        platform.add_video_to_channel(video, channel)?;
    }
    for (video, playlist) in VIDEO_PLAYLISTS {
        platform.add_video_to_playlist(video, playlist)?;
    }
    for (viewer, youtuber) in USER_SUBSCRIPTIONS {
        platform.subscribe_user(viewer, youtuber)?;
    }
    for (viewer, channel) in CHANNEL_SUBSCRIPTIONS {
        platform.subscribe_channel(viewer, channel)?;
    }

    tracing::info!(
        users = USERS.len(),
        videos = VIDEOS.len(),
        channels = CHANNELS.len(),
        playlists = PLAYLISTS.len(),
        "demo dataset loaded"
    );
    Ok(())
}

/// One titled query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    /// Result ids, sorted.
    pub ids: Vec<String>,
}

impl ReportSection {
    fn new(title: impl Into<String>, ids: Vec<EntityId>) -> Self {
        let mut ids: Vec<String> = ids.into_iter().map(String::from).collect();
        ids.sort();
        Self {
            title: title.into(),
            ids,
        }
    }
}

/// Run every platform query over the demonstration ids.
pub fn query_report<S: RecordStore>(
    platform: &VideoPlatform<S>,
) -> EngineResult<Vec<ReportSection>> {
    let mut report = Vec::new();

    for (user, name) in USERS {
        report.push(ReportSection::new(
            format!("{name} owned videos"),
            platform.videos_created_by(user)?,
        ));
        report.push(ReportSection::new(
            format!("{name} owned channels"),
            platform.channels_created_by(user)?,
        ));
        report.push(ReportSection::new(
            format!("{name} owned playlists"),
            platform.playlists_created_by(user)?,
        ));
    }
    for (channel, name, _) in CHANNELS {
        report.push(ReportSection::new(
            format!("Videos in {name}"),
            platform.videos_in_channel(channel)?,
        ));
    }
    for (video, name, _) in VIDEOS {
        report.push(ReportSection::new(
            format!("Channels that have {name}"),
            platform.channels_with_video(video)?,
        ));
    }
    for (playlist, name, _) in PLAYLISTS {
        report.push(ReportSection::new(
            format!("Videos in {name}"),
            platform.videos_in_playlist(playlist)?,
        ));
    }
    for (video, name, _) in VIDEOS {
        report.push(ReportSection::new(
            format!("Playlists that have {name}"),
            platform.playlists_with_video(video)?,
        ));
    }
    for (user, name) in USERS {
        report.push(ReportSection::new(
            format!("Users who subscribe to {name}"),
            platform.followers_of_user(user)?,
        ));
        report.push(ReportSection::new(
            format!("Users {name} subscribes to"),
            platform.subscribed_youtubers(user)?,
        ));
    }
    for (channel, name, _) in CHANNELS {
        report.push(ReportSection::new(
            format!("Users who subscribe to {name}"),
            platform.followers_of_channel(channel)?,
        ));
    }
    for (user, name) in USERS {
        report.push(ReportSection::new(
            format!("Channels {name} subscribes to"),
            platform.subscribed_channels(user)?,
        ));
    }
    Ok(report)
}
