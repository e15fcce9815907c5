//! Presence models for the Lanyard API
//!
//! Shapes match the JSON served by `api.lanyard.rest/v1/users/{id}`.
//! Display helpers (CDN URLs, elapsed times) live here as pure functions so
//! both the one-shot `status` command and the TUI share them.

use serde::{Deserialize, Serialize};

const CDN_BASE: &str = "https://cdn.discordapp.com";
const MEDIA_PROXY_BASE: &str = "https://media.discordapp.net";

/// Top-level Lanyard response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanyardResponse {
    pub success: bool,
    pub data: Option<PresenceSnapshot>,
    pub error: Option<ApiError>,
}

/// Error object carried in an unsuccessful envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// One full presence document. Replaced wholesale on every successful poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub discord_user: DiscordUser,
    pub discord_status: Status,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub listening_to_spotify: bool,
    pub spotify: Option<Spotify>,
    #[serde(default)]
    pub active_on_discord_desktop: bool,
    #[serde(default)]
    pub active_on_discord_mobile: bool,
    #[serde(default)]
    pub active_on_discord_web: bool,
}

/// Discord online status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Online,
    Idle,
    Dnd,
    Offline,
}

impl Status {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Online => "Online",
            Status::Idle => "Idle",
            Status::Dnd => "Do Not Disturb",
            Status::Offline => "Offline",
        }
    }
}

/// The user the presence document belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub discriminator: String,
    #[serde(default)]
    pub public_flags: u64,
    pub global_name: Option<String>,
}

impl DiscordUser {
    /// Preferred display name (global name with username fallback).
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// CDN avatar URL, if the user has an avatar hash set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("{}/avatars/{}/{}.png?size=128", CDN_BASE, self.id, hash))
    }
}

/// A rich-presence activity (game, custom status, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: i64,
    pub name: String,
    pub state: Option<String>,
    pub details: Option<String>,
    pub timestamps: Option<Timestamps>,
    pub assets: Option<Assets>,
    pub application_id: Option<String>,
    pub emoji: Option<Emoji>,
}

impl Activity {
    /// Elapsed time since the activity started, e.g. "1h 23m" or "23m".
    pub fn elapsed(&self, now_ms: u64) -> Option<String> {
        let start = self.timestamps.as_ref()?.start?;
        Some(format_elapsed(start, now_ms))
    }

    /// Image URL for the large activity asset.
    pub fn large_image_url(&self, album_art: Option<&str>) -> Option<String> {
        let app_id = self.application_id.as_deref()?;
        let asset_id = self.assets.as_ref()?.large_image.as_deref()?;
        asset_image_url(app_id, asset_id, album_art)
    }
}

/// Activity start/end markers, unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Image asset references attached to an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    pub large_image: Option<String>,
    pub large_text: Option<String>,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
}

/// Custom status emoji.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emoji {
    pub name: String,
    pub id: Option<String>,
    pub animated: Option<bool>,
}

/// Spotify listening record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spotify {
    pub track_id: Option<String>,
    pub timestamps: Timestamps,
    pub album: String,
    pub album_art_url: String,
    pub artist: String,
    pub song: String,
}

impl Spotify {
    /// Elapsed listening time, e.g. "3m".
    pub fn elapsed(&self, now_ms: u64) -> Option<String> {
        self.timestamps
            .start
            .map(|start| format_elapsed(start, now_ms))
    }
}

/// Current wall-clock time in unix milliseconds, for elapsed-time display.
pub fn now_unix_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Format the time elapsed since `start_ms` as "Nh Mm", or "Mm" under an hour.
pub fn format_elapsed(start_ms: u64, now_ms: u64) -> String {
    let seconds = now_ms.saturating_sub(start_ms) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Image URL for an activity asset id.
///
/// `spotify:` ids have no CDN asset; the caller supplies the snapshot's album
/// art URL instead. `external/` ids go through the Discord media proxy with
/// the prefix stripped. Everything else is an app-asset on the CDN.
pub fn asset_image_url(app_id: &str, asset_id: &str, album_art: Option<&str>) -> Option<String> {
    if app_id.is_empty() || asset_id.is_empty() {
        return None;
    }
    if asset_id.starts_with("spotify:") {
        return album_art.map(String::from);
    }
    if let Some(rest) = asset_id.strip_prefix("external/") {
        return Some(format!("{}/external/{}", MEDIA_PROXY_BASE, rest));
    }
    Some(format!(
        "{}/app-assets/{}/{}.png",
        CDN_BASE, app_id, asset_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> DiscordUser {
        DiscordUser {
            id: "728076716219695148".to_string(),
            username: "tester".to_string(),
            avatar: Some("a1b2c3".to_string()),
            discriminator: "0".to_string(),
            public_flags: 0,
            global_name: Some("Tester".to_string()),
        }
    }

    #[test]
    fn test_format_elapsed_minutes_only() {
        // 23 minutes, 40 seconds ago -- seconds are truncated
        let start = 1_000_000;
        let now = start + (23 * 60 + 40) * 1000;
        assert_eq!(format_elapsed(start, now), "23m");
    }

    #[test]
    fn test_format_elapsed_hours_and_minutes() {
        let start = 0;
        let now = (60 + 23) * 60 * 1000;
        assert_eq!(format_elapsed(start, now), "1h 23m");
    }

    #[test]
    fn test_format_elapsed_clock_skew() {
        // Start in the future must not underflow
        assert_eq!(format_elapsed(10_000, 0), "0m");
    }

    #[test]
    fn test_avatar_url() {
        let user = sample_user();
        assert_eq!(
            user.avatar_url().unwrap(),
            "https://cdn.discordapp.com/avatars/728076716219695148/a1b2c3.png?size=128"
        );
    }

    #[test]
    fn test_avatar_url_missing_hash() {
        let mut user = sample_user();
        user.avatar = None;
        assert!(user.avatar_url().is_none());
    }

    #[test]
    fn test_asset_url_app_asset() {
        let url = asset_image_url("12345", "67890", None).unwrap();
        assert_eq!(
            url,
            "https://cdn.discordapp.com/app-assets/12345/67890.png"
        );
    }

    #[test]
    fn test_asset_url_spotify_uses_album_art() {
        let art = "https://i.scdn.co/image/abc";
        let url = asset_image_url("spotify_app", "spotify:abc", Some(art)).unwrap();
        assert_eq!(url, art);
        // No album art available -> no URL
        assert!(asset_image_url("spotify_app", "spotify:abc", None).is_none());
    }

    #[test]
    fn test_asset_url_external_strips_prefix() {
        let url = asset_image_url("123", "external/host/path.png", None).unwrap();
        assert_eq!(url, "https://media.discordapp.net/external/host/path.png");
    }

    #[test]
    fn test_asset_url_requires_both_ids() {
        assert!(asset_image_url("", "67890", None).is_none());
        assert!(asset_image_url("12345", "", None).is_none());
    }

    #[test]
    fn test_status_deserializes_lowercase() {
        let status: Status = serde_json::from_str("\"dnd\"").unwrap();
        assert_eq!(status, Status::Dnd);
        assert_eq!(status.label(), "Do Not Disturb");
    }

    #[test]
    fn test_snapshot_deserializes_lanyard_document() {
        let body = r#"{
            "discord_user": {
                "id": "728076716219695148",
                "username": "tester",
                "avatar": "a1b2c3",
                "discriminator": "0",
                "public_flags": 64,
                "global_name": "Tester"
            },
            "discord_status": "online",
            "activities": [{
                "type": 0,
                "name": "Some Game",
                "state": "In a match",
                "details": "Ranked",
                "timestamps": { "start": 1700000000000 },
                "assets": { "large_image": "cover", "large_text": "Cover" },
                "application_id": "9999"
            }],
            "listening_to_spotify": true,
            "spotify": {
                "track_id": "4uLU6hMCjMI75M1A2tKUQC",
                "timestamps": { "start": 1700000000000, "end": 1700000200000 },
                "album": "An Album",
                "album_art_url": "https://i.scdn.co/image/abc",
                "artist": "An Artist",
                "song": "A Song"
            },
            "active_on_discord_desktop": true,
            "active_on_discord_mobile": false,
            "active_on_discord_web": false
        }"#;

        let snapshot: PresenceSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.discord_status, Status::Online);
        assert_eq!(snapshot.discord_user.display_name(), "Tester");
        assert!(snapshot.listening_to_spotify);
        assert_eq!(snapshot.activities.len(), 1);
        assert_eq!(
            snapshot.activities[0].large_image_url(None).unwrap(),
            "https://cdn.discordapp.com/app-assets/9999/cover.png"
        );
        assert_eq!(snapshot.spotify.unwrap().song, "A Song");
    }
}
