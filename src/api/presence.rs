//! One-shot presence report for the `status` command

use anyhow::{Context, Result};

use super::client::{fetch_with_timeout, LanyardClient};
use crate::models::{now_unix_ms, PresenceSnapshot};

/// Fetch the presence document once and print it.
pub async fn show_status(user_id: &str, json: bool) -> Result<()> {
    let client = LanyardClient::new(user_id);
    let snapshot = fetch_with_timeout(&client)
        .await
        .with_context(|| format!("Failed to fetch presence for {}", user_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_report(&snapshot);
    Ok(())
}

fn print_report(snapshot: &PresenceSnapshot) {
    let user = &snapshot.discord_user;
    let now = now_unix_ms();

    println!();
    println!(
        "{} ({}#{})",
        user.display_name(),
        user.username,
        user.discriminator
    );
    println!("  Status:    {}", snapshot.discord_status.label());
    println!("  Platforms: {}", platforms_line(snapshot));
    if let Some(url) = user.avatar_url() {
        println!("  Avatar:    {}", url);
    }

    if !snapshot.activities.is_empty() {
        println!();
        println!("Activities:");
        for activity in &snapshot.activities {
            let mut line = format!("  {}", activity.name);
            if let Some(details) = &activity.details {
                line.push_str(&format!(" -- {}", details));
            }
            if let Some(state) = &activity.state {
                line.push_str(&format!(" / {}", state));
            }
            if let Some(elapsed) = activity.elapsed(now) {
                line.push_str(&format!(" ({})", elapsed));
            }
            println!("{}", line);

            let album_art = snapshot.spotify.as_ref().map(|s| s.album_art_url.as_str());
            if let Some(url) = activity.large_image_url(album_art) {
                println!("    Art: {}", url);
            }
        }
    }

    if snapshot.listening_to_spotify {
        if let Some(spotify) = &snapshot.spotify {
            println!();
            println!("Listening to Spotify:");
            let elapsed = spotify
                .elapsed(now)
                .map(|e| format!(" ({})", e))
                .unwrap_or_default();
            println!(
                "  {} -- {} [{}]{}",
                spotify.song, spotify.artist, spotify.album, elapsed
            );
            println!("  Art: {}", spotify.album_art_url);
        }
    }

    println!();
}

fn platforms_line(snapshot: &PresenceSnapshot) -> String {
    let mut platforms = Vec::new();
    if snapshot.active_on_discord_desktop {
        platforms.push("desktop");
    }
    if snapshot.active_on_discord_mobile {
        platforms.push("mobile");
    }
    if snapshot.active_on_discord_web {
        platforms.push("web");
    }
    if platforms.is_empty() {
        "(none)".to_string()
    } else {
        platforms.join(", ")
    }
}
