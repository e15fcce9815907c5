//! API client module for the Lanyard presence service

pub mod client;
mod presence;

use anyhow::Result;

pub use client::{fetch_with_timeout, FetchError, LanyardClient, PresenceSource};

/// Fetch the presence document once and print it
pub async fn show_status(user_id: &str, json: bool) -> Result<()> {
    presence::show_status(user_id, json).await
}
