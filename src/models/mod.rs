//! Data models for Lanyard presence

mod presence;

pub use presence::*;
