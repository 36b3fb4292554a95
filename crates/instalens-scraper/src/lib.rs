//! Instagram profile acquisition over the authenticated web API.
//!
//! Fetches `web_profile_info` for identity and counts, then the user feed for
//! recent media, and classifies feed items into posts and reels.

pub mod client;
pub mod cookies;
pub mod error;
pub mod parse;
pub mod types;

mod retry;

pub use client::{InstagramClient, InstagramClientConfig};
pub use cookies::SessionCookies;
pub use error::ScraperError;
pub use parse::{build_raw_profile, split_feed};
