//! # itch.io Provider
//!
//! Store-side integration for the sideload engine.
//!
//! ## Overview
//!
//! This module provides:
//! - API-key login against the serverside API
//! - Paginated owned-keys listing mapped to the engine's owned catalog
//! - The tag-filtered candidate universe, scraped from the public listing
//! - Per-game upload metadata and streamed asset downloads into staging

pub mod client;
pub mod error;
pub mod types;

pub use client::{parse_candidate_titles, ItchClient};
pub use error::{ItchError, Result};
