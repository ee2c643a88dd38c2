//! # Playdate Portal Provider
//!
//! Device-side integration for the sideload engine.
//!
//! ## Overview
//!
//! This module provides:
//! - Cookie-session sign-in with CSRF handling
//! - The installed catalog, scraped from the account sideload pages
//! - Multipart asset uploads to the portal

pub mod client;
pub mod error;
pub mod listing;

pub use client::PlaydateClient;
pub use error::{PlaydateError, Result};
pub use listing::{extract_csrf_token, extract_installed_entry, extract_sideload_paths};
