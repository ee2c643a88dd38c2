//! # Bridge Traits
//!
//! Platform seams consumed by the sideload engine and the provider crates.
//!
//! ## Overview
//!
//! - **HTTP** (`http`): typed request/response model and the [`HttpClient`]
//!   trait. Form-encoded and multipart bodies cover the device portal; JSON
//!   helpers cover the store API.
//! - **File staging** (`fs`): the [`FileStore`] trait for the local staging
//!   area downloaded assets pass through.
//! - **Errors** (`error`): [`BridgeError`] shared by all implementations.

pub mod error;
pub mod fs;
pub mod http;

pub use error::{BridgeError, Result};
pub use fs::FileStore;
pub use http::{
    FilePart, HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm,
    RetryPolicy,
};
