//! # Desktop Bridge Implementations
//!
//! Desktop implementations of the `bridge-traits` seams:
//!
//! - [`ReqwestHttpClient`]: reqwest-backed HTTP with a cookie jar and
//!   retry/backoff.
//! - [`TokioFileStore`]: tokio-fs backed staging area for in-flight assets.

pub mod fs;
pub mod http;

pub use fs::TokioFileStore;
pub use http::ReqwestHttpClient;
