//! Transport collaborators for the device's I/O edges
//!
//! The core only ever sees the trait seams; the real backends (serial
//! console, HTTP client) live beside them and stay thin.

pub mod http;
pub mod serial;
pub mod traits;

pub use http::HttpClient;
pub use traits::{ByteSource, HttpFetch, HttpPost, LineWriter};
