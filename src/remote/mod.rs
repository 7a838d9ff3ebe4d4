//! Remote command path
//!
//! A periodic poll of the configured URL yields `(status, body)` pairs; the
//! processor turns those into relay actuations, auto-off timers, and
//! acknowledgements.

mod poller;
mod processor;

pub use poller::poll_remote;
pub use processor::RemoteProcessor;
