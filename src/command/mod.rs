//! Local command path
//!
//! This module handles:
//! - Assembling serial bytes into lines and parsing them
//! - Feeding the bounded command queue without blocking the reader
//! - Draining the queue and executing each command to completion

mod dispatcher;
mod reader;

pub use dispatcher::Dispatcher;
pub use reader::{enqueue, read_commands};
