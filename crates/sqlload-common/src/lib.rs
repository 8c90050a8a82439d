//! sqlload Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the sqlload workspace members:
//!
//! - **Logging**: tracing subscriber configuration and initialization
//! - **Input**: opening a file path or standard input (`-`) as a byte stream

pub mod input;
pub mod logging;

pub use input::{open_input, STDIN_PATH};
