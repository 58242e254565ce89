//! Library side of the `envtpl` command: argument parsing and the run pipeline.
//!
//! Kept separate from `main.rs` so the whole command can be exercised
//! in-process with mock environments.

pub mod app;
pub mod cli;

pub use app::{init_logging, render_to_string, run, LOG_ENV};
pub use cli::{Args, RunConfig};
