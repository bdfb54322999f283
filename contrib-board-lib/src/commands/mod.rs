//! Command-line interface and orchestration for contrib-board
//!
//! This module implements the CLI commands and wires the collection pipeline to
//! configuration, logging, progress display and report output.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **fetch**: Scan an organization, score its contributors and write the leaderboard document
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. `fetch` then:
//!
//! 1. Initializes logging and loads the pipeline configuration
//! 2. Collects contributor records through the facts collector
//! 3. Writes the JSON document atomically
//! 4. Prints a console summary
//!
//! Pipeline tunables live in a TOML file (`contrib-board.toml`); every key is optional
//! and falls back to the embedded defaults.

mod common;
mod config;
mod fetch;
mod host;
mod init;
mod progress_reporter;
mod run;

pub use common::{ColorMode, LogLevel};
pub use fetch::{FetchArgs, process_fetch};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
