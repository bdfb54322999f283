//! Output of collected contributor data
//!
//! Two generators are provided:
//! - **JSON**: the leaderboard document read by the site, written atomically to disk
//! - **Console**: a short colored summary of a written document

mod console;
mod json;

pub use console::generate as generate_console;
pub use json::{OutputDocument, generate as generate_json, write as write_json};
