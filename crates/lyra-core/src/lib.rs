//! # lyra-core
//!
//! Core types, line resolution, edit history and error handling for Lyra.

pub mod error;
pub mod history;
pub mod resolver;
pub mod types;

pub use error::{Error, HttpError, Result};
pub use history::EditHistory;
pub use resolver::{find_current_index, find_current_line, LineChange, LineTracker};
pub use types::*;
