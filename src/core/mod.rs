//! Core system types and foundations
//!
//! Error handling, configuration and the shared application state.

pub mod app_state;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use app_state::AppState;
pub use config::Config;
pub use error::{Error, Result};
