//! Client configuration
//!
//! Explicit configuration value handed to drivers at construction.

mod defaults;
mod types;

pub use defaults::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, default_user_agent};
pub use types::ClientConfig;
