//! Configuration module for sapcheck
//!
//! Provides the CLI arguments and the settings derived from them.

mod settings;

pub use settings::*;
