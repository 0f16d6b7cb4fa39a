//! Configuration parsing for polybar-winlist
//!
//! This crate handles parsing the KDL configuration file that controls
//! label geometry, the color palette, refresh timing, and the cache file
//! layout shared by the daemon and the CLI.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{load_config, parse_config, parse_config_str};
