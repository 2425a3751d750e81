//! File I/O helpers and project scaffolding for data-science pipelines.
//!
//! [`common`] holds the config and artifact helpers used by pipeline stages;
//! [`scaffold`] creates the skeleton of a new project. Neither installs a
//! `tracing` subscriber; binaries call [`logging::init`] once at startup.

pub mod common;
pub mod config_data;
pub mod error;
pub mod logging;
pub mod scaffold;
mod templates;
mod yaml;

pub use common::{create_directories, load_bin, load_json, read_yaml, save_bin, save_json};
pub use config_data::ConfigData;
pub use error::{Error, Result};
