pub mod config;
pub mod dependency;
pub mod error;
pub mod inputs;
pub mod integration;
pub mod io;
pub mod manifest;
pub mod migrations;
pub mod module;
pub mod module_manager;
pub mod paths;
pub mod phase;
pub mod plan;
pub mod registry;
pub mod scaffold;
pub mod types;
pub mod validation;

pub use error::{Result, VibecraftError};
