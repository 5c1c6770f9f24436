// src/config/mod.rs

//! Configuration for a benchmark run.
//!
//! Responsibilities:
//! - Timing and repetition settings taken from the environment (`settings.rs`).
//! - The project manifest data model (`model.rs`).
//! - Loading declared scripts from disk (`loader.rs`).

pub mod loader;
pub mod model;
pub mod settings;

pub use loader::{load_scripts, project_root_dir};
pub use model::{ProjectManifest, ScriptTable};
pub use settings::Settings;
