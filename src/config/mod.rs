//! Personal configuration for the acting user.

pub mod settings;

pub use settings::{default_config_dir, Settings};
