//! Runtime settings for gleaner, read once from the environment.

mod settings;

pub use settings::Settings;
