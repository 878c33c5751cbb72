//! Shared test helpers.

pub mod model_fixtures;
pub mod recording_watcher;
