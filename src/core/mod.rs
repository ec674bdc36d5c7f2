//! Shared event schema, run configuration, and the sink/pacing seams.

pub mod config;
pub mod event;
pub mod profile;
pub mod rate;
pub mod traits;
