//! Loadgen library crate.
//!
//! Synthesizes application log events for a traffic profile and publishes
//! them to a sink at a controlled rate.

pub mod core;
pub mod publisher;
pub mod sinks;
pub mod sources;

pub use core::config;
pub use core::event;
pub use core::profile;
pub use core::traits;
