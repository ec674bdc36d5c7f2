//! Profile-driven application log synthesis.
//!
//! Catalog-based field selection, message templates, and the `Synthesizer`.

pub mod catalog;
pub mod generator;
pub mod templates;

pub use generator::Synthesizer;
