//! Core types and trait definitions for the Gloss annotation engine.
//!
//! No HTTP or database dependencies live here.
//! Segment planning and run decomposition are pure functions over snapshots;
//! the record store is an abstraction implemented elsewhere.

pub mod document;
pub mod error;
pub mod interval;
pub mod project;
pub mod runs;
pub mod segment;
pub mod settings;
pub mod store;
pub mod suggestion;

pub use error::{Error, Result};
