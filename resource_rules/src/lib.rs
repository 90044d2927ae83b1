//! # Resource Rules
//!
//! The immutable half of the resource system: identifiers, definitions, the
//! validated catalog, and the pure reconciliation rules that decide how a
//! requested change lands against a resource's bounds.
//! This crate holds no per-player state and performs no I/O.

pub mod catalog;
pub mod definitions;
pub mod error;
pub mod mechanics;

pub use catalog::*;
pub use definitions::*;
pub use error::*;
pub use mechanics::*;
