//! # Resource Engine
//!
//! Per-player resource state and the operations that mutate it. Built on the
//! immutable catalog from `resource_rules`.
//!
//! ## Core Components
//!
//! - **state**: the player's values, resolved bound snapshots, flags and tiers
//! - **engine**: change application, cascading bound reconciliation, group aggregation
//! - **events**: tier transitions for the external passive-effect system
//!
//! ## Write Path
//!
//! A requested change is reconciled against the resource's resolved bounds,
//! committed to the store, re-aggregated into the resource's group parent, and
//! finally cascaded to every resource whose bound follows the changed value.
//! Everything runs synchronously on one `PlayerResourceState`.

pub mod engine;
pub mod events;
pub mod state;

pub use engine::*;
pub use events::*;
pub use state::*;
