//! # Refugium Data
//!
//! Plain data types shared by the simulation engine and the orchestration
//! layers built on top of it. Everything here is a value: snapshots are
//! produced once per tick and never mutated afterwards.

pub mod data;

pub use data::agent::*;
pub use data::analytics::*;
pub use data::history::*;
pub use data::summary::*;
