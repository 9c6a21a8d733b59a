//! # Refugium
//!
//! Agent-based ecology on a toroidal grid: evolving populations, periodic
//! disturbances with spatial refugia, and the resilience and locality
//! analytics used to compare global against local disturbance.
//!
//! The engine lives in `refugium_core`, plain data types in
//! `refugium_data` and the seed-sweep orchestration in
//! `refugium_experiment`. This crate re-exports them under one roof.

pub mod model;

pub mod experiment {
    pub use refugium_experiment::*;
}

pub use refugium_core::{LifeSimulation, SimError, SimulationConfig};
