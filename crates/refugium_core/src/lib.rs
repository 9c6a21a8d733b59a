//! # Refugium Core
//!
//! The deterministic engine behind Refugium, an agent-based ecological
//! simulation of disturbance, refugia and recovery on a toroidal grid.
//!
//! This crate contains:
//! - A seeded 32-bit xorshift PRNG shared by every stochastic decision
//! - Static biome fertility and a regenerating resource field
//! - Per-species strategy state derived at speciation
//! - Clade and species lifecycle tracking
//! - Periodic disturbances with a multi-event resilience log
//! - Per-cell and neighborhood locality analytics
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use refugium_core::{LifeSimulation, SimulationConfig};
//!
//! let mut sim = LifeSimulation::new(7, SimulationConfig::default()).unwrap();
//! let summaries = sim.run(5).unwrap();
//! assert_eq!(summaries.len(), 5);
//! assert_eq!(sim.tick(), 5);
//! ```

/// Configuration of a single simulation
pub mod config;
/// Disturbance scheduling, footprints and resilience memory
pub mod disturbance;
/// Toroidal geometry, seasonal forcing and biome fertility
pub mod environment;
pub mod error;
/// Per-cell and neighborhood dominance analytics
pub mod locality;
/// Run metrics collection and logging
pub mod metrics;
pub mod resources;
pub mod rng;
/// The tick scheduler
pub mod simulation;
pub mod stats;
/// Species-level habitat, trophic and defense strategies
pub mod strategy;
/// Clade and species lifecycle registry
pub mod taxon_registry;

pub use config::SimulationConfig;
pub use disturbance::{resilience_stability_index, DisturbanceEvent};
pub use error::{Result, SimError};
pub use metrics::{init_logging, RunMetrics};
pub use refugium_data::*;
pub use rng::Rng;
pub use simulation::LifeSimulation;
pub use strategy::SpeciesStrategy;
