//! Core data structures for the Refugium simulation.

pub mod agent;
pub mod analytics;
pub mod history;
pub mod summary;
