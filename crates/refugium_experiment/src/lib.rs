//! # Refugium Experiment
//!
//! Orchestration over the simulation engine: seed sweeps, paired
//! global-versus-local disturbance grid studies and run exports.
//!
//! Every run owns its own [`refugium_core::LifeSimulation`]; runs are
//! executed in parallel with `rayon` and always reported in run order, so
//! results do not depend on the number of worker threads.

pub mod aggregate;
pub mod export;
pub mod grid;
pub mod runner;

pub use aggregate::{NumericAggregate, PairedDeltaAggregate};
pub use export::{build_run_export, to_pretty_json, RunExport};
pub use grid::{run_disturbance_grid_study, GridStudyExport, GridStudyInput};
pub use runner::{
    compute_resilience_stability_index, run_experiment, ExperimentExport, ExperimentInput,
    ExperimentRunSummary,
};

/// RFC 3339 timestamp used when the caller does not pin `generated_at`.
pub(crate) fn timestamp(pinned: Option<&str>) -> String {
    pinned
        .map(str::to_owned)
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())
}
