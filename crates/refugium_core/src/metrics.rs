//! Run metrics and structured logging setup.

use refugium_data::StepSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters accumulated over a simulation run.
pub struct RunMetrics {
    ticks: AtomicU64,
    births: AtomicU64,
    deaths: AtomicU64,
    disturbances: AtomicU64,
    population: AtomicU64,
    busy_nanos: AtomicU64,
    log_every: u64,
    start_time: Instant,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl RunMetrics {
    /// Creates a collector that logs a progress line every `log_every` ticks.
    #[must_use]
    pub fn new(log_every: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            births: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            disturbances: AtomicU64::new(0),
            population: AtomicU64::new(0),
            busy_nanos: AtomicU64::new(0),
            log_every: log_every.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed step with the time it took.
    pub fn record_step(&self, summary: &StepSummary, duration: Duration) {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        self.births
            .fetch_add(summary.births as u64, Ordering::Relaxed);
        self.deaths
            .fetch_add(summary.deaths as u64, Ordering::Relaxed);
        self.population
            .store(summary.population as u64, Ordering::Relaxed);
        self.busy_nanos.fetch_add(
            u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );

        if tick % self.log_every == 0 {
            tracing::info!(
                tick = summary.tick,
                population = summary.population,
                species = summary.active_species,
                clades = summary.active_clades,
                mean_energy = summary.mean_energy,
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    pub fn record_disturbance(&self) {
        self.disturbances.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_births(&self) -> u64 {
        self.births.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn total_deaths(&self) -> u64 {
        self.deaths.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn disturbance_count(&self) -> u64 {
        self.disturbances.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.population.load(Ordering::Relaxed)
    }

    /// Mean wall time spent inside `step`.
    #[must_use]
    pub fn mean_step_duration(&self) -> Duration {
        let ticks = self.tick_count();
        if ticks == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed) / ticks)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the run totals.
    pub fn log_summary(&self) {
        tracing::info!(
            ticks = self.tick_count(),
            births = self.total_births(),
            deaths = self.total_deaths(),
            disturbances = self.disturbance_count(),
            population = self.population(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "Run finished"
        );
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`; defaults to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .ok();
}
