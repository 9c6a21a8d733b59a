use anyhow::{ensure, Result};
use refugium_data::{
    EvolutionAnalyticsSnapshot, EvolutionHistorySnapshot, SimulationRunSeries, StepSummary,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Full record of a single simulation run.
pub struct RunExport {
    pub generated_at: String,
    pub analytics_window: usize,
    pub summaries: Vec<StepSummary>,
    pub analytics: Vec<EvolutionAnalyticsSnapshot>,
    pub history: EvolutionHistorySnapshot,
}

/// Packages a run's series and history, checking that summaries and
/// analytics line up tick for tick.
pub fn build_run_export(
    analytics_window: usize,
    series: SimulationRunSeries,
    history: EvolutionHistorySnapshot,
    generated_at: Option<&str>,
) -> Result<RunExport> {
    ensure!(
        series.summaries.len() == series.analytics.len(),
        "Summary/analytics length mismatch: summaries={} analytics={}",
        series.summaries.len(),
        series.analytics.len()
    );
    for (index, (summary, analytics)) in series.summaries.iter().zip(&series.analytics).enumerate() {
        ensure!(
            summary.tick == analytics.tick,
            "Tick mismatch at index {}: summaryTick={} analyticsTick={}",
            index,
            summary.tick,
            analytics.tick
        );
    }

    Ok(RunExport {
        generated_at: crate::timestamp(generated_at),
        analytics_window: analytics_window.max(1),
        summaries: series.summaries,
        analytics: series.analytics,
        history,
    })
}

/// Pretty-printed JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
