use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// One point of a taxon's population timeline.
pub struct TaxonTimelinePoint {
    pub tick: u64,
    pub population: usize,
    pub births: usize,
    pub deaths: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Exported lifecycle record of a clade or a species.
pub struct TaxonHistory {
    pub id: u64,
    pub first_seen_tick: u64,
    /// `None` while the taxon has living members.
    pub extinct_tick: Option<u64>,
    pub total_births: usize,
    pub total_deaths: usize,
    pub peak_population: usize,
    pub timeline: Vec<TaxonTimelinePoint>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
/// Every clade and species ever tracked, sorted by id.
pub struct EvolutionHistorySnapshot {
    pub clades: Vec<TaxonHistory>,
    pub species: Vec<TaxonHistory>,
    pub extinct_clades: usize,
    pub extinct_species: usize,
}
