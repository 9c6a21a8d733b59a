use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NumericAggregate {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
/// Distribution of a per-run `local - global` style delta.
pub struct PairedDeltaAggregate {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Share of runs whose delta is strictly positive.
    pub positive_fraction: f64,
}

/// Mean, min and max of `values`; all zero when empty.
pub fn summarize<I: IntoIterator<Item = f64>>(values: I) -> NumericAggregate {
    let mut iter = values.into_iter();
    let Some(first) = iter.next() else {
        return NumericAggregate::default();
    };
    let mut aggregate = NumericAggregate {
        mean: 0.0,
        min: first,
        max: first,
    };
    let mut total = first;
    let mut count = 1usize;
    for value in iter {
        aggregate.min = aggregate.min.min(value);
        aggregate.max = aggregate.max.max(value);
        total += value;
        count += 1;
    }
    aggregate.mean = total / count as f64;
    aggregate
}

pub fn summarize_paired(values: &[f64]) -> PairedDeltaAggregate {
    let aggregate = summarize(values.iter().copied());
    let positive = values.iter().filter(|&&v| v > 0.0).count();
    PairedDeltaAggregate {
        mean: aggregate.mean,
        min: aggregate.min,
        max: aggregate.max,
        positive_fraction: if values.is_empty() {
            0.0
        } else {
            positive as f64 / values.len() as f64
        },
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    value.max(0.0).min(1.0)
}
