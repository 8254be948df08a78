//! Local extremum extraction with a minimum separation

use crate::series::MeasurementSeries;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakKind {
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub index: usize,
    pub distance: f64,
    pub value: f64,
    pub kind: PeakKind,
}

/// Strict local extrema; a flat top or bottom counts once at its first sample
fn local_extrema(values: &[f64]) -> Vec<(usize, PeakKind)> {
    let n = values.len();
    let mut extrema = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        // Skip to the end of a plateau starting at i
        let mut j = i;
        while j + 1 < n && values[j + 1] == values[i] {
            j += 1;
        }
        if j + 1 >= n {
            break;
        }
        let (before, here, after) = (values[i - 1], values[i], values[j + 1]);
        if here > before && here > after {
            extrema.push((i, PeakKind::Max));
        } else if here < before && here < after {
            extrema.push((i, PeakKind::Min));
        }
        i = j + 1;
    }
    extrema
}

/// Extract peaks at least `min_separation` samples apart
///
/// Candidates are accepted by descending magnitude, the earlier sample
/// winning ties; the result is ordered by index.
pub fn extract_peaks(series: &MeasurementSeries, min_separation: usize) -> Vec<Peak> {
    let values = series.values();
    let mut candidates = local_extrema(&values);
    // Stable sort keeps index order among equal magnitudes
    candidates.sort_by(|a, b| values[b.0].abs().total_cmp(&values[a.0].abs()));

    let mut accepted: Vec<(usize, PeakKind)> = Vec::new();
    for (index, kind) in candidates {
        if accepted.iter().all(|&(other, _)| index.abs_diff(other) >= min_separation) {
            accepted.push((index, kind));
        }
    }
    accepted.sort_by_key(|&(index, _)| index);

    accepted
        .into_iter()
        .map(|(index, kind)| Peak {
            index,
            distance: series.distance(index),
            value: values[index],
            kind,
        })
        .collect()
}
