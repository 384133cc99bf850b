use polars::prelude::*;

use crate::models::FeatureType;

/// Per-chromosome feature counts sampled at evenly spaced edge positions.
///
/// `edges` and `counts` have the same length: the count computed for the
/// final bin is duplicated so that downstream smoothing has a value at every
/// edge. The raw series is the authoritative data; any smoothed curve built
/// from it is a display-only derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySeries {
    pub edges: Vec<f64>,
    pub counts: Vec<u32>,
}

impl DensitySeries {
    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Compute `bin_count + 1` evenly spaced edge positions over
/// `[0, chromosome_length]` inclusive.
pub fn bin_edges(chromosome_length: f64, bin_count: usize) -> PolarsResult<Vec<f64>> {
    if !(chromosome_length > 0.0) {
        return Err(PolarsError::ComputeError(
            format!(
                "chromosome length must be positive, got {}",
                chromosome_length
            )
            .into(),
        ));
    }
    if bin_count == 0 {
        return Err(PolarsError::ComputeError(
            "bin count must be at least 1".into(),
        ));
    }

    let step = chromosome_length / bin_count as f64;
    let mut edges: Vec<f64> = (0..=bin_count).map(|i| i as f64 * step).collect();
    // The last edge must land exactly on the chromosome end.
    edges[bin_count] = chromosome_length;
    Ok(edges)
}

/// Count, per bin, the features overlapping that bin.
///
/// A feature `[start, end]` counts for bin `[e_i, e_{i+1}]` when it covers
/// the left edge, covers the right edge, or lies fully inside the bin. That
/// three-clause rule is equivalent to closed-interval overlap
/// (`start <= e_{i+1} && end >= e_i`), so each feature is projected onto the
/// contiguous range of bin indices it touches and accumulated through a
/// difference array: O(features + bins) instead of a scan of every feature
/// for every bin.
pub fn feature_density(
    chromosome_length: f64,
    bin_count: usize,
    intervals: &[(f64, f64)],
) -> PolarsResult<DensitySeries> {
    let edges = bin_edges(chromosome_length, bin_count)?;
    let step = chromosome_length / bin_count as f64;

    let mut diff = vec![0i64; bin_count + 1];
    for &(start, end) in intervals {
        if end < start {
            return Err(PolarsError::ComputeError(
                format!("feature interval end {} precedes start {}", end, start).into(),
            ));
        }
        // First bin whose right edge reaches the feature, last bin whose
        // left edge does not pass it.
        let lo = ((start / step).ceil() - 1.0).max(0.0) as usize;
        let hi_raw = (end / step).floor();
        if hi_raw < 0.0 || lo >= bin_count {
            continue;
        }
        let hi = (hi_raw as usize).min(bin_count - 1);
        if lo > hi {
            continue;
        }
        diff[lo] += 1;
        diff[hi + 1] -= 1;
    }

    let mut counts = Vec::with_capacity(bin_count + 1);
    let mut running = 0i64;
    for d in diff.iter().take(bin_count) {
        running += d;
        counts.push(running as u32);
    }
    // Duplicate the final count to align the series with the edges.
    counts.push(*counts.last().unwrap_or(&0));

    Ok(DensitySeries { edges, counts })
}

/// Filter the annotation frame down to one (sequence, feature type) pair and
/// run the binner over the surviving intervals.
pub fn density_from_features(
    features: &DataFrame,
    sequence: &str,
    target: FeatureType,
    chromosome_length: f64,
    bin_count: usize,
) -> PolarsResult<DensitySeries> {
    let filtered = features
        .clone()
        .lazy()
        .filter(
            col("type")
                .eq(lit(target.as_str()))
                .and(col("sequence").eq(lit(sequence))),
        )
        .select([
            col("start").cast(DataType::Float64),
            col("end").cast(DataType::Float64),
        ])
        .collect()?;

    let starts = filtered.column("start")?.f64()?;
    let ends = filtered.column("end")?.f64()?;

    let intervals: Vec<(f64, f64)> = starts
        .iter()
        .zip(ends.iter())
        .filter_map(|(s, e)| match (s, e) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        })
        .collect();

    feature_density(chromosome_length, bin_count, &intervals)
}
