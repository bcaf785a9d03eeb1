//! Joins per-granularity overlap records into one coverage summary.
//!
//! The same woodland parcel is present in both the national and the local
//! run, so its total area must only be counted once. Area inside reserves is
//! summed over every record: national and local reserves are assumed not to
//! overlap each other, so a parcel's two overlap figures are independent.

use std::collections::BTreeSet;

use woodland_coverage_models::{FeatureId, OverlapRecord, SummaryRecord};

use crate::AggregateError;

/// Running sums over the records consumed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageTotals {
    /// Area of distinct parcels, in square kilometres.
    pub area_total: f64,
    /// Area inside reserves, in square kilometres.
    pub area_within: f64,
}

impl CoverageTotals {
    /// Turns the running sums into a summary.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::ZeroTotalArea`] unless the total area is
    /// strictly positive.
    pub fn summarize(self) -> Result<SummaryRecord, AggregateError> {
        if self.area_total.is_nan() || self.area_total <= 0.0 {
            return Err(AggregateError::ZeroTotalArea {
                area_total: self.area_total,
            });
        }

        Ok(SummaryRecord {
            area_total: self.area_total,
            area_within: self.area_within,
            coverage_ratio: self.area_within / self.area_total,
        })
    }
}

/// Folds one run's records into `totals`.
///
/// An identifier already in `seen` contributes no further total area; its
/// within-reserve area is always added. `seen` is updated in place so that
/// it can be threaded through successive runs.
#[must_use]
pub fn accumulate(
    records: &[OverlapRecord],
    seen: &mut BTreeSet<FeatureId>,
    mut totals: CoverageTotals,
) -> CoverageTotals {
    for record in records {
        if seen.insert(record.id.clone()) {
            totals.area_total += record.total_area_km2;
        }
        totals.area_within += record.area_within_km2;
    }
    totals
}

/// Aggregates several runs, in order, into a summary.
///
/// # Errors
///
/// Returns [`AggregateError::ZeroTotalArea`] if no parcel area was seen.
pub fn summarize_runs<'a, I>(runs: I) -> Result<SummaryRecord, AggregateError>
where
    I: IntoIterator<Item = &'a [OverlapRecord]>,
{
    let mut seen = BTreeSet::new();
    let totals = runs
        .into_iter()
        .fold(CoverageTotals::default(), |totals, records| {
            accumulate(records, &mut seen, totals)
        });

    log::info!(
        "{} distinct ancient woodland areas, {:.3} km^2 total, {:.3} km^2 within nature reserves",
        seen.len(),
        totals.area_total,
        totals.area_within,
    );

    totals.summarize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, within: f64, total: f64) -> OverlapRecord {
        OverlapRecord {
            id: FeatureId::Number(id),
            name: format!("Wood {id}"),
            area_within_km2: within,
            total_area_km2: total,
        }
    }

    #[test]
    fn duplicate_ids_count_total_area_once() {
        let records = vec![record(1, 0.002, 0.01); 5];
        let mut seen = BTreeSet::new();

        let totals = accumulate(&records, &mut seen, CoverageTotals::default());

        assert!((totals.area_total - 0.01).abs() < 1e-12);
        assert!((totals.area_within - 0.01).abs() < 1e-12);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn shared_id_across_runs_is_deduplicated() {
        let national = vec![record(1, 0.005, 0.01)];
        let local = vec![record(1, 0.003, 0.01)];

        let summary = summarize_runs([national.as_slice(), local.as_slice()]).unwrap();

        assert!((summary.area_total - 0.01).abs() < 1e-12);
        assert!((summary.area_within - 0.008).abs() < 1e-12);
        assert!((summary.coverage_ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn seen_set_is_threaded_between_calls() {
        let mut seen = BTreeSet::new();
        let totals = accumulate(&[record(1, 0.0, 1.0)], &mut seen, CoverageTotals::default());
        let totals = accumulate(&[record(1, 0.5, 1.0), record(2, 0.0, 3.0)], &mut seen, totals);

        assert!((totals.area_total - 4.0).abs() < 1e-12);
        assert!((totals.area_within - 0.5).abs() < 1e-12);
    }

    #[test]
    fn distinct_ids_sum_all_areas() {
        let national = vec![record(1, 0.5, 2.0), record(2, 0.0, 1.0)];
        let local = vec![record(3, 0.5, 1.0)];

        let summary = summarize_runs([national.as_slice(), local.as_slice()]).unwrap();

        assert!((summary.area_total - 4.0).abs() < 1e-12);
        assert!((summary.coverage_ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_are_an_error() {
        let empty: &[OverlapRecord] = &[];
        let err = summarize_runs([empty, empty]).unwrap_err();
        assert!(matches!(err, AggregateError::ZeroTotalArea { .. }));
    }

    #[test]
    fn zero_area_parcels_are_an_error() {
        let err = summarize_runs([[record(1, 0.0, 0.0)].as_slice()]).unwrap_err();
        assert!(matches!(err, AggregateError::ZeroTotalArea { .. }));
    }
}
