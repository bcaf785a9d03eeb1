//! The woodland/reserve overlap scan.
//!
//! For every reserve (outer loop) and every woodland parcel (inner loop),
//! a bounding-box test rejects most pairs cheaply. Surviving pairs are
//! intersected exactly in WGS84, and the intersection is reprojected to the
//! British National Grid to measure its true area.
//!
//! A parcel overlapping several reserves accumulates area from each. If two
//! reserves themselves overlap, the shared woodland area is counted twice;
//! this matches the published figures and is left as a known approximation.

use std::sync::Arc;

use geo::{Area, BooleanOps};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use woodland_coverage_models::OverlapRecord;
use woodland_projection::Reprojector;

use crate::OverlapError;
use crate::parcel::{ReservePolygon, WoodlandParcel};
use crate::progress::{ProgressCallback, null_progress};

/// How candidate (reserve, woodland) pairs are found.
///
/// Both strategies select exactly the pairs whose bounding boxes
/// intersect, so they produce identical records.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScanStrategy {
    /// Box-test every pair.
    #[default]
    BruteForce,
    /// Bulk-load woodland boxes into an R-tree and query it per reserve.
    RTree,
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Number of reserves scanned.
    pub reserves: u64,
    /// Number of woodland parcels scanned.
    pub parcels: u64,
    /// Pairs rejected by the bounding-box test.
    pub pruned: u64,
    /// Exact intersections attempted.
    pub intersections: u64,
    /// Intersections with positive area.
    pub contributing: u64,
}

impl ScanStats {
    /// Total (reserve, woodland) pairs considered.
    #[must_use]
    pub const fn pairs(&self) -> u64 {
        self.reserves * self.parcels
    }
}

/// Result of one overlap scan.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRun {
    /// One record per woodland parcel, in input order.
    pub records: Vec<OverlapRecord>,
    pub stats: ScanStats,
}

/// A woodland parcel's box in the R-tree, pointing back at its position.
struct IndexedBox {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Computes woodland/reserve overlaps.
pub struct OverlapEngine<'a, R: Reprojector> {
    reprojector: &'a R,
    strategy: ScanStrategy,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, R: Reprojector> OverlapEngine<'a, R> {
    /// Creates a brute-force engine with silent progress.
    #[must_use]
    pub fn new(reprojector: &'a R) -> Self {
        Self {
            reprojector,
            strategy: ScanStrategy::default(),
            progress: null_progress(),
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reports one unit of progress per reserve scanned.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Measures every parcel's total area and its area inside `reserves`.
    ///
    /// Parcels with no overlap are still emitted with zero area inside.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError::Reprojection`] if a parcel or one of its
    /// intersections cannot be reprojected. The error carries the
    /// woodland parcel's identifier.
    pub fn compute_overlaps(
        &self,
        parcels: &[WoodlandParcel],
        reserves: &[ReservePolygon],
    ) -> Result<OverlapRun, OverlapError> {
        let total_areas = parcels
            .iter()
            .map(|parcel| {
                self.reprojector
                    .area_km2(&parcel.geometry)
                    .map_err(|source| OverlapError::Reprojection {
                        id: parcel.id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let index = match self.strategy {
            ScanStrategy::BruteForce => None,
            ScanStrategy::RTree => Some(RTree::bulk_load(
                parcels
                    .iter()
                    .enumerate()
                    .map(|(index, parcel)| IndexedBox {
                        index,
                        envelope: parcel.bbox.to_aabb(),
                    })
                    .collect(),
            )),
        };

        let mut within = vec![0.0_f64; parcels.len()];
        let mut stats = ScanStats {
            reserves: reserves.len() as u64,
            parcels: parcels.len() as u64,
            ..ScanStats::default()
        };

        log::info!(
            "Scanning {} nature reserves against {} ancient woodland areas ({})",
            reserves.len(),
            parcels.len(),
            self.strategy,
        );
        self.progress.set_total(reserves.len() as u64);

        for (row, reserve) in reserves.iter().enumerate() {
            let candidates = index.as_ref().map_or_else(
                || {
                    parcels
                        .iter()
                        .enumerate()
                        .filter(|(_, parcel)| parcel.bbox.intersects(&reserve.bbox))
                        .map(|(i, _)| i)
                        .collect::<Vec<_>>()
                },
                |tree| {
                    let mut hits: Vec<usize> = tree
                        .locate_in_envelope_intersecting(&reserve.bbox.to_aabb())
                        .map(|entry| entry.index)
                        .collect();
                    hits.sort_unstable();
                    hits
                },
            );

            stats.pruned += (parcels.len() - candidates.len()) as u64;

            for i in candidates {
                stats.intersections += 1;
                let parcel = &parcels[i];

                let area = self.intersection_area_km2(parcel, reserve)?;
                if area > 0.0 {
                    within[i] += area;
                    stats.contributing += 1;
                }
            }

            log::trace!(
                "Reserve {} scanned ({:.1}%)",
                reserve.id,
                percent(row + 1, reserves.len())
            );
            self.progress.inc(1);
        }

        self.progress.finish(format!(
            "{} reserves scanned, {} overlaps",
            reserves.len(),
            stats.contributing
        ));
        log::info!(
            "Scan complete: {} pairs, {} pruned by bounding box, {} intersections, {} contributing",
            stats.pairs(),
            stats.pruned,
            stats.intersections,
            stats.contributing,
        );

        let records = parcels
            .iter()
            .zip(total_areas)
            .zip(within)
            .map(|((parcel, total_area_km2), area_within_km2)| OverlapRecord {
                id: parcel.id.clone(),
                name: parcel.name.clone(),
                area_within_km2,
                total_area_km2,
            })
            .collect();

        Ok(OverlapRun { records, stats })
    }

    /// Area of `parcel ∩ reserve` in square kilometres, or zero.
    fn intersection_area_km2(
        &self,
        parcel: &WoodlandParcel,
        reserve: &ReservePolygon,
    ) -> Result<f64, OverlapError> {
        let overlap = parcel.geometry.intersection(&reserve.geometry);
        if overlap.0.is_empty() || overlap.unsigned_area() <= 0.0 {
            return Ok(0.0);
        }

        self.reprojector
            .area_km2(&overlap)
            .map_err(|source| OverlapError::Reprojection {
                id: parcel.id.clone(),
                source,
            })
    }
}

/// Convenience wrapper: brute-force scan with silent progress.
///
/// # Errors
///
/// See [`OverlapEngine::compute_overlaps`].
pub fn compute_overlaps<R: Reprojector>(
    parcels: &[WoodlandParcel],
    reserves: &[ReservePolygon],
    reprojector: &R,
) -> Result<OverlapRun, OverlapError> {
    OverlapEngine::new(reprojector).compute_overlaps(parcels, reserves)
}

#[allow(clippy::cast_precision_loss)]
fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use geo::{Coord, LineString, MultiPolygon, Polygon, coord};
    use woodland_coverage_models::{FeatureId, UNKNOWN_NAME, WoodlandStatus};
    use woodland_projection::OsgbReprojector;

    use super::*;

    /// South-west corner of the test area on the national grid (near Bristol).
    const SW: (f64, f64) = (358_000.0, 174_000.0);

    fn grid_rect(e: f64, n: f64, width: f64, height: f64) -> MultiPolygon<f64> {
        let reprojector = OsgbReprojector::new();
        let ring: Vec<Coord<f64>> = [
            (e, n),
            (e + width, n),
            (e + width, n + height),
            (e, n + height),
            (e, n),
        ]
        .iter()
        .map(|&(x, y)| reprojector.unproject(coord! { x: x, y: y }).unwrap())
        .collect();
        MultiPolygon(vec![Polygon::new(LineString::from(ring), vec![])])
    }

    fn woodland(id: i64, name: &str, geometry: MultiPolygon<f64>) -> WoodlandParcel {
        WoodlandParcel::new(
            FeatureId::Number(id),
            name.to_string(),
            WoodlandStatus::AncientSemiNatural,
            geometry,
        )
        .unwrap()
    }

    fn reserve(id: i64, geometry: MultiPolygon<f64>) -> ReservePolygon {
        ReservePolygon::new(FeatureId::Number(id), None, geometry).unwrap()
    }

    #[test]
    fn half_overlapping_squares() {
        let parcels = vec![woodland(
            1,
            "Long wood",
            grid_rect(SW.0 + 50.0, SW.1, 100.0, 100.0),
        )];
        let reserves = vec![reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0))];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();
        let record = &run.records[0];

        assert_eq!(record.id, FeatureId::Number(1));
        assert_eq!(record.name, "Long wood");
        assert!((record.area_within_km2 - 0.005).abs() < 5e-4, "{record:?}");
        assert!((record.total_area_km2 - 0.01).abs() < 5e-4, "{record:?}");
        assert_eq!(run.stats.intersections, 1);
        assert_eq!(run.stats.contributing, 1);
    }

    #[test]
    fn disjoint_boxes_are_never_intersected() {
        let parcels = vec![woodland(1, "Far wood", grid_rect(SW.0 + 1_000.0, SW.1, 100.0, 100.0))];
        let reserves = vec![reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0))];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();

        assert_eq!(run.stats.intersections, 0);
        assert_eq!(run.stats.pruned, 1);
        assert!(run.records[0].area_within_km2.abs() < f64::EPSILON);
        assert!(run.records[0].total_area_km2 > 0.0);
    }

    #[test]
    fn zero_overlap_parcels_are_still_emitted_in_order() {
        let parcels = vec![
            woodland(3, "C", grid_rect(SW.0 + 5_000.0, SW.1, 100.0, 100.0)),
            woodland(1, "A", grid_rect(SW.0 + 25.0, SW.1 + 25.0, 50.0, 50.0)),
            woodland(2, UNKNOWN_NAME, grid_rect(SW.0 - 5_000.0, SW.1, 100.0, 100.0)),
        ];
        let reserves = vec![reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0))];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();
        let ids: Vec<FeatureId> = run.records.iter().map(|r| r.id.clone()).collect();

        assert_eq!(
            ids,
            vec![FeatureId::Number(3), FeatureId::Number(1), FeatureId::Number(2)]
        );
        assert!(run.records[0].area_within_km2.abs() < f64::EPSILON);
        assert!((run.records[1].area_within_km2 - 0.0025).abs() < 1e-5);
        assert_eq!(run.records[2].name, UNKNOWN_NAME);
    }

    #[test]
    fn touching_edges_contribute_nothing() {
        let parcels = vec![woodland(1, "Edge wood", grid_rect(SW.0 + 100.0, SW.1, 100.0, 100.0))];
        let reserves = vec![reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0))];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();

        assert!(run.records[0].area_within_km2 < 1e-6);
    }

    #[test]
    fn overlap_never_exceeds_total_area() {
        let parcels = vec![
            woodland(1, "A", grid_rect(SW.0 + 10.0, SW.1 + 10.0, 30.0, 40.0)),
            woodland(2, "B", grid_rect(SW.0 + 80.0, SW.1 - 20.0, 60.0, 60.0)),
            woodland(3, "C", grid_rect(SW.0 - 50.0, SW.1 - 50.0, 300.0, 300.0)),
        ];
        let reserves = vec![reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0))];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();

        for record in &run.records {
            assert!(record.area_within_km2 >= 0.0);
            assert!(
                record.area_within_km2 <= record.total_area_km2 + 1e-7,
                "{record:?}"
            );
        }
        // A is fully inside the reserve; C fully contains it.
        assert!((run.records[0].area_within_km2 - run.records[0].total_area_km2).abs() < 1e-6);
        assert!((run.records[2].area_within_km2 - 0.01).abs() < 1e-5);
    }

    #[test]
    fn overlapping_reserves_are_counted_twice() {
        let parcels = vec![woodland(1, "Shared wood", grid_rect(SW.0, SW.1, 100.0, 100.0))];
        let reserves = vec![
            reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0)),
            reserve(2, grid_rect(SW.0, SW.1, 100.0, 100.0)),
        ];

        let run = compute_overlaps(&parcels, &reserves, &OsgbReprojector::new()).unwrap();

        assert!((run.records[0].area_within_km2 - 0.02).abs() < 1e-5);
        assert_eq!(run.stats.contributing, 2);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let parcels = vec![
            woodland(1, "A", grid_rect(SW.0 + 50.0, SW.1, 100.0, 100.0)),
            woodland(2, "B", grid_rect(SW.0 + 20.0, SW.1 + 60.0, 40.0, 70.0)),
        ];
        let reserves = vec![
            reserve(1, grid_rect(SW.0, SW.1, 100.0, 100.0)),
            reserve(2, grid_rect(SW.0 + 90.0, SW.1 + 90.0, 50.0, 50.0)),
        ];
        let reprojector = OsgbReprojector::new();

        let first = compute_overlaps(&parcels, &reserves, &reprojector).unwrap();
        let second = compute_overlaps(&parcels, &reserves, &reprojector).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn r_tree_matches_brute_force() {
        let parcels: Vec<WoodlandParcel> = (0..12_i32)
            .map(|i| {
                let offset = f64::from(i) * 45.0;
                woodland(i64::from(i), "Grid wood", grid_rect(SW.0 + offset, SW.1 + offset / 2.0, 60.0, 60.0))
            })
            .collect();
        let reserves = vec![
            reserve(1, grid_rect(SW.0, SW.1, 200.0, 150.0)),
            reserve(2, grid_rect(SW.0 + 300.0, SW.1 + 100.0, 120.0, 120.0)),
            reserve(3, grid_rect(SW.0 + 10_000.0, SW.1, 50.0, 50.0)),
        ];
        let reprojector = OsgbReprojector::new();

        let brute = OverlapEngine::new(&reprojector)
            .compute_overlaps(&parcels, &reserves)
            .unwrap();
        let indexed = OverlapEngine::new(&reprojector)
            .with_strategy(ScanStrategy::RTree)
            .compute_overlaps(&parcels, &reserves)
            .unwrap();

        assert_eq!(brute.records, indexed.records);
        assert_eq!(brute.stats, indexed.stats);
    }

    #[test]
    fn reprojection_failure_names_the_parcel() {
        let outside = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(151.0, -34.0), (151.1, -34.0), (151.1, -33.9)]),
            vec![],
        )]);
        let parcels = vec![woodland(99, "Antipodean wood", outside)];

        let err = compute_overlaps(&parcels, &[], &OsgbReprojector::new()).unwrap_err();

        assert!(matches!(
            err,
            OverlapError::Reprojection { id, .. } if id == FeatureId::Number(99)
        ));
    }

    struct CountingProgress {
        total: AtomicU64,
        done: AtomicU64,
    }

    impl ProgressCallback for CountingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
        fn inc(&self, delta: u64) {
            self.done.fetch_add(delta, Ordering::SeqCst);
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
    }

    #[test]
    fn reports_one_step_per_reserve() {
        let progress = Arc::new(CountingProgress {
            total: AtomicU64::new(0),
            done: AtomicU64::new(0),
        });
        let parcels = vec![woodland(1, "A", grid_rect(SW.0, SW.1, 100.0, 100.0))];
        let reserves = vec![
            reserve(1, grid_rect(SW.0, SW.1, 10.0, 10.0)),
            reserve(2, grid_rect(SW.0 + 500.0, SW.1, 10.0, 10.0)),
            reserve(3, grid_rect(SW.0 + 900.0, SW.1, 10.0, 10.0)),
        ];
        let reprojector = OsgbReprojector::new();

        OverlapEngine::new(&reprojector)
            .with_progress(progress.clone())
            .compute_overlaps(&parcels, &reserves)
            .unwrap();

        assert_eq!(progress.total.load(Ordering::SeqCst), 3);
        assert_eq!(progress.done.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn scan_strategy_parses_from_kebab_case() {
        assert_eq!("r-tree".parse::<ScanStrategy>().unwrap(), ScanStrategy::RTree);
        assert_eq!(ScanStrategy::BruteForce.to_string(), "brute-force");
    }
}
