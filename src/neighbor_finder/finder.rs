//! # Neighbor finder
//!
//! [`NeighborFinder`] owns both catalogs, their projected positions and a [`KdTree`] over
//! the reference positions. Construction does all the one-off work; every call to
//! [`NeighborFinder::find_neighbors`] is then a read-only pass over the targets, so the
//! same finder can be queried with several [`NeighborSearchParams`].
//!
//! ## Per-target pipeline
//!
//! 1. **Broad phase** – query the tree with [`NeighborFinder::broad_phase_radius`], a
//!    Cartesian radius that encloses every reference passing both cuts:
//!
//!    ```text
//!    θ_max = min(π, R_max / D_A(z_t))          (π when D_A(z_t) = 0)
//!    Δr    = max(D_C(z_t + Δz) − D_C(z_t), D_C(z_t) − D_C(max(0, z_t − Δz)))
//!    chord = 2·sqrt(D_C(z_t)·D_C(z_t + Δz))·sin(θ_max / 2)
//!    R     = sqrt(Δr² + chord²)·(1 + 1e-9) + 1e-9        with Δz = V_max / c
//!    ```
//!
//! 2. **Narrow phase** – haversine separation θ, `R_proj = θ·D_A(z_t)`, `Δv = c·(z_t − z_r)`;
//!    drop the reference when `R_proj > R_max` or `|Δv| > V_max`.
//! 3. **Score, rank, truncate** – see [`candidate`](super::candidate).
//!
//! Targets are visited by ascending identifier and the output keeps that order.
//!
//! ## Execution
//!
//! With the `parallel` feature (default) targets are spread over the rayon pool; each
//! worker reuses its own query buffer and the per-target results are collected in target
//! order, so the output does not depend on scheduling.
//! [`NeighborFinder::find_neighbors_with_cancel`] always runs sequentially and polls its
//! callback every 20 ms of wall-clock time.
use std::f64::consts::PI;
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use crate::progress_bar::SearchProgress;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::{
    candidate::{proximity_score, rank_candidates, NeighborCandidate},
    result_table::ResultTable,
    NeighborSearchParams,
};
use crate::{
    catalog::{validation::validate_unique_ids, Catalog},
    constants::{Mpc, KPC_PER_MPC, RAD2ARCMIN},
    conversion::angular_separation,
    cosmology::{Cosmology, CosmologyParams},
    gnf_errors::GnfError,
    projection::{CoordinateProjector, ProjectedPoint},
    spatial_index::{KdTree, RadiusHit},
};

/// Relative and absolute slack added to the broad-phase radius.
const BROAD_PHASE_SLACK: f64 = 1e-9;

/// Minimal wall-clock delay between two cancellation polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct NeighborFinder {
    target: Catalog,
    reference: Catalog,
    cosmology: Cosmology,
    target_points: Vec<ProjectedPoint>,
    reference_points: Vec<ProjectedPoint>,
    /// `D_C(z_t)` per target, Mpc.
    target_comoving: Vec<Mpc>,
    /// `D_A(z_t)` per target, Mpc.
    target_angular: Vec<Mpc>,
    /// Target indices by ascending identifier.
    target_order: Vec<usize>,
    index: KdTree,
}

impl NeighborFinder {
    /// Prepare a search between two catalogs.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: sparse catalog whose objects receive neighbors.
    /// * `reference`: dense catalog in which neighbors are searched.
    /// * `cosmology`: parameters of the flat ΛCDM model used for every distance.
    ///
    /// Return
    /// ----------
    /// * A ready finder, or
    ///   * [`GnfError::InvalidConfiguration`] for invalid cosmological parameters,
    ///   * [`GnfError::DataContract`] for non-finite fields, malformed rows or duplicate ids,
    ///   * [`GnfError::Domain`] for negative redshifts.
    pub fn new(
        target: Catalog,
        reference: Catalog,
        cosmology: CosmologyParams,
    ) -> Result<Self, GnfError> {
        let cosmology = Cosmology::new(cosmology)?;
        check_data_contract(&target)?;
        check_data_contract(&reference)?;

        let projector = CoordinateProjector::new(&cosmology);
        let target_points = projector.project_catalog(&target)?;
        let reference_points = projector.project_catalog(&reference)?;

        let mut target_comoving = Vec::with_capacity(target.len());
        let mut target_angular = Vec::with_capacity(target.len());
        for rec in target.records() {
            let d_c = cosmology.comoving_distance(rec.redshift)?;
            target_comoving.push(d_c);
            target_angular.push(d_c / (1.0 + rec.redshift));
        }

        let mut target_order: Vec<usize> = (0..target.len()).collect();
        target_order.sort_by(|&a, &b| target.records()[a].id.cmp(&target.records()[b].id));

        let index = KdTree::new(&reference_points);
        info!(
            "Indexed {} reference objects ({}) for {} targets ({}), H0={}, Om0={}",
            reference.len(),
            reference.name(),
            target.len(),
            target.name(),
            cosmology.params().h0,
            cosmology.params().om0
        );

        Ok(NeighborFinder {
            target,
            reference,
            cosmology,
            target_points,
            reference_points,
            target_comoving,
            target_angular,
            target_order,
            index,
        })
    }

    pub fn target(&self) -> &Catalog {
        &self.target
    }

    pub fn reference(&self) -> &Catalog {
        &self.reference
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    pub fn target_points(&self) -> &[ProjectedPoint] {
        &self.target_points
    }

    pub fn reference_points(&self) -> &[ProjectedPoint] {
        &self.reference_points
    }

    /// Cartesian radius (Mpc) enclosing every acceptable reference of target `target_index`.
    ///
    /// `target_index` is the position in the target catalog; `params` is assumed valid.
    pub fn broad_phase_radius(&self, target_index: usize, params: &NeighborSearchParams) -> Mpc {
        let z_t = self.target.records()[target_index].redshift;
        let d_t = self.target_comoving[target_index];
        let d_a = self.target_angular[target_index];

        let theta_max = if d_a > 0.0 {
            (params.r_proj_max_kpc / (KPC_PER_MPC * d_a)).min(PI)
        } else {
            PI
        };

        let dz = self.cosmology.redshift_window(params.vel_diff_max_kms);
        let d_hi = self.cosmology.comoving_distance_unchecked(z_t + dz);
        let d_lo = self
            .cosmology
            .comoving_distance_unchecked((z_t - dz).max(0.0));

        let delta_r = (d_hi - d_t).max(d_t - d_lo);
        let chord = 2.0 * (d_t * d_hi).sqrt() * (0.5 * theta_max).sin();

        (delta_r * delta_r + chord * chord).sqrt() * (1.0 + BROAD_PHASE_SLACK) + BROAD_PHASE_SLACK
    }

    /// Run the search over every target.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: cutoffs, score weights and truncation.
    ///
    /// Return
    /// ----------
    /// * The [`ResultTable`]; an empty table (header only) when no pair passes the cuts.
    /// * [`GnfError::InvalidConfiguration`] if `params` is invalid, before any work.
    pub fn find_neighbors(&self, params: &NeighborSearchParams) -> Result<ResultTable, GnfError> {
        params.validate()?;
        info!("Starting neighbor search: {params}");

        let per_target = self.search_all(params)?;
        Ok(self.assemble(per_target))
    }

    /// Sequential search with cooperative cancellation.
    ///
    /// `should_cancel` is called before the first target and then whenever at least 20 ms
    /// elapsed since the previous call. Returning `true` stops the search.
    ///
    /// Return
    /// ----------
    /// * The same table as [`NeighborFinder::find_neighbors`] when not cancelled.
    /// * [`GnfError::Interrupted`] with the number of completed targets otherwise.
    pub fn find_neighbors_with_cancel<F>(
        &self,
        params: &NeighborSearchParams,
        should_cancel: F,
    ) -> Result<ResultTable, GnfError>
    where
        F: FnMut() -> bool,
    {
        params.validate()?;
        info!("Starting cancellable neighbor search: {params}");

        let per_target = self.search_sequential(params, should_cancel)?;
        Ok(self.assemble(per_target))
    }

    /// Neighbors of one target, ranked and truncated.
    fn search_target(
        &self,
        target_index: usize,
        params: &NeighborSearchParams,
        hits: &mut Vec<RadiusHit>,
    ) -> Vec<NeighborCandidate> {
        let radius = self.broad_phase_radius(target_index, params);
        self.index
            .query_radius_into(&self.target_points[target_index], radius, hits);

        let target = &self.target.records()[target_index];
        let d_a = self.target_angular[target_index];

        let mut accepted = Vec::new();
        for hit in hits.iter() {
            if params.exclude_coincident && hit.distance == 0.0 {
                continue;
            }

            let reference = &self.reference.records()[hit.index];
            let theta = angular_separation(target.ra, target.dec, reference.ra, reference.dec);
            let r_proj_kpc = theta * d_a * KPC_PER_MPC;
            if r_proj_kpc > params.r_proj_max_kpc {
                continue;
            }

            let velocity_diff = self
                .cosmology
                .velocity_diff(target.redshift, reference.redshift);
            if velocity_diff.abs() > params.vel_diff_max_kms {
                continue;
            }

            accepted.push(NeighborCandidate {
                target_index,
                reference_index: hit.index,
                target_id: target.id.clone(),
                reference_id: reference.id.clone(),
                velocity_diff_km_s: velocity_diff,
                r_proj_kpc,
                separation_arcmin: theta * RAD2ARCMIN,
                proximity_score: proximity_score(
                    r_proj_kpc,
                    params.r_proj_max_kpc,
                    velocity_diff,
                    params.vel_diff_max_kms,
                    params.r_proj_weight,
                    params.vel_diff_weight,
                ),
                neighbor_rank: 0,
            });
        }

        debug!(
            "target {}: broad radius {:.3} Mpc, {} in sphere, {} accepted",
            target.id,
            radius,
            hits.len(),
            accepted.len()
        );
        rank_candidates(accepted, params.max_neighbors)
    }

    #[cfg(all(feature = "parallel", feature = "progress"))]
    fn search_all(
        &self,
        params: &NeighborSearchParams,
    ) -> Result<Vec<Vec<NeighborCandidate>>, GnfError> {
        let progress = SearchProgress::new(self.target_order.len());
        let per_target = self
            .target_order
            .par_iter()
            .map_init(Vec::new, |hits, &t| {
                let found = self.search_target(t, params, hits);
                progress.target_done(found.len());
                found
            })
            .collect();
        progress.finish();
        Ok(per_target)
    }

    #[cfg(all(feature = "parallel", not(feature = "progress")))]
    fn search_all(
        &self,
        params: &NeighborSearchParams,
    ) -> Result<Vec<Vec<NeighborCandidate>>, GnfError> {
        Ok(self
            .target_order
            .par_iter()
            .map_init(Vec::new, |hits, &t| self.search_target(t, params, hits))
            .collect())
    }

    #[cfg(not(feature = "parallel"))]
    fn search_all(
        &self,
        params: &NeighborSearchParams,
    ) -> Result<Vec<Vec<NeighborCandidate>>, GnfError> {
        self.search_sequential(params, || false)
    }

    #[cfg(feature = "progress")]
    fn search_sequential<F>(
        &self,
        params: &NeighborSearchParams,
        mut should_cancel: F,
    ) -> Result<Vec<Vec<NeighborCandidate>>, GnfError>
    where
        F: FnMut() -> bool,
    {
        let total = self.target_order.len();
        let mut progress = SearchProgress::new(total);
        let mut last_poll: Option<Instant> = None;
        let mut hits = Vec::new();
        let mut per_target = Vec::with_capacity(total);

        for (processed, &t) in self.target_order.iter().enumerate() {
            if last_poll.map_or(true, |at| at.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    progress.finish();
                    warn!("Neighbor search interrupted after {processed}/{total} targets");
                    return Err(GnfError::Interrupted { processed, total });
                }
                last_poll = Some(Instant::now());
            }

            let found = self.search_target(t, params, &mut hits);
            progress.timed_target_done(found.len());
            per_target.push(found);
        }

        if let Some(avg) = progress.average_target_time() {
            debug!("{} pairs kept, {avg:?} per target", progress.pairs());
        }
        progress.finish();
        Ok(per_target)
    }

    #[cfg(not(feature = "progress"))]
    fn search_sequential<F>(
        &self,
        params: &NeighborSearchParams,
        mut should_cancel: F,
    ) -> Result<Vec<Vec<NeighborCandidate>>, GnfError>
    where
        F: FnMut() -> bool,
    {
        let total = self.target_order.len();
        let mut last_poll: Option<Instant> = None;
        let mut hits = Vec::new();
        let mut per_target = Vec::with_capacity(total);

        for (processed, &t) in self.target_order.iter().enumerate() {
            if last_poll.map_or(true, |at| at.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    warn!("Neighbor search interrupted after {processed}/{total} targets");
                    return Err(GnfError::Interrupted { processed, total });
                }
                last_poll = Some(Instant::now());
            }

            per_target.push(self.search_target(t, params, &mut hits));
        }

        Ok(per_target)
    }

    fn assemble(&self, per_target: Vec<Vec<NeighborCandidate>>) -> ResultTable {
        let matched = per_target.iter().filter(|c| !c.is_empty()).count();
        let candidates: Vec<NeighborCandidate> = per_target.into_iter().flatten().collect();

        if candidates.is_empty() {
            warn!("No neighbors found within the given constraints");
        } else {
            info!(
                "Found {} neighbor pairs for {}/{} targets",
                candidates.len(),
                matched,
                self.target.len()
            );
        }

        ResultTable::new(&self.target, &self.reference, candidates)
    }
}

/// Fields the search relies on: finite coordinates and redshift, one raw value per
/// header, unique identifiers. Range checks belong to the loader.
fn check_data_contract(catalog: &Catalog) -> Result<(), GnfError> {
    let width = catalog.headers().len();
    for (row, rec) in catalog.records().iter().enumerate() {
        if !(rec.ra.is_finite() && rec.dec.is_finite() && rec.redshift.is_finite()) {
            return Err(GnfError::DataContract(format!(
                "{} row {}: non-finite field (ra={}, dec={}, z={})",
                catalog.name(),
                row + 1,
                rec.ra,
                rec.dec,
                rec.redshift
            )));
        }
        if rec.columns.len() != width {
            return Err(GnfError::DataContract(format!(
                "{} row {}: {} raw values for {} columns",
                catalog.name(),
                row + 1,
                rec.columns.len(),
                width
            )));
        }
    }
    validate_unique_ids(catalog)
}

#[cfg(test)]
mod finder_test {
    use super::*;
    use crate::catalog::CatalogRecord;
    use crate::constants::ObjectId;
    use approx::assert_relative_eq;

    fn finder(target: Vec<CatalogRecord>, reference: Vec<CatalogRecord>) -> NeighborFinder {
        NeighborFinder::new(
            Catalog::from_records("T", target),
            Catalog::from_records("R", reference),
            CosmologyParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_data_contract() {
        let bad = NeighborFinder::new(
            Catalog::from_records("T", vec![CatalogRecord::new(1_i64, f64::NAN, 0.0, 0.1)]),
            Catalog::from_records("R", vec![CatalogRecord::new(2_i64, 1.0, 0.0, 0.1)]),
            CosmologyParams::default(),
        );
        assert!(matches!(bad, Err(GnfError::DataContract(_))));

        let dup = NeighborFinder::new(
            Catalog::from_records("T", vec![CatalogRecord::new(1_i64, 1.0, 0.0, 0.1)]),
            Catalog::from_records(
                "R",
                vec![
                    CatalogRecord::new(2_i64, 1.0, 0.0, 0.1),
                    CatalogRecord::new(2_i64, 2.0, 0.0, 0.1),
                ],
            ),
            CosmologyParams::default(),
        );
        assert!(matches!(dup, Err(GnfError::DataContract(_))));

        let negative = NeighborFinder::new(
            Catalog::from_records("T", vec![CatalogRecord::new(1_i64, 1.0, 0.0, -0.1)]),
            Catalog::from_records("R", vec![CatalogRecord::new(2_i64, 1.0, 0.0, 0.1)]),
            CosmologyParams::default(),
        );
        assert!(matches!(negative, Err(GnfError::Domain(_))));

        let cosmo = NeighborFinder::new(
            Catalog::from_records("T", vec![CatalogRecord::new(1_i64, 1.0, 0.0, 0.1)]),
            Catalog::from_records("R", vec![CatalogRecord::new(2_i64, 1.0, 0.0, 0.1)]),
            CosmologyParams::new(-1.0, 0.3),
        );
        assert!(matches!(cosmo, Err(GnfError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_broad_phase_radius_at_zero_redshift() {
        let f = finder(
            vec![CatalogRecord::new(1_i64, 10.0, 10.0, 0.0)],
            vec![CatalogRecord::new(2_i64, 10.0, 10.0, 0.001)],
        );
        let params = NeighborSearchParams::default();
        let dz = params.vel_diff_max_kms / crate::constants::VLIGHT;
        let expected = f.cosmology().comoving_distance(dz).unwrap();
        assert_relative_eq!(
            f.broad_phase_radius(0, &params),
            expected * (1.0 + 1e-9) + 1e-9,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_targets_sorted_by_id() {
        let f = finder(
            vec![
                CatalogRecord::new(30_i64, 120.0, 5.0, 0.05),
                CatalogRecord::new(10_i64, 10.0, 5.0, 0.05),
                CatalogRecord::new(20_i64, 60.0, 5.0, 0.05),
            ],
            vec![
                CatalogRecord::new(1_i64, 10.0, 5.0, 0.0501),
                CatalogRecord::new(2_i64, 60.0, 5.0, 0.0501),
                CatalogRecord::new(3_i64, 120.0, 5.0, 0.0501),
            ],
        );
        let table = f.find_neighbors(&NeighborSearchParams::default()).unwrap();
        let targets: Vec<ObjectId> = table.candidates().map(|c| c.target_id.clone()).collect();
        assert_eq!(
            targets,
            vec![ObjectId::Int(10), ObjectId::Int(20), ObjectId::Int(30)]
        );
    }

    #[test]
    fn test_exclude_coincident() {
        let shared = CatalogRecord::new(1_i64, 150.0, 2.0, 0.08);
        let f = finder(
            vec![shared.clone()],
            vec![shared, CatalogRecord::new(2_i64, 150.01, 2.0, 0.0801)],
        );

        // the object shared by both catalogs is not its own neighbor
        let default = f.find_neighbors(&NeighborSearchParams::default()).unwrap();
        assert_eq!(default.len(), 1);
        assert_eq!(default.rows()[0].neighbor.reference_id, ObjectId::Int(2));
        assert_eq!(default.rows()[0].neighbor.neighbor_rank, 1);

        let params = NeighborSearchParams::builder()
            .exclude_coincident(false)
            .build()
            .unwrap();
        let all = f.find_neighbors(&params).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.rows()[0].neighbor.reference_id, ObjectId::Int(1));
        assert_eq!(all.rows()[0].neighbor.proximity_score, 1.0);
        assert_eq!(all.rows()[1].neighbor.neighbor_rank, 2);
    }

    #[test]
    fn test_invalid_params_rejected_before_work() {
        let f = finder(
            vec![CatalogRecord::new(1_i64, 10.0, 10.0, 0.1)],
            vec![CatalogRecord::new(2_i64, 10.0, 10.0, 0.1)],
        );
        let mut params = NeighborSearchParams::default();
        params.vel_diff_max_kms = -3.0;
        assert!(matches!(
            f.find_neighbors(&params),
            Err(GnfError::InvalidConfiguration(_))
        ));
        let mut calls = 0;
        assert!(matches!(
            f.find_neighbors_with_cancel(&params, || {
                calls += 1;
                false
            }),
            Err(GnfError::InvalidConfiguration(_))
        ));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_cancel_before_first_target() {
        let f = finder(
            vec![
                CatalogRecord::new(1_i64, 10.0, 10.0, 0.1),
                CatalogRecord::new(2_i64, 20.0, 10.0, 0.1),
            ],
            vec![CatalogRecord::new(3_i64, 10.0, 10.0, 0.1)],
        );
        let res = f.find_neighbors_with_cancel(&NeighborSearchParams::default(), || true);
        assert_eq!(
            res,
            Err(GnfError::Interrupted {
                processed: 0,
                total: 2
            })
        );

        let table = f
            .find_neighbors_with_cancel(&NeighborSearchParams::default(), || false)
            .unwrap();
        assert_eq!(
            table,
            f.find_neighbors(&NeighborSearchParams::default()).unwrap()
        );
    }
}
