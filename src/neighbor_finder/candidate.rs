//! Scored neighbor candidates and their per-target ranking.
//!
//! A [`NeighborCandidate`] is produced for every reference object that survives the
//! narrow-phase cuts around a target. [`rank_candidates`] then orders the candidates of
//! one target, keeps the best `max_neighbors` of them and assigns ranks `1..=n`.

use std::cmp::Ordering;

use crate::constants::{KmPerSec, Kpc, ObjectId};

/// One reference object accepted as neighbor of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborCandidate {
    /// Position of the target in its catalog.
    pub target_index: usize,
    /// Position of the reference in its catalog.
    pub reference_index: usize,
    pub target_id: ObjectId,
    pub reference_id: ObjectId,
    /// Signed `c·(z_target − z_reference)`.
    pub velocity_diff_km_s: KmPerSec,
    /// Projected separation at the target redshift.
    pub r_proj_kpc: Kpc,
    /// Angular separation on the sky.
    pub separation_arcmin: f64,
    /// Combined proximity in `[0, 1]`, 1 being coincident in space and velocity.
    pub proximity_score: f64,
    /// 1-based rank within the target's neighbors, set by [`rank_candidates`].
    pub neighbor_rank: usize,
}

/// Weighted proximity score.
///
/// ```text
/// s = 1 − sqrt(w_r·(R_proj / R_max)² + w_v·(|Δv| / V_max)²)
/// ```
///
/// clipped to `[0, 1]`. With equal weights of 0.5 a candidate on both cutoffs scores 0.
///
/// Arguments
/// -----------------
/// * `r_proj_kpc`, `r_proj_max_kpc`: projected separation and its cutoff.
/// * `velocity_diff_kms`, `vel_diff_max_kms`: velocity difference (any sign) and its cutoff.
/// * `r_proj_weight`, `vel_diff_weight`: non-negative weights summing to 1.
///
/// Return
/// ----------
/// * The score in `[0, 1]`.
pub fn proximity_score(
    r_proj_kpc: Kpc,
    r_proj_max_kpc: Kpc,
    velocity_diff_kms: KmPerSec,
    vel_diff_max_kms: KmPerSec,
    r_proj_weight: f64,
    vel_diff_weight: f64,
) -> f64 {
    let a = r_proj_kpc / r_proj_max_kpc;
    let b = velocity_diff_kms.abs() / vel_diff_max_kms;
    let distance = (r_proj_weight * a * a + vel_diff_weight * b * b).sqrt();
    (1.0 - distance).clamp(0.0, 1.0)
}

/// Ranking order: score descending, then `R_proj` ascending, then reference id ascending.
pub fn ranking_order(a: &NeighborCandidate, b: &NeighborCandidate) -> Ordering {
    b.proximity_score
        .total_cmp(&a.proximity_score)
        .then_with(|| a.r_proj_kpc.total_cmp(&b.r_proj_kpc))
        .then_with(|| a.reference_id.cmp(&b.reference_id))
}

/// Sort the candidates of **one** target, keep the best `max_neighbors` and number them.
///
/// Arguments
/// -----------------
/// * `candidates`: every accepted reference for the target, in any order.
/// * `max_neighbors`: how many to keep (`≥ 1`).
///
/// Return
/// ----------
/// * The kept candidates, best first, with `neighbor_rank` set to `1..=n`.
pub fn rank_candidates(
    mut candidates: Vec<NeighborCandidate>,
    max_neighbors: usize,
) -> Vec<NeighborCandidate> {
    candidates.sort_by(ranking_order);
    candidates.truncate(max_neighbors);
    for (rank, candidate) in candidates.iter_mut().enumerate() {
        candidate.neighbor_rank = rank + 1;
    }
    candidates
}
