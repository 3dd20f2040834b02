//! # Neighbor search parameters
//!
//! This module defines the [`crate::neighbor_finder::NeighborSearchParams`] configuration
//! struct and its builder, which control which reference objects count as neighbors of a
//! target and how many of them are kept.
//!
//! ## Purpose
//!
//! The [`NeighborSearchParams`](crate::neighbor_finder::NeighborSearchParams) object centralizes
//! all tunable quantities used by
//! [`NeighborFinder::find_neighbors`](crate::neighbor_finder::finder::NeighborFinder::find_neighbors):
//!
//! - the projected-separation cutoff `r_proj_max_kpc`,
//! - the velocity-difference cutoff `vel_diff_max_kms`,
//! - the number of neighbors kept per target `max_neighbors`,
//! - the weights of the two normalized distances in the proximity score,
//! - whether references coincident with the target are dropped (`exclude_coincident`).
//!
//! ## Pipeline overview
//!
//! 1. **Broad phase**
//!    A Cartesian radius guaranteed to enclose every acceptable reference is derived from
//!    both cutoffs and queried against the reference [`KdTree`](crate::spatial_index::KdTree).
//!
//! 2. **Narrow phase**
//!    The projected separation `R_proj = θ·D_A(z_t)` and the velocity difference
//!    `Δv = c·(z_t − z_r)` are computed exactly; candidates above either cutoff are dropped.
//!
//! 3. **Scoring & ranking**
//!    `s = 1 − sqrt(w_r·(R_proj/r_max)² + w_v·(Δv/v_max)²)` clipped to `[0, 1]`,
//!    ranked by descending score, then ascending `R_proj`, then ascending reference id,
//!    and truncated to `max_neighbors`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gnf::neighbor_finder::NeighborSearchParams;
//!
//! let params = NeighborSearchParams::builder()
//!     .max_neighbors(50)
//!     .r_proj_max_kpc(1000.0)
//!     .vel_diff_max_kms(500.0)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## See also
//!
//! * [`finder::NeighborFinder`] – search entry point
//! * [`candidate::NeighborCandidate`] – one scored neighbor
//! * [`result_table::ResultTable`] – assembled output
use crate::{
    constants::{
        KmPerSec, Kpc, DEFAULT_EXCLUDE_COINCIDENT, DEFAULT_MAX_NEIGHBORS, DEFAULT_R_PROJ_MAX_KPC,
        DEFAULT_VEL_DIFF_MAX_KMS,
        MAX_SEPARATION_KPC, MAX_VEL_DIFF_KMS, RPROJ_WEIGHT, VEL_DIFF_WEIGHT,
    },
    gnf_errors::GnfError,
};
use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

pub mod candidate;
pub mod finder;
pub mod result_table;

/// Tolerance on `r_proj_weight + vel_diff_weight = 1`.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration of a neighbor search.
///
/// Invariants (checked by [`NeighborSearchParamsBuilder::build`])
/// -----------------
/// * `max_neighbors ≥ 1`.
/// * `0 < r_proj_max_kpc ≤ 100 000`, `0 < vel_diff_max_kms ≤ 100 000`.
/// * `r_proj_weight ≥ 0`, `vel_diff_weight ≥ 0`, and they sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborSearchParams {
    /// Maximum number of neighbors reported per target.
    pub max_neighbors: usize,
    /// Maximum projected separation at the target redshift (kpc).
    pub r_proj_max_kpc: Kpc,
    /// Maximum absolute line-of-sight velocity difference (km/s).
    pub vel_diff_max_kms: KmPerSec,
    /// Weight of `(R_proj / r_proj_max)²` in the score.
    pub r_proj_weight: f64,
    /// Weight of `(Δv / vel_diff_max)²` in the score.
    pub vel_diff_weight: f64,
    /// Drop references at zero Cartesian distance from the target (on by default).
    pub exclude_coincident: bool,
}

impl NeighborSearchParams {
    /// Equivalent to [`NeighborSearchParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NeighborSearchParamsBuilder {
        NeighborSearchParamsBuilder::new()
    }

    /// Re-run the builder checks on a value that may have been edited field by field.
    pub fn validate(&self) -> Result<(), GnfError> {
        NeighborSearchParamsBuilder {
            params: self.clone(),
        }
        .build()
        .map(|_| ())
    }
}

impl Default for NeighborSearchParams {
    fn default() -> Self {
        NeighborSearchParams {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            r_proj_max_kpc: DEFAULT_R_PROJ_MAX_KPC,
            vel_diff_max_kms: DEFAULT_VEL_DIFF_MAX_KMS,
            r_proj_weight: RPROJ_WEIGHT,
            vel_diff_weight: VEL_DIFF_WEIGHT,
            exclude_coincident: DEFAULT_EXCLUDE_COINCIDENT,
        }
    }
}

/// Builder for [`NeighborSearchParams`], with validation.
#[derive(Debug, Clone)]
pub struct NeighborSearchParamsBuilder {
    params: NeighborSearchParams,
}

impl Default for NeighborSearchParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighborSearchParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: NeighborSearchParams::default(),
        }
    }

    pub fn max_neighbors(mut self, v: usize) -> Self {
        self.params.max_neighbors = v;
        self
    }

    pub fn r_proj_max_kpc(mut self, v: Kpc) -> Self {
        self.params.r_proj_max_kpc = v;
        self
    }

    pub fn vel_diff_max_kms(mut self, v: KmPerSec) -> Self {
        self.params.vel_diff_max_kms = v;
        self
    }

    /// Set both score weights at once.
    pub fn score_weights(mut self, r_proj_weight: f64, vel_diff_weight: f64) -> Self {
        self.params.r_proj_weight = r_proj_weight;
        self.params.vel_diff_weight = vel_diff_weight;
        self
    }

    pub fn exclude_coincident(mut self, v: bool) -> Self {
        self.params.exclude_coincident = v;
        self
    }

    // ---- Numeric helpers for PartialOrd (handle NaN as invalid) ----

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Return true iff a <= b and comparable (i.e., not NaN).
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Less) | Some(Equal))
    }

    /// Finalize the builder and produce a [`NeighborSearchParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `max_neighbors ≥ 1`.
    /// * `0 < r_proj_max_kpc ≤ MAX_SEPARATION_KPC` (finite).
    /// * `0 < vel_diff_max_kms ≤ MAX_VEL_DIFF_KMS` (finite).
    /// * both weights `≥ 0`, summing to 1.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(NeighborSearchParams)` if every rule holds.
    /// * `Err(GnfError::InvalidConfiguration)` naming the first violated rule.
    pub fn build(self) -> Result<NeighborSearchParams, GnfError> {
        let p = &self.params;

        if p.max_neighbors == 0 {
            return Err(GnfError::InvalidConfiguration(
                "max_neighbors must be at least 1".into(),
            ));
        }

        if !(Self::gt0(p.r_proj_max_kpc) && Self::le(p.r_proj_max_kpc, MAX_SEPARATION_KPC)) {
            return Err(GnfError::InvalidConfiguration(format!(
                "r_proj_max must be in (0, {MAX_SEPARATION_KPC}] kpc, got {}",
                p.r_proj_max_kpc
            )));
        }

        if !(Self::gt0(p.vel_diff_max_kms) && Self::le(p.vel_diff_max_kms, MAX_VEL_DIFF_KMS)) {
            return Err(GnfError::InvalidConfiguration(format!(
                "vel_diff_max must be in (0, {MAX_VEL_DIFF_KMS}] km/s, got {}",
                p.vel_diff_max_kms
            )));
        }

        if !(Self::ge0(p.r_proj_weight) && Self::ge0(p.vel_diff_weight)) {
            return Err(GnfError::InvalidConfiguration(
                "score weights must be non-negative".into(),
            ));
        }
        if (p.r_proj_weight + p.vel_diff_weight - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(GnfError::InvalidConfiguration(format!(
                "score weights must sum to 1, got {} + {}",
                p.r_proj_weight, p.vel_diff_weight
            )));
        }

        Ok(self.params)
    }
}

impl fmt::Display for NeighborSearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Neighbor search parameters")?;
            writeln!(f, "--------------------------")?;
            writeln!(f, "  max_neighbors      = {}", self.max_neighbors)?;
            writeln!(f, "  r_proj_max         = {:.1} kpc", self.r_proj_max_kpc)?;
            writeln!(f, "  vel_diff_max       = {:.1} km/s", self.vel_diff_max_kms)?;
            writeln!(
                f,
                "  score weights      = {:.2} (R_proj), {:.2} (Δv)",
                self.r_proj_weight, self.vel_diff_weight
            )?;
            write!(f, "  exclude_coincident = {}", self.exclude_coincident)
        } else {
            write!(
                f,
                "NeighborSearchParams(max_neighbors={}, r_proj_max={:.1}kpc, vel_diff_max={:.1}km/s, weights=({:.2},{:.2}), exclude_coincident={})",
                self.max_neighbors,
                self.r_proj_max_kpc,
                self.vel_diff_max_kms,
                self.r_proj_weight,
                self.vel_diff_weight,
                self.exclude_coincident
            )
        }
    }
}
