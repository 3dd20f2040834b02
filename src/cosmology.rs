//! # Flat ΛCDM distances and velocities
//!
//! This module provides the [`Cosmology`] calculator used to place catalog objects along
//! the line of sight and to convert redshift differences into velocity differences.
//!
//! ## Model
//!
//! A flat ΛCDM universe with no radiation term:
//!
//! ```text
//! E(z)   = sqrt(Ωm·(1+z)³ + (1 − Ωm))
//! D_C(z) = (c / H0) · ∫₀ᶻ dz' / E(z')          comoving distance   [Mpc]
//! D_A(z) = D_C(z) / (1 + z)                    angular diameter    [Mpc]
//! Δv     = c · (z₁ − z₂)                       velocity difference [km/s]
//! ```
//!
//! ## Numerics
//!
//! The comoving integral is evaluated with a **fixed** composite Gauss–Legendre rule
//! (16 equal panels × 8 nodes on `[0, z]`). No adaptive refinement is involved, so the
//! same `z` always produces the same bits, which keeps scoring and ranking reproducible.
//! For `z ≤ 10` the rule is accurate far below the precision of catalog redshifts.
//!
//! ## Velocity approximation
//!
//! `velocity_diff` uses the low-velocity approximation `c·Δz`. It is signed
//! (`z₁ − z₂`); the neighbor search compares its magnitude against the cutoff and writes
//! the signed value (target − reference) to the output.

use serde::{Deserialize, Serialize};

use crate::{
    constants::{KmPerSec, Mpc, Redshift, HUBBLE_CONSTANT, MATTER_DENSITY, VLIGHT},
    gnf_errors::GnfError,
};

/// Number of equal-width panels of the composite rule.
const QUAD_PANELS: usize = 16;

/// 8-point Gauss–Legendre abscissae on `[-1, 1]` (positive half).
const GL_NODES: [f64; 4] = [
    0.183_434_642_495_649_8,
    0.525_532_409_916_329_0,
    0.796_666_477_413_626_7,
    0.960_289_856_497_536_3,
];

/// Weights matching [`GL_NODES`].
const GL_WEIGHTS: [f64; 4] = [
    0.362_683_783_378_362_0,
    0.313_706_645_877_887_3,
    0.222_381_034_453_374_5,
    0.101_228_536_290_376_3,
];

/// Parameters of a flat ΛCDM cosmology.
///
/// * `h0` – Hubble constant in km/s/Mpc, strictly positive.
/// * `om0` – matter density Ωm in `[0, 1]`; dark energy is `1 − om0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmologyParams {
    pub h0: f64,
    pub om0: f64,
}

impl Default for CosmologyParams {
    fn default() -> Self {
        CosmologyParams {
            h0: HUBBLE_CONSTANT,
            om0: MATTER_DENSITY,
        }
    }
}

impl CosmologyParams {
    pub fn new(h0: f64, om0: f64) -> Self {
        CosmologyParams { h0, om0 }
    }

    /// Check `h0 > 0` and `0 ≤ om0 ≤ 1` (NaN rejected).
    pub fn validate(&self) -> Result<(), GnfError> {
        if !(self.h0.is_finite() && self.h0 > 0.0) {
            return Err(GnfError::InvalidConfiguration(format!(
                "H0 must be a positive finite number, got {}",
                self.h0
            )));
        }
        if !(0.0..=1.0).contains(&self.om0) {
            return Err(GnfError::InvalidConfiguration(format!(
                "Om0 must lie in [0, 1], got {}",
                self.om0
            )));
        }
        Ok(())
    }
}

/// Distance and velocity calculator for a validated [`CosmologyParams`].
#[derive(Debug, Clone, Copy)]
pub struct Cosmology {
    params: CosmologyParams,
    hubble_distance: Mpc,
}

impl Cosmology {
    /// Build a calculator, rejecting invalid parameters.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: the (H0, Ωm) pair.
    ///
    /// Return
    /// ----------
    /// * A new [`Cosmology`] or [`GnfError::InvalidConfiguration`].
    pub fn new(params: CosmologyParams) -> Result<Self, GnfError> {
        params.validate()?;
        Ok(Cosmology {
            params,
            hubble_distance: VLIGHT / params.h0,
        })
    }

    pub fn params(&self) -> &CosmologyParams {
        &self.params
    }

    /// Hubble distance `c / H0` in Mpc.
    pub fn hubble_distance(&self) -> Mpc {
        self.hubble_distance
    }

    /// Dimensionless expansion rate `E(z) = H(z) / H0`.
    #[inline]
    pub fn efunc(&self, z: Redshift) -> f64 {
        let zp1 = 1.0 + z;
        (self.params.om0 * zp1 * zp1 * zp1 + (1.0 - self.params.om0)).sqrt()
    }

    /// Line-of-sight comoving distance to redshift `z`, in Mpc.
    ///
    /// Return
    /// ----------
    /// * `Ok(0.0)` for `z = 0`, strictly increasing for `z > 0`.
    /// * [`GnfError::Domain`] for negative or non-finite `z`.
    pub fn comoving_distance(&self, z: Redshift) -> Result<Mpc, GnfError> {
        check_redshift(z)?;
        Ok(self.comoving_distance_unchecked(z))
    }

    /// Angular diameter distance `D_C(z) / (1 + z)` in Mpc (flat universe).
    pub fn angular_diameter_distance(&self, z: Redshift) -> Result<Mpc, GnfError> {
        Ok(self.comoving_distance(z)? / (1.0 + z))
    }

    /// Recession-velocity difference `c·(z1 − z2)` in km/s.
    #[inline]
    pub fn velocity_diff(&self, z1: Redshift, z2: Redshift) -> KmPerSec {
        VLIGHT * (z1 - z2)
    }

    /// Redshift half-width matching a velocity cutoff under the same approximation
    /// as [`Cosmology::velocity_diff`].
    #[inline]
    pub fn redshift_window(&self, vel_diff_max: KmPerSec) -> f64 {
        vel_diff_max / VLIGHT
    }

    /// Composite Gauss–Legendre evaluation of `D_C`; `z` must be finite and `≥ 0`.
    pub(crate) fn comoving_distance_unchecked(&self, z: Redshift) -> Mpc {
        if z == 0.0 {
            return 0.0;
        }

        let width = z / QUAD_PANELS as f64;
        let half = 0.5 * width;
        let mut integral = 0.0;

        for panel in 0..QUAD_PANELS {
            let mid = (panel as f64 + 0.5) * width;
            let mut panel_sum = 0.0;
            for (node, weight) in GL_NODES.iter().zip(GL_WEIGHTS.iter()) {
                let offset = half * node;
                panel_sum +=
                    weight * (1.0 / self.efunc(mid - offset) + 1.0 / self.efunc(mid + offset));
            }
            integral += half * panel_sum;
        }

        self.hubble_distance * integral
    }
}

fn check_redshift(z: Redshift) -> Result<(), GnfError> {
    if !z.is_finite() {
        return Err(GnfError::Domain(format!("redshift must be finite, got {z}")));
    }
    if z < 0.0 {
        return Err(GnfError::Domain(format!(
            "redshift must be non-negative, got {z}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod cosmology_test {
    use super::*;
    use approx::assert_relative_eq;

    fn default_cosmo() -> Cosmology {
        Cosmology::new(CosmologyParams::default()).unwrap()
    }

    #[test]
    fn test_params_validation() {
        assert!(Cosmology::new(CosmologyParams::new(68.0, 0.31)).is_ok());
        assert!(Cosmology::new(CosmologyParams::new(70.0, 0.0)).is_ok());
        assert!(Cosmology::new(CosmologyParams::new(70.0, 1.0)).is_ok());

        for bad in [
            CosmologyParams::new(0.0, 0.3),
            CosmologyParams::new(-70.0, 0.3),
            CosmologyParams::new(f64::NAN, 0.3),
            CosmologyParams::new(70.0, -0.1),
            CosmologyParams::new(70.0, 1.1),
            CosmologyParams::new(70.0, f64::NAN),
        ] {
            assert!(matches!(
                Cosmology::new(bad),
                Err(GnfError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_comoving_distance_reference_values() {
        let cosmo = default_cosmo();
        // Flat ΛCDM, H0 = 70, Ωm = 0.3, no radiation.
        assert_relative_eq!(
            cosmo.comoving_distance(0.5).unwrap(),
            1888.625,
            max_relative = 1e-3
        );
        assert_relative_eq!(
            cosmo.comoving_distance(1.0).unwrap(),
            3303.829,
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_low_redshift_hubble_law() {
        let cosmo = default_cosmo();
        let z = 1e-4;
        assert_relative_eq!(
            cosmo.comoving_distance(z).unwrap(),
            cosmo.hubble_distance() * z,
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_einstein_de_sitter_closed_form() {
        // Ωm = 1: D_C = 2 c/H0 (1 − 1/sqrt(1+z))
        let cosmo = Cosmology::new(CosmologyParams::new(70.0, 1.0)).unwrap();
        for z in [0.05_f64, 0.3, 1.0, 3.0] {
            let expected = 2.0 * cosmo.hubble_distance() * (1.0 - 1.0 / (1.0 + z).sqrt());
            assert_relative_eq!(
                cosmo.comoving_distance(z).unwrap(),
                expected,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn test_comoving_distance_monotonic() {
        let cosmo = default_cosmo();
        assert_eq!(cosmo.comoving_distance(0.0).unwrap(), 0.0);

        let mut previous = 0.0;
        for i in 1..=2000 {
            let z = i as f64 * 0.005;
            let d = cosmo.comoving_distance(z).unwrap();
            assert!(d > previous, "D_C not increasing at z = {z}");
            previous = d;
        }
    }

    #[test]
    fn test_comoving_distance_deterministic() {
        let cosmo = default_cosmo();
        let first = cosmo.comoving_distance(0.123456).unwrap();
        for _ in 0..10 {
            assert_eq!(
                cosmo.comoving_distance(0.123456).unwrap().to_bits(),
                first.to_bits()
            );
        }
    }

    #[test]
    fn test_negative_redshift_is_domain_error() {
        let cosmo = default_cosmo();
        assert!(matches!(
            cosmo.comoving_distance(-0.01),
            Err(GnfError::Domain(_))
        ));
        assert!(matches!(
            cosmo.angular_diameter_distance(f64::INFINITY),
            Err(GnfError::Domain(_))
        ));
    }

    #[test]
    fn test_angular_diameter_distance() {
        let cosmo = default_cosmo();
        let z = 0.3;
        assert_relative_eq!(
            cosmo.angular_diameter_distance(z).unwrap(),
            cosmo.comoving_distance(z).unwrap() / 1.3,
            max_relative = 1e-15
        );
        assert_eq!(cosmo.angular_diameter_distance(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_velocity_diff() {
        let cosmo = default_cosmo();
        assert_eq!(cosmo.velocity_diff(0.1, 0.1), 0.0);
        assert_relative_eq!(
            cosmo.velocity_diff(0.1, 0.12),
            -0.02 * VLIGHT,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            cosmo.velocity_diff(0.12, 0.1).abs(),
            cosmo.velocity_diff(0.1, 0.12).abs(),
            max_relative = 1e-15
        );
        assert_relative_eq!(
            cosmo.redshift_window(3000.0),
            3000.0 / VLIGHT,
            max_relative = 1e-15
        );
    }
}
