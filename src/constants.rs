//! # Constants and type definitions for GNF
//!
//! This module centralizes the **physical constants**, **search defaults**, **validation
//! ranges** and **common type definitions** used throughout the crate.
//!
//! ## Overview
//!
//! - Physical constants (speed of light) and unit conversions (degrees ↔ radians, Mpc ↔ kpc)
//! - Default cosmology (flat ΛCDM, H0 = 70, Ωm = 0.3)
//! - Default neighbor search constraints and their sanity caps
//! - Catalog range limits applied at load time
//! - The [`ObjectId`] identifier shared by both catalogs

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Radians → arcminutes
pub const RAD2ARCMIN: f64 = 180.0 * 60.0 / std::f64::consts::PI;

/// Kiloparsecs in one megaparsec
pub const KPC_PER_MPC: f64 = 1000.0;

// -------------------------------------------------------------------------------------------------
// Cosmology defaults
// -------------------------------------------------------------------------------------------------

/// Hubble constant in km/s/Mpc
pub const HUBBLE_CONSTANT: f64 = 70.0;

/// Matter density parameter Ωm (flat model: ΩΛ = 1 − Ωm)
pub const MATTER_DENSITY: f64 = 0.3;

// -------------------------------------------------------------------------------------------------
// Neighbor search defaults
// -------------------------------------------------------------------------------------------------

pub const DEFAULT_MAX_NEIGHBORS: usize = 500;

/// Maximum projected physical separation (kpc)
pub const DEFAULT_R_PROJ_MAX_KPC: f64 = 5000.0;

/// Maximum line-of-sight velocity difference (km/s)
pub const DEFAULT_VEL_DIFF_MAX_KMS: f64 = 3000.0;

/// Drop references sitting exactly on the target (distance 0 in comoving space)
pub const DEFAULT_EXCLUDE_COINCIDENT: bool = true;

/// Upper sanity cap for `r_proj_max` (kpc)
pub const MAX_SEPARATION_KPC: f64 = 100_000.0;

/// Upper sanity cap for `vel_diff_max` (km/s, about c/3)
pub const MAX_VEL_DIFF_KMS: f64 = 100_000.0;

/// Weight of the normalized projected separation in the proximity score
pub const RPROJ_WEIGHT: f64 = 0.5;

/// Weight of the normalized velocity difference in the proximity score
pub const VEL_DIFF_WEIGHT: f64 = 0.5;

// -------------------------------------------------------------------------------------------------
// Catalog validation ranges
// -------------------------------------------------------------------------------------------------

pub const MIN_REDSHIFT: f64 = 0.0;
pub const MAX_REDSHIFT: f64 = 10.0;

pub const MIN_RA: Degree = 0.0;
pub const MAX_RA: Degree = 360.0;
pub const MIN_DEC: Degree = -90.0;
pub const MAX_DEC: Degree = 90.0;

// -------------------------------------------------------------------------------------------------
// Output
// -------------------------------------------------------------------------------------------------

pub const OUTPUT_FLOAT_PRECISION: usize = 6;

/// Number of result rows echoed to the log after a search
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Derived columns appended to every output row, in order.
pub const OUTPUT_COLUMNS_ADDED: [&str; 5] = [
    "velocity_diff_km_s",
    "Rproj_kpc",
    "Rproj_arcmin",
    "proximity_score",
    "neighbor_rank",
];

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in megaparsecs
pub type Mpc = f64;
/// Distance in kiloparsecs
pub type Kpc = f64;
/// Velocity in km/s
pub type KmPerSec = f64;
/// Dimensionless cosmological redshift
pub type Redshift = f64;

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Identifier of a catalog object.
///
/// Survey identifiers are either integers (e.g. SDSS `objID`, NYU `nyuID`) or free-form
/// designations. Integers order before strings so that mixed catalogs still rank
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectId {
    Int(i64),
    String(String),
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectId::Int(n) => write!(f, "{n}"),
            ObjectId::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ObjectId {
    fn from(n: i64) -> Self {
        ObjectId::Int(n)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        ObjectId::String(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        ObjectId::String(s.to_string())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = std::convert::Infallible;

    /// Parse an identifier from a CSV cell.
    /// - Optional sign followed by digits (fitting in `i64`) → `Int`
    /// - Anything else (trimmed) → `String`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) => Ok(ObjectId::Int(n)),
            Err(_) => Ok(ObjectId::String(s.to_string())),
        }
    }
}

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_object_id_parse() {
        let parse = |s: &str| s.parse::<ObjectId>().unwrap();
        assert_eq!(parse("1237648720693755918"), ObjectId::Int(1237648720693755918));
        assert_eq!(parse(" 42 "), ObjectId::Int(42));
        assert_eq!(parse("-7"), ObjectId::Int(-7));
        assert_eq!(parse("NGC 4472"), ObjectId::from("NGC 4472"));
    }

    #[test]
    fn test_object_id_ordering() {
        let mut ids = vec![
            ObjectId::from("b"),
            ObjectId::Int(10),
            ObjectId::from("a"),
            ObjectId::Int(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ObjectId::Int(2),
                ObjectId::Int(10),
                ObjectId::from("a"),
                ObjectId::from("b"),
            ]
        );
    }

    #[test]
    fn test_score_weights_sum_to_one() {
        assert!((RPROJ_WEIGHT + VEL_DIFF_WEIGHT - 1.0).abs() < 1e-12);
    }
}
