//! Angular helpers shared by the projector and the narrow-phase separation check.

use nalgebra::Vector3;

use crate::constants::{Degree, Radian, RADEG};

/// Unit direction vector pointing at an equatorial position.
///
/// Arguments
/// ---------
/// * `ra`: right ascension in degrees
/// * `dec`: declination in degrees
///
/// Returns
/// -------
/// * `Vector3<f64>`: `(cos δ cos α, cos δ sin α, sin δ)`. Poles give `(≈0, ≈0, ±1)`.
pub(crate) fn radec_to_unit_vector(ra: Degree, dec: Degree) -> Vector3<f64> {
    let (sin_ra, cos_ra) = (ra * RADEG).sin_cos();
    let (sin_dec, cos_dec) = (dec * RADEG).sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Great-circle separation between two equatorial positions (haversine formula).
///
/// Well conditioned for the small separations the neighbor search cares about.
/// The result lies in `[0, π]` and does not depend on which side of the RA = 0/360
/// seam the two positions sit.
pub fn angular_separation(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> Radian {
    let dec1 = dec1 * RADEG;
    let dec2 = dec2 * RADEG;
    let half_ddec = 0.5 * (dec2 - dec1);
    let half_dra = 0.5 * (ra2 - ra1) * RADEG;

    let h = half_ddec.sin().powi(2) + dec1.cos() * dec2.cos() * half_dra.sin().powi(2);
    2.0 * h.sqrt().clamp(0.0, 1.0).asin()
}
