//! Range and uniqueness checks applied to freshly loaded catalogs.
//!
//! * RA in `[0, 360]` degrees, DEC in `[-90, 90]` degrees,
//! * redshift in `[MIN_REDSHIFT, MAX_REDSHIFT]`,
//! * identifiers unique within the catalog.
//!
//! Range failures report the offending extreme value, e.g.
//! `RQE redshift contains values below 0. Found minimum: -0.1`.

use std::collections::HashSet;

use ahash::RandomState;

use crate::{
    catalog::{Catalog, CatalogRecord},
    constants::{MAX_DEC, MAX_RA, MAX_REDSHIFT, MIN_DEC, MIN_RA, MIN_REDSHIFT},
    gnf_errors::GnfError,
};

/// Run every check of this module on `catalog`.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), GnfError> {
    validate_coordinates(catalog.records(), catalog.name())?;
    validate_redshifts(
        catalog.records(),
        MIN_REDSHIFT,
        MAX_REDSHIFT,
        &format!("{} redshift", catalog.name()),
    )?;
    validate_unique_ids(catalog)
}

fn extremes(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// RA/DEC ranges; NaN values are rejected as well.
pub fn validate_coordinates(records: &[CatalogRecord], name: &str) -> Result<(), GnfError> {
    if records.iter().any(|r| r.ra.is_nan() || r.dec.is_nan()) {
        return Err(GnfError::Validation(format!(
            "{name} contains NaN coordinates"
        )));
    }

    let (ra_min, ra_max) = extremes(records.iter().map(|r| r.ra));
    if ra_min < MIN_RA || ra_max > MAX_RA {
        return Err(GnfError::Validation(format!(
            "{name} RA values out of range [{MIN_RA}, {MAX_RA}]. Found: [{ra_min}, {ra_max}]"
        )));
    }

    let (dec_min, dec_max) = extremes(records.iter().map(|r| r.dec));
    if dec_min < MIN_DEC || dec_max > MAX_DEC {
        return Err(GnfError::Validation(format!(
            "{name} DEC values out of range [{MIN_DEC}, {MAX_DEC}]. Found: [{dec_min}, {dec_max}]"
        )));
    }
    Ok(())
}

pub fn validate_redshifts(
    records: &[CatalogRecord],
    min_z: f64,
    max_z: f64,
    name: &str,
) -> Result<(), GnfError> {
    if records.iter().any(|r| r.redshift.is_nan()) {
        return Err(GnfError::Validation(format!("{name} contains NaN values")));
    }

    let (z_min, z_max) = extremes(records.iter().map(|r| r.redshift));
    if z_min < min_z {
        return Err(GnfError::Validation(format!(
            "{name} contains values below {min_z}. Found minimum: {z_min}"
        )));
    }
    if z_max > max_z {
        return Err(GnfError::Validation(format!(
            "{name} contains values above {max_z}. Found maximum: {z_max}"
        )));
    }
    Ok(())
}

/// Identifiers must be unique; the first duplicate found is reported.
pub fn validate_unique_ids(catalog: &Catalog) -> Result<(), GnfError> {
    let mut seen: HashSet<_, RandomState> =
        HashSet::with_capacity_and_hasher(catalog.len(), RandomState::new());
    for rec in catalog.records() {
        if !seen.insert(&rec.id) {
            return Err(GnfError::DataContract(format!(
                "{} contains duplicate identifier '{}'",
                catalog.name(),
                rec.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod validation_test {
    use super::*;

    fn catalog(records: Vec<CatalogRecord>) -> Catalog {
        Catalog::from_records("Test", records)
    }

    #[test]
    fn test_valid_catalog() {
        let cat = catalog(vec![
            CatalogRecord::new(1_i64, 0.0, -90.0, 0.0),
            CatalogRecord::new(2_i64, 360.0, 90.0, 10.0),
        ]);
        assert!(validate_catalog(&cat).is_ok());
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let cat = catalog(vec![CatalogRecord::new(1_i64, 361.0, 0.0, 0.1)]);
        assert!(matches!(validate_catalog(&cat), Err(GnfError::Validation(_))));

        let cat = catalog(vec![CatalogRecord::new(1_i64, 10.0, -90.5, 0.1)]);
        assert!(matches!(validate_catalog(&cat), Err(GnfError::Validation(_))));

        let cat = catalog(vec![CatalogRecord::new(1_i64, f64::NAN, 0.0, 0.1)]);
        assert!(matches!(validate_catalog(&cat), Err(GnfError::Validation(_))));
    }

    #[test]
    fn test_redshift_range_message() {
        let cat = catalog(vec![
            CatalogRecord::new(1_i64, 100.0, 20.0, -0.1),
            CatalogRecord::new(2_i64, 150.0, 30.0, 0.2),
        ]);
        assert_eq!(
            validate_catalog(&cat),
            Err(GnfError::Validation(
                "Test redshift contains values below 0. Found minimum: -0.1".into()
            ))
        );

        let cat = catalog(vec![CatalogRecord::new(1_i64, 100.0, 20.0, 12.0)]);
        assert!(matches!(validate_catalog(&cat), Err(GnfError::Validation(_))));
    }

    #[test]
    fn test_duplicate_ids() {
        let cat = catalog(vec![
            CatalogRecord::new(7_i64, 100.0, 20.0, 0.1),
            CatalogRecord::new(7_i64, 101.0, 21.0, 0.2),
        ]);
        assert_eq!(
            validate_catalog(&cat),
            Err(GnfError::DataContract(
                "Test contains duplicate identifier '7'".into()
            ))
        );
    }
}
