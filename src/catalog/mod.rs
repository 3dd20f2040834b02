//! # Galaxy catalogs
//!
//! A [`Catalog`] is the fixed, typed view of one input table: every row becomes a
//! [`CatalogRecord`] carrying the numeric RA, DEC, redshift and identifier needed by the
//! neighbor search, plus the raw text of **all** original columns so that they can be
//! copied verbatim into the result table.
//!
//! Column names differ between surveys. A [`ColumnMapping`] tells the loader which
//! header holds each required quantity; it is resolved **once**, when the CSV is read,
//! so the search itself never looks anything up by name.
//!
//! ## Loading
//!
//! ```rust,no_run
//! use gnf::catalog::{Catalog, ColumnMapping};
//!
//! let rqe = Catalog::from_csv_path("rqe.csv", "RQE", &ColumnMapping::rqe())?;
//! let sdss = Catalog::from_csv_path("sdss.csv", "SDSS", &ColumnMapping::sdss())?;
//! println!("{} targets, {} references", rqe.len(), sdss.len());
//! # Ok::<(), gnf::gnf_errors::GnfError>(())
//! ```
//!
//! Loading validates coordinate and redshift ranges and identifier uniqueness
//! (see [`validation`]).
//!
//! ## In-memory catalogs
//!
//! [`Catalog::from_records`] builds a catalog from records created with
//! [`CatalogRecord::new`]; the header is then `id, ra, dec, redshift`.

pub mod csv_reader;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::constants::{Degree, ObjectId, Redshift};

/// Names of the columns holding the quantities required by the neighbor search.
///
/// When read from a configuration file all four names must be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub ra: String,
    pub dec: String,
    pub redshift: String,
    pub id: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping {
            ra: "ra".into(),
            dec: "dec".into(),
            redshift: "redshift".into(),
            id: "id".into(),
        }
    }
}

impl ColumnMapping {
    /// NYU-VAGC based RQE galaxy sample.
    pub fn rqe() -> Self {
        ColumnMapping {
            ra: "RAgal".into(),
            dec: "DECgal".into(),
            redshift: "zgal".into(),
            id: "nyuID".into(),
        }
    }

    /// SDSS spectroscopic galaxies (CMB-frame redshifts).
    pub fn sdss() -> Self {
        ColumnMapping {
            ra: "galaxy_ra_deg".into(),
            dec: "galaxy_dec_deg".into(),
            redshift: "galaxy_z_CMB".into(),
            id: "objID".into(),
        }
    }
}

/// One catalog object.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub id: ObjectId,
    pub ra: Degree,
    pub dec: Degree,
    pub redshift: Redshift,
    /// Raw values of every column of the source row, in header order.
    pub columns: Vec<String>,
}

impl CatalogRecord {
    /// Record whose raw columns are `id, ra, dec, redshift`.
    pub fn new(id: impl Into<ObjectId>, ra: Degree, dec: Degree, redshift: Redshift) -> Self {
        let id = id.into();
        let columns = vec![
            id.to_string(),
            ra.to_string(),
            dec.to_string(),
            redshift.to_string(),
        ];
        CatalogRecord {
            id,
            ra,
            dec,
            redshift,
            columns,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    headers: Vec<String>,
    records: Vec<CatalogRecord>,
}

impl Catalog {
    /// Assemble a catalog from already parsed parts.
    ///
    /// No validation happens here; [`validation::validate_catalog`] and the neighbor
    /// finder check the records before use.
    pub fn new(name: impl Into<String>, headers: Vec<String>, records: Vec<CatalogRecord>) -> Self {
        Catalog {
            name: name.into(),
            headers,
            records,
        }
    }

    /// In-memory catalog whose records were built with [`CatalogRecord::new`].
    pub fn from_records(name: impl Into<String>, records: Vec<CatalogRecord>) -> Self {
        let mapping = ColumnMapping::default();
        let headers = vec![mapping.id, mapping.ra, mapping.dec, mapping.redshift];
        Catalog::new(name, headers, records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Catalog(name='{}', objects={})", self.name, self.len())
    }
}
