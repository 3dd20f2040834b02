//! CSV loading for [`Catalog`].
//!
//! The header row is matched against a [`ColumnMapping`]; a missing mapped column is a
//! [`GnfError::MissingColumn`] listing the available headers. Every row is then parsed
//! into a [`CatalogRecord`] and the full catalog goes through
//! [`validate_catalog`](super::validation::validate_catalog).

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{error, info};

use super::{validation::validate_catalog, Catalog, CatalogRecord, ColumnMapping};
use crate::{constants::ObjectId, gnf_errors::GnfError};

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResolvedColumns {
    ra: usize,
    dec: usize,
    redshift: usize,
    id: usize,
}

impl ResolvedColumns {
    fn resolve(headers: &[String], mapping: &ColumnMapping, name: &str) -> Result<Self, GnfError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| GnfError::MissingColumn {
                    catalog: name.to_string(),
                    column: column.to_string(),
                    available: headers.to_vec(),
                })
        };

        Ok(ResolvedColumns {
            ra: find(&mapping.ra)?,
            dec: find(&mapping.dec)?,
            redshift: find(&mapping.redshift)?,
            id: find(&mapping.id)?,
        })
    }
}

impl Catalog {
    /// Load and validate a catalog from a CSV file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: CSV file with a header row.
    /// * `name`: label used in logs and error messages.
    /// * `mapping`: which headers hold RA, DEC, redshift and the identifier.
    ///
    /// Return
    /// ----------
    /// * The validated [`Catalog`], or a [`GnfError`] describing the first problem found.
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        name: &str,
        mapping: &ColumnMapping,
    ) -> Result<Catalog, GnfError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GnfError::Validation(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let file = File::open(path)?;
        let catalog = Catalog::from_csv_reader(file, name, mapping)?;
        info!(
            "Loaded {} with {} objects from {}",
            name,
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Same as [`Catalog::from_csv_path`] for any reader.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        name: &str,
        mapping: &ColumnMapping,
    ) -> Result<Catalog, GnfError> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let columns = ResolvedColumns::resolve(&headers, mapping, name)?;

        let mut records = Vec::new();
        for (row, result) in csv_reader.records().enumerate() {
            let raw = result?;
            records.push(parse_record(&raw, &columns, &headers, name, row + 1)?);
        }

        if records.is_empty() {
            return Err(GnfError::Validation(format!("{name} CSV file is empty")));
        }

        let catalog = Catalog::new(name, headers, records);
        if let Err(e) = validate_catalog(&catalog) {
            error!("{name} validation failed: {e}");
            return Err(e);
        }
        info!("{name} validation passed");
        Ok(catalog)
    }
}

fn parse_record(
    raw: &StringRecord,
    columns: &ResolvedColumns,
    headers: &[String],
    name: &str,
    row: usize,
) -> Result<CatalogRecord, GnfError> {
    let number = |idx: usize| -> Result<f64, GnfError> {
        let cell = raw.get(idx).unwrap_or("");
        cell.parse::<f64>().map_err(|_| {
            GnfError::Validation(format!(
                "{name} row {row}: column '{}' value '{cell}' is not a number",
                headers[idx]
            ))
        })
    };

    let id_cell = raw.get(columns.id).unwrap_or("");
    if id_cell.is_empty() {
        return Err(GnfError::DataContract(format!(
            "{name} row {row}: empty identifier in column '{}'",
            headers[columns.id]
        )));
    }
    let id: ObjectId = match id_cell.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    };

    Ok(CatalogRecord {
        id,
        ra: number(columns.ra)?,
        dec: number(columns.dec)?,
        redshift: number(columns.redshift)?,
        columns: raw.iter().map(str::to_string).collect(),
    })
}
