//! # Neighbor search output
//!
//! A [`ResultTable`] holds one row per (target, neighbor) pair. Rows are grouped by target,
//! targets appear by ascending identifier and ranks ascend inside each group.
//!
//! ## Columns
//!
//! ```text
//! <all target columns> | <all reference columns> | velocity_diff_km_s | Rproj_kpc | Rproj_arcmin | proximity_score | neighbor_rank
//! ```
//!
//! The derived column names are fixed. A reference column whose name is already taken gets
//! a `_ref` suffix (`ra` → `ra_ref`), repeated until the name is free; a target column that
//! shadows a derived column gets `_target` the same way. Every output header is unique.
//!
//! ## Output
//!
//! * [`ResultTable::write_csv`] / [`ResultTable::to_csv_path`] write the table with the
//!   derived floats at a fixed precision; raw catalog values are copied verbatim.
//! * [`ResultTable::preview`] renders the first rows with `comfy-table` for logs.
//! * [`ResultTable::neighbor_count_stats`] summarizes how many neighbors targets received.

use std::{collections::HashSet, fmt, fs, io::Write, path::Path};

use ahash::RandomState;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::Itertools;

use super::candidate::NeighborCandidate;
use crate::{
    catalog::Catalog,
    constants::{ObjectId, OUTPUT_COLUMNS_ADDED},
    gnf_errors::GnfError,
};

/// Suffix appended to reference columns whose name is already taken.
pub const REFERENCE_SUFFIX: &str = "_ref";

/// Suffix appended to target columns that shadow a derived column.
pub const TARGET_SUFFIX: &str = "_target";

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    /// Raw values of the target's source row.
    pub target_columns: Vec<String>,
    /// Raw values of the reference's source row.
    pub reference_columns: Vec<String>,
    pub neighbor: NeighborCandidate,
}

/// Summary of the number of neighbors per target (targets with at least one neighbor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborCountStats {
    pub targets: usize,
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for NeighborCountStats {
    /// Compact by default; multi-line with the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Neighbors per target ({} targets)", self.targets)?;
            writeln!(f, "-------------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "targets={}, min={}, p25={}, median={}, p95={}, max={}",
                self.targets, self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    headers: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Assemble the table from ranked candidates.
    ///
    /// Arguments
    /// -----------------
    /// * `target`, `reference`: the catalogs the candidate indices point into.
    /// * `candidates`: ranked candidates, already grouped by target in output order.
    ///
    /// Return
    /// ----------
    /// * The table; with no candidates it only carries the header.
    pub fn new(target: &Catalog, reference: &Catalog, candidates: Vec<NeighborCandidate>) -> Self {
        let headers = output_headers(target.headers(), reference.headers());
        let rows = candidates
            .into_iter()
            .map(|neighbor| ResultRow {
                target_columns: target.records()[neighbor.target_index].columns.clone(),
                reference_columns: reference.records()[neighbor.reference_index]
                    .columns
                    .clone(),
                neighbor,
            })
            .collect();

        ResultTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the scored pairs, in table order.
    pub fn candidates(&self) -> impl Iterator<Item = &NeighborCandidate> {
        self.rows.iter().map(|r| &r.neighbor)
    }

    /// Rows grouped by target, in table order.
    pub fn groups(&self) -> Vec<(&ObjectId, &[ResultRow])> {
        self.rows
            .chunk_by(|a, b| a.neighbor.target_index == b.neighbor.target_index)
            .map(|group| (&group[0].neighbor.target_id, group))
            .collect()
    }

    /// Number of distinct targets with at least one neighbor.
    pub fn number_of_targets(&self) -> usize {
        self.rows
            .iter()
            .dedup_by(|a, b| a.neighbor.target_index == b.neighbor.target_index)
            .count()
    }

    /// Distribution of the group sizes, or `None` for an empty table.
    pub fn neighbor_count_stats(&self) -> Option<NeighborCountStats> {
        let mut counts: Vec<usize> = self
            .rows
            .iter()
            .chunk_by(|r| r.neighbor.target_index)
            .into_iter()
            .map(|(_, group)| group.count())
            .collect();
        if counts.is_empty() {
            return None;
        }

        counts.sort_unstable();

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            // Nearest-rank on [0, n-1]
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = counts.len();
        Some(NeighborCountStats {
            targets: n,
            min: counts[0],
            p25: counts[q_index(n, 0.25)],
            median: counts[q_index(n, 0.50)],
            p95: counts[q_index(n, 0.95)],
            max: counts[n - 1],
        })
    }

    /// Write the table as CSV.
    ///
    /// Arguments
    /// -----------------
    /// * `writer`: destination.
    /// * `float_precision`: number of decimals for the derived floating-point columns.
    pub fn write_csv<W: Write>(&self, writer: W, float_precision: usize) -> Result<(), GnfError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;

        for row in &self.rows {
            let n = &row.neighbor;
            let derived = [
                format!("{:.*}", float_precision, n.velocity_diff_km_s),
                format!("{:.*}", float_precision, n.r_proj_kpc),
                format!("{:.*}", float_precision, n.separation_arcmin),
                format!("{:.*}", float_precision, n.proximity_score),
                n.neighbor_rank.to_string(),
            ];
            csv_writer.write_record(
                row.target_columns
                    .iter()
                    .chain(row.reference_columns.iter())
                    .chain(derived.iter()),
            )?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to `path`, creating missing parent directories.
    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P, float_precision: usize) -> Result<(), GnfError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file), float_precision)
    }

    /// Display adaptor rendering the first `max_rows` rows.
    pub fn preview(&self, max_rows: usize) -> ResultPreview<'_> {
        ResultPreview {
            table: self,
            max_rows,
            precision: 3,
        }
    }
}

/// Target headers, reference headers, then the derived columns, all distinct.
fn output_headers(target: &[String], reference: &[String]) -> Vec<String> {
    let mut taken: HashSet<String, RandomState> = OUTPUT_COLUMNS_ADDED
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut headers =
        Vec::with_capacity(target.len() + reference.len() + OUTPUT_COLUMNS_ADDED.len());
    headers.extend(target.iter().map(|h| claim_header(h, TARGET_SUFFIX, &mut taken)));
    headers.extend(reference.iter().map(|h| claim_header(h, REFERENCE_SUFFIX, &mut taken)));
    headers.extend(OUTPUT_COLUMNS_ADDED.iter().map(|h| h.to_string()));
    headers
}

/// First of `name`, `name+suffix`, `name+suffix+suffix`, ... not yet in `taken`.
fn claim_header(name: &str, suffix: &str, taken: &mut HashSet<String, RandomState>) -> String {
    let mut header = name.to_string();
    while taken.contains(&header) {
        header.push_str(suffix);
    }
    taken.insert(header.clone());
    header
}

/// Borrowing table renderer returned by [`ResultTable::preview`].
///
/// Only identifiers and derived columns are shown; full rows go to the CSV.
pub struct ResultPreview<'a> {
    table: &'a ResultTable,
    max_rows: usize,
    precision: usize,
}

impl ResultPreview<'_> {
    /// Decimals of the floating-point columns (default 3).
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }
}

impl fmt::Display for ResultPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.precision;
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("target"),
            Cell::new("neighbor"),
            Cell::new("Δv [km/s]"),
            Cell::new("Rproj [kpc]"),
            Cell::new("Rproj [arcmin]"),
            Cell::new("score"),
            Cell::new("rank"),
        ]);

        for row in self.table.rows().iter().take(self.max_rows) {
            let n = &row.neighbor;
            table.add_row(Row::from(vec![
                Cell::new(&n.target_id).set_alignment(CellAlignment::Right),
                Cell::new(&n.reference_id).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.*}", dp, n.velocity_diff_km_s))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.*}", dp, n.r_proj_kpc)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.*}", dp, n.separation_arcmin))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.*}", dp, n.proximity_score))
                    .set_alignment(CellAlignment::Right),
                Cell::new(n.neighbor_rank).set_alignment(CellAlignment::Right),
            ]));
        }

        write!(f, "{table}")?;
        let hidden = self.table.len().saturating_sub(self.max_rows);
        if hidden > 0 {
            write!(f, "\n... {hidden} more rows")?;
        }
        Ok(())
    }
}
