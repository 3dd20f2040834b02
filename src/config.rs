//! # Run configuration
//!
//! [`GnfConfig`] gathers everything a `gnf-finder` run needs besides the three paths:
//! column mappings of both catalogs, search constraints, cosmology, output formatting and
//! logging. It is read from TOML; every section and every key is optional and falls back
//! to the defaults below.
//!
//! ```toml
//! [catalogs.target.column_mapping]
//! ra = "RAgal"
//! dec = "DECgal"
//! redshift = "zgal"
//! id = "nyuID"
//!
//! [catalogs.reference.column_mapping]
//! ra = "galaxy_ra_deg"
//! dec = "galaxy_dec_deg"
//! redshift = "galaxy_z_CMB"
//! id = "objID"
//!
//! [neighbor_search]
//! max_neighbors = 500
//! r_proj_max_kpc = 5000.0
//! vel_diff_max_kms = 3000.0
//! exclude_coincident = true
//!
//! [cosmology]
//! h0 = 70.0
//! om0 = 0.3
//!
//! [output]
//! float_precision = 6
//! preview_rows = 20
//!
//! [logging]
//! level = "INFO"
//! # log_file = "gnf.log"
//! ```
//!
//! A column mapping table, when present, must name all four columns.
//! Command-line values are merged with [`GnfConfig::apply_overrides`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::{
    catalog::ColumnMapping,
    constants::{
        KmPerSec, Kpc, DEFAULT_EXCLUDE_COINCIDENT, DEFAULT_MAX_NEIGHBORS, DEFAULT_PREVIEW_ROWS,
        DEFAULT_R_PROJ_MAX_KPC, DEFAULT_VEL_DIFF_MAX_KMS, OUTPUT_FLOAT_PRECISION,
    },
    cosmology::CosmologyParams,
    gnf_errors::GnfError,
    neighbor_finder::NeighborSearchParams,
};

/// Largest number of decimals accepted for output floats.
const MAX_FLOAT_PRECISION: usize = 17;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GnfConfig {
    pub catalogs: CatalogsConfig,
    pub neighbor_search: NeighborSearchConfig,
    pub cosmology: CosmologyParams,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogsConfig {
    pub target: CatalogConfig,
    pub reference: CatalogConfig,
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        CatalogsConfig {
            target: CatalogConfig {
                column_mapping: ColumnMapping::rqe(),
            },
            reference: CatalogConfig {
                column_mapping: ColumnMapping::sdss(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub column_mapping: ColumnMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborSearchConfig {
    pub max_neighbors: usize,
    pub r_proj_max_kpc: Kpc,
    pub vel_diff_max_kms: KmPerSec,
    pub exclude_coincident: bool,
}

impl Default for NeighborSearchConfig {
    fn default() -> Self {
        NeighborSearchConfig {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            r_proj_max_kpc: DEFAULT_R_PROJ_MAX_KPC,
            vel_diff_max_kms: DEFAULT_VEL_DIFF_MAX_KMS,
            exclude_coincident: DEFAULT_EXCLUDE_COINCIDENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Decimals written for the derived floating-point columns.
    pub float_precision: usize,
    /// Result rows echoed to the log after the search.
    pub preview_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            float_precision: OUTPUT_FLOAT_PRECISION,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `DEBUG`, `INFO`, `WARNING` or `ERROR` (case-insensitive).
    pub level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "INFO".into(),
            log_file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, GnfError> {
        parse_log_level(&self.level)
    }
}

/// Map a log level name onto a [`LevelFilter`].
///
/// Accepts `DEBUG`, `INFO`, `WARNING` (or `WARN`) and `ERROR`, in any case.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, GnfError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => Ok(LevelFilter::DEBUG),
        "INFO" => Ok(LevelFilter::INFO),
        "WARNING" | "WARN" => Ok(LevelFilter::WARN),
        "ERROR" => Ok(LevelFilter::ERROR),
        _ => Err(GnfError::InvalidConfiguration(format!(
            "unknown log level '{level}', expected DEBUG, INFO, WARNING or ERROR"
        ))),
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub max_neighbors: Option<usize>,
    pub r_proj_max_kpc: Option<Kpc>,
    pub vel_diff_max_kms: Option<KmPerSec>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl GnfConfig {
    /// Read and validate a TOML configuration file.
    ///
    /// Return
    /// ----------
    /// * The configuration, [`GnfError::IoError`] if the file cannot be read,
    ///   [`GnfError::ConfigParseError`] for malformed TOML, or
    ///   [`GnfError::InvalidConfiguration`] for out-of-range values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GnfError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, GnfError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section; the first problem found is returned.
    pub fn validate(&self) -> Result<(), GnfError> {
        self.cosmology.validate()?;
        self.search_params()?;
        if self.output.float_precision > MAX_FLOAT_PRECISION {
            return Err(GnfError::InvalidConfiguration(format!(
                "float_precision must be at most {MAX_FLOAT_PRECISION}, got {}",
                self.output.float_precision
            )));
        }
        self.logging.level_filter()?;
        Ok(())
    }

    /// Replace configured values by the ones present in `overrides`.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.max_neighbors {
            self.neighbor_search.max_neighbors = v;
        }
        if let Some(v) = overrides.r_proj_max_kpc {
            self.neighbor_search.r_proj_max_kpc = v;
        }
        if let Some(v) = overrides.vel_diff_max_kms {
            self.neighbor_search.vel_diff_max_kms = v;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &overrides.log_file {
            self.logging.log_file = Some(file.clone());
        }
    }

    /// Validated search parameters built from `[neighbor_search]` (default score weights).
    pub fn search_params(&self) -> Result<NeighborSearchParams, GnfError> {
        let s = &self.neighbor_search;
        NeighborSearchParams::builder()
            .max_neighbors(s.max_neighbors)
            .r_proj_max_kpc(s.r_proj_max_kpc)
            .vel_diff_max_kms(s.vel_diff_max_kms)
            .exclude_coincident(s.exclude_coincident)
            .build()
    }
}
