use thiserror::Error;

#[derive(Error, Debug)]
pub enum GnfError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Redshift outside the cosmology domain: {0}")]
    Domain(String),

    #[error("Catalog record violates the data contract: {0}")]
    DataContract(String),

    #[error("Catalog validation failed: {0}")]
    Validation(String),

    #[error("{catalog} missing required column '{column}'. Available columns: {available:?}")]
    MissingColumn {
        catalog: String,
        column: String,
        available: Vec<String>,
    },

    #[error("Neighbor search interrupted after {processed}/{total} targets")]
    Interrupted { processed: usize, total: usize },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Error parsing configuration file: {0}")]
    ConfigParseError(#[from] toml::de::Error),
}

impl PartialEq for GnfError {
    fn eq(&self, other: &Self) -> bool {
        use GnfError::*;
        match (self, other) {
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (Domain(a), Domain(b)) => a == b,
            (DataContract(a), DataContract(b)) => a == b,
            (Validation(a), Validation(b)) => a == b,
            (
                MissingColumn {
                    catalog: c1,
                    column: k1,
                    available: a1,
                },
                MissingColumn {
                    catalog: c2,
                    column: k2,
                    available: a2,
                },
            ) => c1 == c2 && k1 == k2 && a1 == a2,
            (
                Interrupted {
                    processed: p1,
                    total: t1,
                },
                Interrupted {
                    processed: p2,
                    total: t2,
                },
            ) => p1 == p2 && t1 == t2,

            // Wrapped library errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ConfigParseError(_), ConfigParseError(_)) => true,

            _ => false,
        }
    }
}
