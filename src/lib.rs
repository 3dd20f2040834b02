pub mod catalog;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod cosmology;
pub mod gnf_errors;
pub mod neighbor_finder;
#[cfg(feature = "progress")]
pub mod progress_bar;
pub mod projection;
pub mod spatial_index;

pub use catalog::{Catalog, CatalogRecord, ColumnMapping};
pub use cosmology::{Cosmology, CosmologyParams};
pub use gnf_errors::GnfError;
pub use neighbor_finder::{
    finder::NeighborFinder, result_table::ResultTable, NeighborSearchParams,
};
