#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gnf::{
    conversion::angular_separation,
    neighbor_finder::result_table::ResultTable,
    Catalog, CatalogRecord, CosmologyParams, NeighborFinder, NeighborSearchParams,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Catalog of `n` objects scattered uniformly in a sky patch and redshift slice.
pub fn random_catalog(
    name: &str,
    n: usize,
    first_id: i64,
    seed: u64,
    ra: (f64, f64),
    dec: (f64, f64),
    z: (f64, f64),
) -> Catalog {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..n)
        .map(|i| {
            CatalogRecord::new(
                first_id + i as i64,
                rng.random_range(ra.0..ra.1),
                rng.random_range(dec.0..dec.1),
                rng.random_range(z.0..z.1),
            )
        })
        .collect();
    Catalog::from_records(name, records)
}

pub fn finder(target: Vec<CatalogRecord>, reference: Vec<CatalogRecord>) -> NeighborFinder {
    NeighborFinder::new(
        Catalog::from_records("Target", target),
        Catalog::from_records("Reference", reference),
        CosmologyParams::default(),
    )
    .unwrap()
}

/// Exhaustive narrow-phase acceptance: `(target index, reference index)` pairs.
pub fn brute_force_pairs(finder: &NeighborFinder, params: &NeighborSearchParams) -> Vec<(usize, usize)> {
    let cosmo = finder.cosmology();
    let mut pairs = Vec::new();
    for (i, t) in finder.target().records().iter().enumerate() {
        let d_a = cosmo.angular_diameter_distance(t.redshift).unwrap();
        for (j, r) in finder.reference().records().iter().enumerate() {
            if params.exclude_coincident
                && finder.target_points()[i] == finder.reference_points()[j]
            {
                continue;
            }
            let r_proj = angular_separation(t.ra, t.dec, r.ra, r.dec) * d_a * 1000.0;
            let dv = cosmo.velocity_diff(t.redshift, r.redshift);
            if r_proj <= params.r_proj_max_kpc && dv.abs() <= params.vel_diff_max_kms {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Properties every result table must satisfy.
pub fn assert_table_invariants(table: &ResultTable, params: &NeighborSearchParams) {
    let mut previous_target = None;
    for (target_id, rows) in table.groups() {
        if let Some(prev) = previous_target {
            assert!(prev < target_id, "targets not in ascending order");
        }
        previous_target = Some(target_id);

        assert!(rows.len() <= params.max_neighbors);
        for (k, row) in rows.iter().enumerate() {
            let n = &row.neighbor;
            assert_eq!(n.neighbor_rank, k + 1, "ranks must be contiguous from 1");
            assert!(n.r_proj_kpc <= params.r_proj_max_kpc);
            assert!(n.velocity_diff_km_s.abs() <= params.vel_diff_max_kms);
            assert!((0.0..=1.0).contains(&n.proximity_score));
            if k > 0 {
                assert!(rows[k - 1].neighbor.proximity_score >= n.proximity_score);
            }
        }
    }
}

/// Number of rows per target id.
pub fn rows_per_target(table: &ResultTable) -> HashMap<String, usize> {
    table
        .groups()
        .into_iter()
        .map(|(id, rows)| (id.to_string(), rows.len()))
        .collect()
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
