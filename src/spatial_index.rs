//! # Static 3-d tree for radius queries
//!
//! The reference catalog is indexed once by [`KdTree::new`] and then queried read-only,
//! possibly from several threads at the same time (`KdTree` is `Sync`).
//!
//! ## Layout
//!
//! The tree is **implicit**: points are permuted in place so that, for every range
//! `[lo, hi)` larger than a leaf, the median slot `mid = lo + (hi − lo) / 2` holds the
//! splitting point, `[lo, mid)` lies on the low side of the split and `(mid, hi)` on the
//! high side. The split axis of each median slot is stored alongside it; it is the axis
//! with the largest extent of the range. Ranges of at most [`LEAF_SIZE`] points are
//! scanned linearly.
//!
//! ## Queries
//!
//! [`KdTree::query_radius`] returns every point with `distance ≤ radius`, sorted by
//! ascending distance, ties broken by ascending original index. An empty vector is a
//! valid answer.

use std::cmp::Ordering;

use nalgebra::Vector3;

use crate::constants::Mpc;

/// Maximum number of points scanned linearly instead of being split further.
pub const LEAF_SIZE: usize = 30;

/// A point returned by a radius query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusHit {
    /// Index of the point in the slice passed to [`KdTree::new`].
    pub index: usize,
    /// Euclidean distance to the query center.
    pub distance: Mpc,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    point: Vector3<f64>,
    index: usize,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    entries: Vec<Entry>,
    split_axis: Vec<u8>,
}

impl KdTree {
    /// Build the tree over `points`; the original positions are remembered as indices.
    pub fn new(points: &[Vector3<f64>]) -> Self {
        let mut entries: Vec<Entry> = points
            .iter()
            .enumerate()
            .map(|(index, point)| Entry {
                point: *point,
                index,
            })
            .collect();
        let mut split_axis = vec![0u8; entries.len()];

        Self::build_recursive(&mut entries, &mut split_axis);

        KdTree {
            entries,
            split_axis,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All points within `radius` of `center`, ascending by distance.
    ///
    /// Arguments
    /// -----------------
    /// * `center`: query position (same frame and units as the indexed points).
    /// * `radius`: inclusive search radius. Negative or NaN radii match nothing.
    ///
    /// Return
    /// ----------
    /// * A vector of [`RadiusHit`], sorted by `(distance, index)`.
    pub fn query_radius(&self, center: &Vector3<f64>, radius: Mpc) -> Vec<RadiusHit> {
        let mut hits = Vec::new();
        self.query_radius_into(center, radius, &mut hits);
        hits
    }

    /// Same as [`KdTree::query_radius`], reusing the caller's buffer (cleared first).
    pub fn query_radius_into(&self, center: &Vector3<f64>, radius: Mpc, out: &mut Vec<RadiusHit>) {
        out.clear();
        if !(radius >= 0.0) || self.entries.is_empty() {
            return;
        }

        let r2 = radius * radius;
        self.search_recursive(0, self.entries.len(), center, r2, out);

        for hit in out.iter_mut() {
            hit.distance = hit.distance.sqrt();
        }
        out.sort_unstable_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    fn build_recursive(entries: &mut [Entry], split_axis: &mut [u8]) {
        let n = entries.len();
        if n <= LEAF_SIZE {
            return;
        }

        let axis = Self::widest_axis(entries);
        let mid = n / 2;
        entries.select_nth_unstable_by(mid, |a, b| a.point[axis].total_cmp(&b.point[axis]));
        split_axis[mid] = axis as u8;

        let (left, rest) = entries.split_at_mut(mid);
        let (left_axis, rest_axis) = split_axis.split_at_mut(mid);
        Self::build_recursive(left, left_axis);
        Self::build_recursive(&mut rest[1..], &mut rest_axis[1..]);
    }

    fn widest_axis(entries: &[Entry]) -> usize {
        let mut lo = entries[0].point;
        let mut hi = entries[0].point;
        for e in &entries[1..] {
            lo = lo.inf(&e.point);
            hi = hi.sup(&e.point);
        }
        let extent = hi - lo;
        (0..3)
            .max_by(|&a, &b| extent[a].partial_cmp(&extent[b]).unwrap_or(Ordering::Equal))
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------------

    /// Collect squared distances; the caller takes the square roots.
    fn search_recursive(
        &self,
        lo: usize,
        hi: usize,
        center: &Vector3<f64>,
        r2: f64,
        out: &mut Vec<RadiusHit>,
    ) {
        let n = hi - lo;
        if n <= LEAF_SIZE {
            for e in &self.entries[lo..hi] {
                let d2 = (e.point - center).norm_squared();
                if d2 <= r2 {
                    out.push(RadiusHit {
                        index: e.index,
                        distance: d2,
                    });
                }
            }
            return;
        }

        let mid = lo + n / 2;
        let axis = self.split_axis[mid] as usize;
        let pivot = &self.entries[mid];

        let d2 = (pivot.point - center).norm_squared();
        if d2 <= r2 {
            out.push(RadiusHit {
                index: pivot.index,
                distance: d2,
            });
        }

        let diff = center[axis] - pivot.point[axis];
        let (near, far) = if diff <= 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search_recursive(near.0, near.1, center, r2, out);
        if diff * diff <= r2 {
            self.search_recursive(far.0, far.1, center, r2, out);
        }
    }
}

#[cfg(test)]
mod spatial_index_test {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Vec<Vector3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Vector3::new(
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                )
            })
            .collect()
    }

    fn brute_force(points: &[Vector3<f64>], center: &Vector3<f64>, radius: f64) -> Vec<usize> {
        let mut hits: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| ((p - center).norm(), i))
            .filter(|(d, _)| *d <= radius)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter().map(|(_, i)| i).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::new(&[]);
        assert!(tree.is_empty());
        assert!(tree.query_radius(&Vector3::zeros(), 10.0).is_empty());
    }

    #[test]
    fn test_matches_brute_force() {
        let points = random_points(2_000, 7);
        let tree = KdTree::new(&points);
        assert_eq!(tree.len(), 2_000);

        let centers = random_points(50, 11);
        for center in &centers {
            for radius in [0.0, 5.0, 20.0, 60.0] {
                let got: Vec<usize> = tree
                    .query_radius(center, radius)
                    .into_iter()
                    .map(|h| h.index)
                    .collect();
                assert_eq!(got, brute_force(&points, center, radius));
            }
        }
    }

    #[test]
    fn test_sorted_ascending_and_inclusive() {
        let points = vec![
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.0, 0.0, 5.0),
        ];
        let tree = KdTree::new(&points);
        let hits = tree.query_radius(&Vector3::zeros(), 3.0);
        let idx: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(idx, vec![1, 2, 0]);
        assert_eq!(hits[2].distance, 3.0);
    }

    #[test]
    fn test_no_points_in_range() {
        let points = random_points(100, 3);
        let tree = KdTree::new(&points);
        let far = Vector3::new(1e6, 1e6, 1e6);
        assert!(tree.query_radius(&far, 1.0).is_empty());
        assert!(tree.query_radius(&points[0], -1.0).is_empty());
        assert!(tree.query_radius(&points[0], f64::NAN).is_empty());
    }

    #[test]
    fn test_duplicate_points_tie_break_by_index() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        let points = vec![p; 100];
        let tree = KdTree::new(&points);
        let idx: Vec<usize> = tree
            .query_radius(&p, 0.0)
            .into_iter()
            .map(|h| h.index)
            .collect();
        assert_eq!(idx, (0..100).collect::<Vec<_>>());
    }
}
