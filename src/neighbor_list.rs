//! Finalized bond storage.

use crate::error::LocalityError;
use crate::types::NeighborBond;

/// A list of finalized neighbor bonds.
///
/// Bonds are stored as produced; [`NeighborList::sort`] puts them in
/// `(query_point, point)` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborList {
    bonds: Vec<NeighborBond>,
}

impl NeighborList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bonds(bonds: Vec<NeighborBond>) -> Self {
        Self { bonds }
    }

    /// Build from parallel arrays. `weights` may be `None` (all weights 1).
    pub fn from_arrays(
        query_points: &[usize],
        points: &[usize],
        distances: &[f32],
        weights: Option<&[f32]>,
    ) -> Result<Self, LocalityError> {
        let n = query_points.len();
        for len in [points.len(), distances.len()]
            .into_iter()
            .chain(weights.map(<[f32]>::len))
        {
            if len != n {
                return Err(LocalityError::LengthMismatch {
                    expected: n,
                    actual: len,
                });
            }
        }

        let bonds = (0..n)
            .map(|i| {
                let bond = NeighborBond::new(query_points[i], points[i], distances[i]);
                match weights {
                    Some(w) => bond.with_weight(w[i]),
                    None => bond,
                }
            })
            .collect();
        Ok(Self { bonds })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    #[inline]
    pub fn bonds(&self) -> &[NeighborBond] {
        &self.bonds
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NeighborBond> {
        self.bonds.iter()
    }

    pub fn push(&mut self, bond: NeighborBond) {
        self.bonds.push(bond);
    }

    /// Sort by query point, then reference point, then distance.
    pub fn sort(&mut self) {
        self.bonds.sort_unstable_by(|a, b| {
            (a.query_point, a.point)
                .cmp(&(b.query_point, b.point))
                .then(a.distance.total_cmp(&b.distance))
        });
    }

    /// Keep only bonds for which `keep` returns true.
    pub fn filter<F: FnMut(&NeighborBond) -> bool>(&mut self, keep: F) {
        self.bonds.retain(keep);
    }

    /// Number of bonds per query point, for `num_query_points` query points.
    ///
    /// # Panics
    ///
    /// Panics if a stored bond has `query_point >= num_query_points`.
    pub fn counts(&self, num_query_points: usize) -> Vec<u32> {
        let mut counts = vec![0u32; num_query_points];
        for bond in &self.bonds {
            counts[bond.query_point] += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a NeighborList {
    type Item = &'a NeighborBond;
    type IntoIter = std::slice::Iter<'a, NeighborBond>;

    fn into_iter(self) -> Self::IntoIter {
        self.bonds.iter()
    }
}

impl FromIterator<NeighborBond> for NeighborList {
    fn from_iter<I: IntoIterator<Item = NeighborBond>>(iter: I) -> Self {
        Self {
            bonds: iter.into_iter().collect(),
        }
    }
}
