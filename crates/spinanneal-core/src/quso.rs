//! # QUSO Models (Quadratic Unconstrained Spin Optimization)
//!
//! A QUSO instance assigns each spin configuration `s ∈ {-1, +1}^n` the
//! energy
//!
//! ```text
//! E(s) = Σ_i h_i s_i + Σ_(i,j) J_ij s_i s_j
//! ```
//!
//! with a sparse coupling graph. The adjacency is stored in a compressed
//! sparse row layout (per-spin degree, concatenated neighbor lists, parallel
//! coupling values, derived row offsets) so the inner Metropolis loop walks
//! contiguous memory.
//!
//! The flip kernel never re-evaluates the full energy. [`FlipDeltas`] keeps
//! `E(s with spin i flipped) - E(s)` for every spin and updates the cache in
//! O(degree) per accepted flip, which is what makes large sweeps cheap.

use crate::error::{EngineError, EngineResult};
use crate::rng::SpinRng;
use crate::Traversal;

/// Sparse QUSO instance over borrowed caller arrays.
///
/// The caller keeps ownership of the flat problem arrays; the model borrows
/// them for its lifetime and owns only the derived row offsets.
///
/// The adjacency must be symmetric: if spin `j` appears in the neighbor list
/// of spin `i` with coupling `c`, then spin `i` must appear in the neighbor
/// list of spin `j` with the same coupling. This is a documented
/// precondition, checked in debug builds; [`QusoModel::is_symmetric`] lets
/// callers check it explicitly.
#[derive(Debug, Clone)]
pub struct QusoModel<'a> {
    /// Linear field on each spin.
    h: &'a [f64],
    /// Neighbor-list length per spin.
    num_neighbors: &'a [usize],
    /// Concatenated neighbor lists.
    neighbors: &'a [usize],
    /// Coupling values parallel to `neighbors`.
    couplings: &'a [f64],
    /// Row offsets: `offsets[i]` is where spin i's list starts.
    offsets: Vec<usize>,
}

impl<'a> QusoModel<'a> {
    /// Build a model from flat adjacency arrays, validating shapes and
    /// deriving the row offsets in O(n).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidShape`] when the degree sum disagrees
    /// with the neighbor or coupling array length, or a neighbor index is
    /// out of range.
    pub fn new(
        h: &'a [f64],
        num_neighbors: &'a [usize],
        neighbors: &'a [usize],
        couplings: &'a [f64],
    ) -> EngineResult<Self> {
        let n = h.len();
        if num_neighbors.len() != n {
            return Err(EngineError::shape(format!(
                "expected {n} degree entries to match the field array, found {}",
                num_neighbors.len()
            )));
        }

        let total: usize = num_neighbors.iter().sum();
        if neighbors.len() != total {
            return Err(EngineError::shape(format!(
                "degrees sum to {total} but {} neighbors were supplied",
                neighbors.len()
            )));
        }
        if couplings.len() != total {
            return Err(EngineError::shape(format!(
                "degrees sum to {total} but {} couplings were supplied",
                couplings.len()
            )));
        }
        if let Some(&bad) = neighbors.iter().find(|&&j| j >= n) {
            return Err(EngineError::shape(format!(
                "neighbor index {bad} is out of range for {n} spins"
            )));
        }

        let mut offsets = Vec::with_capacity(n);
        let mut start = 0usize;
        for &degree in num_neighbors {
            offsets.push(start);
            start += degree;
        }

        let model = Self {
            h,
            num_neighbors,
            neighbors,
            couplings,
            offsets,
        };
        debug_assert!(
            model.is_symmetric(),
            "every edge must be listed from both endpoints with equal couplings"
        );
        Ok(model)
    }

    /// Number of spins in the model.
    pub fn num_spins(&self) -> usize {
        self.h.len()
    }

    /// Neighbors of `spin` with their coupling values, in storage order.
    fn neighborhood(&self, spin: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.offsets[spin];
        let end = start + self.num_neighbors[spin];
        self.neighbors[start..end]
            .iter()
            .copied()
            .zip(self.couplings[start..end].iter().copied())
    }

    /// Whether every half-edge has a matching reverse half-edge with the
    /// same coupling. O(Σ deg²) worst case; meant for validation, not for
    /// the hot path.
    pub fn is_symmetric(&self) -> bool {
        (0..self.num_spins()).all(|i| {
            self.neighborhood(i)
                .all(|(j, c)| self.neighborhood(j).any(|(k, d)| k == i && d == c))
        })
    }

    /// Energy of `state`, counting each edge once.
    ///
    /// The symmetric adjacency lists every edge twice, so the evaluation
    /// only adds couplings toward neighbors with `j >= i`. Summation order
    /// is the storage order; it is part of the reproducibility contract.
    pub fn energy(&self, state: &[i8]) -> f64 {
        debug_assert_eq!(state.len(), self.num_spins());
        let mut value = 0.0;
        for i in 0..self.num_spins() {
            let mut subgraph = self.h[i];
            for (j, coupling) in self.neighborhood(i) {
                if j >= i {
                    subgraph += coupling * f64::from(state[j]);
                }
            }
            value += f64::from(state[i]) * subgraph;
        }
        value
    }
}

/// Per-spin cache of flip deltas: `values[i] = E(s with spin i flipped) - E(s)`.
///
/// The closed form is `-2 · s_i · (h_i + Σ_j J_ij · s_j)`. After any state
/// mutation the cache must still satisfy that formula for every spin, which
/// [`FlipDeltas::flip`] maintains incrementally.
#[derive(Debug, Clone)]
pub struct FlipDeltas {
    values: Vec<f64>,
}

impl FlipDeltas {
    /// Allocate a zeroed cache for `num_spins` spins. Call
    /// [`FlipDeltas::recompute`] before reading from it.
    pub fn new(num_spins: usize) -> Self {
        Self {
            values: vec![0.0; num_spins],
        }
    }

    /// Fill every entry from scratch via the closed form. O(n + edges).
    pub fn recompute(&mut self, model: &QusoModel<'_>, state: &[i8]) {
        debug_assert_eq!(self.values.len(), model.num_spins());
        for i in 0..model.num_spins() {
            let mut subgraph = model.h[i];
            for (j, coupling) in model.neighborhood(i) {
                subgraph += coupling * f64::from(state[j]);
            }
            self.values[i] = -2.0 * f64::from(state[i]) * subgraph;
        }
    }

    /// Delta energy for flipping `spin` in the current state.
    pub fn get(&self, spin: usize) -> f64 {
        self.values[spin]
    }

    /// Update the cache for an accepted flip of `spin`. Must be called with
    /// the PRE-flip `state`; the caller negates `state[spin]` afterwards.
    ///
    /// Flipping `spin` negates its own delta. For each neighbor `j`, the
    /// edge contributed `-2 · s_j · J · s_i` to `values[j]`; after the flip
    /// it must contribute the opposite sign, a change of `+4 · s_i · s_j · J`.
    pub fn flip(&mut self, model: &QusoModel<'_>, state: &[i8], spin: usize) {
        self.values[spin] = -self.values[spin];
        for (j, coupling) in model.neighborhood(spin) {
            self.values[j] += 4.0 * f64::from(state[spin]) * f64::from(state[j]) * coupling;
        }
    }

    /// Cross-check the cache against a from-scratch recomputation, within a
    /// mixed absolute/relative tolerance. The incremental path accumulates
    /// rounding differently from the closed form, so exact equality is not
    /// required.
    pub fn verify(&self, model: &QusoModel<'_>, state: &[i8], tolerance: f64) -> bool {
        let mut fresh = Self::new(model.num_spins());
        fresh.recompute(model, state);
        self.values
            .iter()
            .zip(&fresh.values)
            .all(|(a, b)| (a - b).abs() <= tolerance * (1.0 + a.abs().max(b.abs())))
    }
}

/// One Metropolis sweep: propose `n` single-spin flips against the cached
/// deltas at the given temperature.
///
/// Candidate k is spin k for [`Traversal::InOrder`], or a uniform pick with
/// replacement for [`Traversal::Random`]. A flip is accepted when its delta
/// is non-positive, or with probability `exp(-delta / temperature)` when the
/// temperature is positive. At temperature zero only non-positive deltas are
/// accepted and the exponential is never evaluated. The sweep is strictly
/// sequential: every accepted flip is visible to all later candidates.
pub fn metropolis_sweep(
    model: &QusoModel<'_>,
    state: &mut [i8],
    deltas: &mut FlipDeltas,
    temperature: f64,
    traversal: Traversal,
    rng: &mut SpinRng,
) {
    let n = model.num_spins();
    for candidate in 0..n {
        let spin = match traversal {
            Traversal::InOrder => candidate,
            Traversal::Random => rng.below(n),
        };
        let delta = deltas.get(spin);
        if delta <= 0.0
            || (temperature > 0.0 && rng.uniform01() < (-delta / temperature).exp())
        {
            deltas.flip(model, state, spin);
            state[spin] = -state[spin];
        }
    }
    debug_assert!(
        deltas.verify(model, state, 1e-8),
        "flip-delta cache diverged from the closed form"
    );
}
