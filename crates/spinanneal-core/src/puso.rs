//! # PUSO Models (Polynomial Unconstrained Spin Optimization)
//!
//! A PUSO instance generalizes QUSO to an arbitrary multilinear polynomial:
//!
//! ```text
//! E(s) = Σ_t c_t · Π_(k ∈ term_t) s_k
//! ```
//!
//! Terms are stored flat (per-term arity, concatenated spin-index lists,
//! per-term coupling, derived term offsets), plus an inverted incidence
//! index mapping each spin to the terms that contain it.
//!
//! Unlike the quadratic case there is no incremental delta cache: a single
//! flip changes the delta of every spin sharing any term with it, and terms
//! may have arbitrary arity, so the bookkeeping would outweigh the savings.
//! The kernel instead re-evaluates the spin's term subgraph on demand.
//! Flipping spin i negates exactly the terms containing it, so the delta is
//! `-2 · subgraph_energy(s, i)`.

use crate::error::{EngineError, EngineResult};
use crate::rng::SpinRng;
use crate::Traversal;

/// Flat polynomial spin model over borrowed caller arrays.
#[derive(Debug, Clone)]
pub struct PusoModel<'a> {
    /// Number of spins the terms range over.
    num_spins: usize,
    /// Number of spin factors per term.
    arity: &'a [usize],
    /// Concatenated per-term spin-index lists.
    terms: &'a [usize],
    /// Coefficient of each term.
    couplings: &'a [f64],
    /// `term_offsets[t]` is where term t starts in `terms`.
    term_offsets: Vec<usize>,
    /// Row offsets into `incidence`, one row per spin plus a final sentinel.
    incidence_offsets: Vec<usize>,
    /// Term ids containing each spin, ascending within a row.
    incidence: Vec<usize>,
}

impl<'a> PusoModel<'a> {
    /// Build a model from flat term arrays, validating shapes and deriving
    /// the term offsets and the spin-to-terms incidence index in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidShape`] when the arity sum disagrees
    /// with the term array length, a term is empty, or a spin index is out
    /// of range.
    pub fn new(
        num_spins: usize,
        arity: &'a [usize],
        terms: &'a [usize],
        couplings: &'a [f64],
    ) -> EngineResult<Self> {
        if couplings.len() != arity.len() {
            return Err(EngineError::shape(format!(
                "{} terms but {} couplings",
                arity.len(),
                couplings.len()
            )));
        }
        if let Some(empty) = arity.iter().position(|&a| a == 0) {
            return Err(EngineError::shape(format!(
                "term {empty} has no spin factors"
            )));
        }
        let total: usize = arity.iter().sum();
        if terms.len() != total {
            return Err(EngineError::shape(format!(
                "arities sum to {total} but {} term entries were supplied",
                terms.len()
            )));
        }
        if let Some(&bad) = terms.iter().find(|&&s| s >= num_spins) {
            return Err(EngineError::shape(format!(
                "term spin index {bad} is out of range for {num_spins} spins"
            )));
        }

        let mut term_offsets = Vec::with_capacity(arity.len());
        let mut start = 0usize;
        for &a in arity {
            term_offsets.push(start);
            start += a;
        }

        // Counting pass: row sizes, prefix sums, then fill. Scanning terms
        // in order keeps each incidence row sorted by term id.
        let mut incidence_offsets = vec![0usize; num_spins + 1];
        for &spin in terms {
            incidence_offsets[spin + 1] += 1;
        }
        for i in 0..num_spins {
            incidence_offsets[i + 1] += incidence_offsets[i];
        }
        let mut cursor = incidence_offsets[..num_spins].to_vec();
        let mut incidence = vec![0usize; total];
        for (term, (&off, &a)) in term_offsets.iter().zip(arity).enumerate() {
            for &spin in &terms[off..off + a] {
                incidence[cursor[spin]] = term;
                cursor[spin] += 1;
            }
        }

        Ok(Self {
            num_spins,
            arity,
            terms,
            couplings,
            term_offsets,
            incidence_offsets,
            incidence,
        })
    }

    /// Number of spins the model ranges over.
    pub fn num_spins(&self) -> usize {
        self.num_spins
    }

    /// Number of polynomial terms.
    pub fn num_terms(&self) -> usize {
        self.arity.len()
    }

    /// Spin indices of one term.
    fn term_spins(&self, term: usize) -> &[usize] {
        let off = self.term_offsets[term];
        &self.terms[off..off + self.arity[term]]
    }

    /// Term ids containing `spin`, ascending.
    fn incident_terms(&self, spin: usize) -> &[usize] {
        &self.incidence[self.incidence_offsets[spin]..self.incidence_offsets[spin + 1]]
    }

    /// Product of the spin values in one term; always +1 or -1.
    fn term_product(&self, state: &[i8], term: usize) -> f64 {
        let mut product = 1i32;
        for &spin in self.term_spins(term) {
            product *= i32::from(state[spin]);
        }
        f64::from(product)
    }

    /// Energy of the terms containing `spin`. Flipping `spin` changes the
    /// full energy by exactly minus twice this value.
    pub fn subgraph_energy(&self, state: &[i8], spin: usize) -> f64 {
        let mut value = 0.0;
        for &term in self.incident_terms(spin) {
            value += self.couplings[term] * self.term_product(state, term);
        }
        value
    }

    /// Full energy of `state`, summing terms in storage order.
    pub fn energy(&self, state: &[i8]) -> f64 {
        debug_assert_eq!(state.len(), self.num_spins);
        let mut value = 0.0;
        for term in 0..self.num_terms() {
            value += self.couplings[term] * self.term_product(state, term);
        }
        value
    }
}

/// One Metropolis sweep with on-demand deltas.
///
/// Control flow matches the quadratic kernel: n candidates per sweep,
/// in-order or uniform-random traversal, accept when `delta <= 0` or with
/// probability `exp(-delta / temperature)` at positive temperature. The
/// delta for a candidate is `-2 · subgraph_energy(state, spin)`.
pub fn metropolis_sweep(
    model: &PusoModel<'_>,
    state: &mut [i8],
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
        let delta = -2.0 * model.subgraph_energy(state, spin);
        if delta <= 0.0
            || (temperature > 0.0 && rng.uniform01() < (-delta / temperature).exp())
        {
            state[spin] = -state[spin];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The quartic model `z0 z1 - z1 z2 z3 + 3 z2`.
    fn quartic() -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        (vec![2, 3, 1], vec![0, 1, 1, 2, 3, 2], vec![1.0, -1.0, 3.0])
    }

    #[test]
    fn test_shape_validation() {
        assert!(PusoModel::new(2, &[2], &[0, 1], &[]).is_err());
        assert!(PusoModel::new(2, &[0], &[], &[1.0]).is_err());
        assert!(PusoModel::new(2, &[2], &[0], &[1.0]).is_err());
        assert!(PusoModel::new(2, &[2], &[0, 2], &[1.0]).is_err());
        assert!(PusoModel::new(2, &[2], &[0, 1], &[1.0]).is_ok());
    }

    #[test]
    fn test_incidence_index() {
        let (arity, terms, c) = quartic();
        let model = PusoModel::new(4, &arity, &terms, &c).unwrap();

        assert_eq!(model.incident_terms(0), &[0]);
        assert_eq!(model.incident_terms(1), &[0, 1]);
        assert_eq!(model.incident_terms(2), &[1, 2]);
        assert_eq!(model.incident_terms(3), &[1]);
    }

    #[test]
    fn test_energy() {
        let (arity, terms, c) = quartic();
        let model = PusoModel::new(4, &arity, &terms, &c).unwrap();

        assert_eq!(model.energy(&[1, 1, 1, 1]), 3.0);
        assert_eq!(model.energy(&[1, -1, -1, 1]), -5.0);
        assert_eq!(model.energy(&[-1, 1, -1, -1]), -5.0);
    }

    #[test]
    fn test_flip_identity() {
        // Flipping spin i must change the energy by -2 * subgraph_energy(i),
        // for every spin of every state.
        let (arity, terms, c) = quartic();
        let model = PusoModel::new(4, &arity, &terms, &c).unwrap();

        for bits in 0..16u8 {
            let state: Vec<i8> = (0..4).map(|k| if bits >> k & 1 == 1 { 1 } else { -1 }).collect();
            let base = model.energy(&state);
            for i in 0..4 {
                let mut flipped = state.clone();
                flipped[i] = -flipped[i];
                assert_eq!(
                    model.energy(&flipped) - base,
                    -2.0 * model.subgraph_energy(&state, i),
                    "state {state:?}, spin {i}"
                );
            }
        }
    }

    #[test]
    fn test_sweep_descends_quartic_model() {
        // In-order descent at T = 0 from all-up: spin 0 flips at -2, spin 1
        // holds at +4, spin 2 flips at -4, spin 3 flips at -2. Energy -5.
        let (arity, terms, c) = quartic();
        let model = PusoModel::new(4, &arity, &terms, &c).unwrap();

        let mut state = [1i8, 1, 1, 1];
        let mut rng = SpinRng::new(0);
        metropolis_sweep(&model, &mut state, 0.0, Traversal::InOrder, &mut rng);

        assert_eq!(state, [-1, 1, -1, -1]);
        assert_eq!(model.energy(&state), -5.0);
    }

    #[test]
    fn test_empty_model() {
        let model = PusoModel::new(0, &[], &[], &[]).unwrap();
        assert_eq!(model.num_spins(), 0);
        assert_eq!(model.energy(&[]), 0.0);

        let mut state: [i8; 0] = [];
        let mut rng = SpinRng::new(0);
        metropolis_sweep(&model, &mut state, 1.0, Traversal::Random, &mut rng);
    }

    #[test]
    fn test_single_term_constant_offset() {
        // A lone linear term behaves like a field: minimum at s = -sign(c).
        let model = PusoModel::new(1, &[1], &[0], &[2.5]).unwrap();
        let mut state = [1i8];
        let mut rng = SpinRng::new(3);
        metropolis_sweep(&model, &mut state, 0.0, Traversal::InOrder, &mut rng);
        assert_eq!(state, [-1]);
        assert_eq!(model.energy(&state), -2.5);
    }
}
