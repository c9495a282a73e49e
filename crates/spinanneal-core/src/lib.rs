//! # SpinAnneal Core
//!
//! Simulated-annealing engine for spin-glass energy minimization over two
//! problem families:
//!
//! - **QUSO** (Quadratic Unconstrained Spin Optimization): energies of the
//!   form `Σ h_i s_i + Σ J_ij s_i s_j` over spins `s_i ∈ {-1, +1}`, with a
//!   sparse symmetric coupling graph ([`QusoModel`]).
//! - **PUSO** (Polynomial Unconstrained Spin Optimization): arbitrary
//!   multilinear polynomials `Σ c_t Π s_k` ([`PusoModel`]).
//!
//! Two services are provided. [`Annealer`] runs independent Metropolis
//! annealing trials across a caller-supplied temperature schedule and
//! returns each trial's final state and energy. [`simulate_quso`] advances a
//! single quadratic state through a schedule with per-temperature sweep
//! counts.
//!
//! ## Determinism
//!
//! All randomness flows through one [`SpinRng`] stream per call. With a
//! non-negative seed, identical inputs produce bit-identical outputs on
//! every run; a negative seed requests entropy seeding instead. Energy
//! summation orders are fixed, so returned energies are exactly reproducible
//! as well.
//!
//! ## Data layout
//!
//! Problem encodings are flat offset/value arrays rather than nested
//! collections. The adjacency and term tables are borrowed from the caller;
//! the models own only their derived index arrays, and the inner sweep loops
//! allocate nothing.

pub mod anneal;
pub mod error;
pub mod puso;
pub mod quso;
pub mod rng;
pub mod schedule;
pub mod simulate;

pub use anneal::{AnnealConfig, AnnealSolution, Annealer};
pub use error::{EngineError, EngineResult};
pub use puso::PusoModel;
pub use quso::{FlipDeltas, QusoModel};
pub use rng::SpinRng;
pub use schedule::TemperatureSchedule;
pub use simulate::simulate_quso;

use serde::{Deserialize, Serialize};

/// Traversal order for the candidate spins of one Metropolis sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Traversal {
    /// Deterministic round-robin `0, 1, ..., n-1`.
    InOrder,
    /// Uniform-random picks with replacement, `n` candidates per sweep.
    Random,
}

/// Every entry of a spin state must be exactly +1 or -1.
pub(crate) fn validate_spins(state: &[i8]) -> EngineResult<()> {
    for (index, &value) in state.iter().enumerate() {
        if value != 1 && value != -1 {
            return Err(EngineError::InvalidSpin { index, value });
        }
    }
    Ok(())
}
