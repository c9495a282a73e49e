//! # Anneal Drivers
//!
//! Runs repeated simulated-annealing trials over a temperature schedule and
//! collects each trial's final state and energy. One sweep is performed per
//! schedule entry; trials are fully sequential and share a single PRNG
//! stream, which is part of the reproducibility contract. Callers that want
//! statistically independent streams per trial must seed separate calls.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{EngineError, EngineResult};
use crate::puso::{self, PusoModel};
use crate::quso::{self, FlipDeltas, QusoModel};
use crate::rng::SpinRng;
use crate::schedule::check_temperatures;
use crate::{validate_spins, Traversal};

/// Configuration shared by the QUSO and PUSO anneal drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealConfig {
    /// Number of independent trials to run.
    pub num_anneals: usize,
    /// Candidate traversal order within each sweep.
    pub traversal: Traversal,
    /// PRNG seed. Non-negative seeds make the run reproducible; a negative
    /// seed requests entropy seeding.
    pub seed: i64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            num_anneals: 1,
            traversal: Traversal::Random,
            seed: -1,
        }
    }
}

/// Final states and energies of a batch of annealing trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealSolution {
    /// Number of spins per trial state.
    pub num_spins: usize,
    /// Row-major trial states: spin j of trial i at `i * num_spins + j`.
    pub states: Vec<i8>,
    /// Final energy of each trial.
    pub energies: Vec<f64>,
    /// Wall-clock time spent annealing, in milliseconds.
    pub computation_time_ms: f64,
}

impl AnnealSolution {
    /// Number of trials in the batch.
    pub fn num_trials(&self) -> usize {
        self.energies.len()
    }

    /// Final state of one trial.
    pub fn state(&self, trial: usize) -> &[i8] {
        &self.states[trial * self.num_spins..(trial + 1) * self.num_spins]
    }

    /// Trial index and energy of the lowest-energy trial, if any.
    pub fn best(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (trial, &energy) in self.energies.iter().enumerate() {
            match best {
                Some((_, lowest)) if lowest <= energy => {}
                _ => best = Some((trial, energy)),
            }
        }
        best
    }
}

/// Batch simulated-annealing driver for both model families.
#[derive(Debug, Clone)]
pub struct Annealer {
    config: AnnealConfig,
}

impl Annealer {
    /// Create a driver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AnnealConfig::default())
    }

    /// Create a driver with a custom configuration.
    pub fn with_config(config: AnnealConfig) -> Self {
        Self { config }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &AnnealConfig {
        &self.config
    }

    /// Anneal a QUSO model into caller-supplied buffers.
    ///
    /// `states` must hold `num_anneals * num_spins` entries in row-major
    /// order and `energies` one entry per trial. When
    /// `initial_states_provided` is set, `states` is read as the initial
    /// state of each trial before being overwritten with the final states;
    /// otherwise its contents are ignored and each trial starts from a
    /// random configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidBuffer`] on a buffer-length mismatch,
    /// [`EngineError::InvalidSchedule`] on a negative or NaN temperature,
    /// and [`EngineError::InvalidSpin`] when a provided initial state
    /// contains a value other than +1 or -1.
    #[instrument(skip(self, model, temperatures, states, energies))]
    pub fn anneal_quso_into(
        &self,
        model: &QusoModel<'_>,
        temperatures: &[f64],
        initial_states_provided: bool,
        states: &mut [i8],
        energies: &mut [f64],
    ) -> EngineResult<()> {
        let n = model.num_spins();
        check_temperatures(temperatures)?;
        check_result_buffers(n, self.config.num_anneals, states.len(), energies.len())?;
        if initial_states_provided {
            validate_spins(states)?;
        }

        debug!(
            "Annealing QUSO with {} spins, {} trials, {} sweeps",
            n,
            self.config.num_anneals,
            temperatures.len()
        );
        let start = Instant::now();

        let mut rng = SpinRng::new(self.config.seed);
        let mut state = vec![1i8; n];
        let mut deltas = FlipDeltas::new(n);

        for trial in 0..self.config.num_anneals {
            seed_trial_state(&mut state, states, trial, initial_states_provided, &mut rng);
            deltas.recompute(model, &state);
            for &temperature in temperatures {
                quso::metropolis_sweep(
                    model,
                    &mut state,
                    &mut deltas,
                    temperature,
                    self.config.traversal,
                    &mut rng,
                );
            }
            energies[trial] = model.energy(&state);
            states[trial * n..(trial + 1) * n].copy_from_slice(&state);
        }

        info!(
            "QUSO anneal finished: {} trials in {:.2}ms",
            self.config.num_anneals,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Anneal a QUSO model from random initial states, returning owned
    /// results.
    ///
    /// # Errors
    ///
    /// See [`Annealer::anneal_quso_into`].
    pub fn anneal_quso(
        &self,
        model: &QusoModel<'_>,
        temperatures: &[f64],
    ) -> EngineResult<AnnealSolution> {
        let start = Instant::now();
        let mut states = vec![1i8; self.config.num_anneals * model.num_spins()];
        let mut energies = vec![0.0; self.config.num_anneals];
        self.anneal_quso_into(model, temperatures, false, &mut states, &mut energies)?;
        Ok(AnnealSolution {
            num_spins: model.num_spins(),
            states,
            energies,
            computation_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Anneal a QUSO model from caller-supplied initial states, one
    /// row-major state per trial.
    ///
    /// # Errors
    ///
    /// See [`Annealer::anneal_quso_into`].
    pub fn anneal_quso_from(
        &self,
        model: &QusoModel<'_>,
        temperatures: &[f64],
        initial_states: &[i8],
    ) -> EngineResult<AnnealSolution> {
        let start = Instant::now();
        let mut states = initial_states.to_vec();
        let mut energies = vec![0.0; self.config.num_anneals];
        self.anneal_quso_into(model, temperatures, true, &mut states, &mut energies)?;
        Ok(AnnealSolution {
            num_spins: model.num_spins(),
            states,
            energies,
            computation_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Anneal a PUSO model into caller-supplied buffers.
    ///
    /// Same buffer contract as [`Annealer::anneal_quso_into`]; the delta for
    /// each candidate flip is recomputed from the spin's term subgraph
    /// instead of being cached.
    ///
    /// # Errors
    ///
    /// See [`Annealer::anneal_quso_into`].
    #[instrument(skip(self, model, temperatures, states, energies))]
    pub fn anneal_puso_into(
        &self,
        model: &PusoModel<'_>,
        temperatures: &[f64],
        initial_states_provided: bool,
        states: &mut [i8],
        energies: &mut [f64],
    ) -> EngineResult<()> {
        let n = model.num_spins();
        check_temperatures(temperatures)?;
        check_result_buffers(n, self.config.num_anneals, states.len(), energies.len())?;
        if initial_states_provided {
            validate_spins(states)?;
        }

        debug!(
            "Annealing PUSO with {} spins, {} terms, {} trials, {} sweeps",
            n,
            model.num_terms(),
            self.config.num_anneals,
            temperatures.len()
        );
        let start = Instant::now();

        let mut rng = SpinRng::new(self.config.seed);
        let mut state = vec![1i8; n];

        for trial in 0..self.config.num_anneals {
            seed_trial_state(&mut state, states, trial, initial_states_provided, &mut rng);
            for &temperature in temperatures {
                puso::metropolis_sweep(
                    model,
                    &mut state,
                    temperature,
                    self.config.traversal,
                    &mut rng,
                );
            }
            energies[trial] = model.energy(&state);
            states[trial * n..(trial + 1) * n].copy_from_slice(&state);
        }

        info!(
            "PUSO anneal finished: {} trials in {:.2}ms",
            self.config.num_anneals,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Anneal a PUSO model from random initial states, returning owned
    /// results.
    ///
    /// # Errors
    ///
    /// See [`Annealer::anneal_quso_into`].
    pub fn anneal_puso(
        &self,
        model: &PusoModel<'_>,
        temperatures: &[f64],
    ) -> EngineResult<AnnealSolution> {
        let start = Instant::now();
        let mut states = vec![1i8; self.config.num_anneals * model.num_spins()];
        let mut energies = vec![0.0; self.config.num_anneals];
        self.anneal_puso_into(model, temperatures, false, &mut states, &mut energies)?;
        Ok(AnnealSolution {
            num_spins: model.num_spins(),
            states,
            energies,
            computation_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    /// Anneal a PUSO model from caller-supplied initial states.
    ///
    /// # Errors
    ///
    /// See [`Annealer::anneal_quso_into`].
    pub fn anneal_puso_from(
        &self,
        model: &PusoModel<'_>,
        temperatures: &[f64],
        initial_states: &[i8],
    ) -> EngineResult<AnnealSolution> {
        let start = Instant::now();
        let mut states = initial_states.to_vec();
        let mut energies = vec![0.0; self.config.num_anneals];
        self.anneal_puso_into(model, temperatures, true, &mut states, &mut energies)?;
        Ok(AnnealSolution {
            num_spins: model.num_spins(),
            states,
            energies,
            computation_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

impl Default for Annealer {
    fn default() -> Self {
        Self::new()
    }
}

/// Load one trial's starting state into the scratch buffer: either the
/// caller's row, or fresh random spins. The random assignment draws one
/// uniform per spin in index order and maps draws below one half to +1;
/// both the threshold and the draw order are part of the determinism
/// contract.
fn seed_trial_state(
    scratch: &mut [i8],
    states: &[i8],
    trial: usize,
    initial_states_provided: bool,
    rng: &mut SpinRng,
) {
    let n = scratch.len();
    if initial_states_provided {
        scratch.copy_from_slice(&states[trial * n..(trial + 1) * n]);
    } else {
        for spin in scratch.iter_mut() {
            *spin = if rng.uniform01() < 0.5 { 1 } else { -1 };
        }
    }
}

/// Result buffers must hold exactly one row-major state and one energy per
/// trial.
fn check_result_buffers(
    num_spins: usize,
    num_anneals: usize,
    states_len: usize,
    energies_len: usize,
) -> EngineResult<()> {
    let expected = num_anneals * num_spins;
    if states_len != expected {
        return Err(EngineError::buffer(format!(
            "states buffer holds {states_len} entries, expected {num_anneals} x {num_spins} = {expected}"
        )));
    }
    if energies_len != num_anneals {
        return Err(EngineError::buffer(format!(
            "energies buffer holds {energies_len} entries, expected {num_anneals}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_spin() -> (Vec<f64>, Vec<usize>, Vec<usize>, Vec<f64>) {
        (
            vec![1.0, 0.0, 0.0],
            vec![1, 2, 1],
            vec![1, 0, 2, 1],
            vec![-1.0, -1.0, 2.0, 2.0],
        )
    }

    fn descent_config(num_anneals: usize) -> AnnealConfig {
        AnnealConfig {
            num_anneals,
            traversal: Traversal::InOrder,
            seed: 0,
        }
    }

    #[test]
    fn test_default_config() {
        let config = AnnealConfig::default();
        assert_eq!(config.num_anneals, 1);
        assert_eq!(config.traversal, Traversal::Random);
        assert!(config.seed < 0);
    }

    #[test]
    fn test_buffer_validation() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(2));

        let mut states = vec![1i8; 5];
        let mut energies = vec![0.0; 2];
        assert!(annealer
            .anneal_quso_into(&model, &[0.0], false, &mut states, &mut energies)
            .is_err());

        let mut states = vec![1i8; 6];
        let mut energies = vec![0.0; 1];
        assert!(annealer
            .anneal_quso_into(&model, &[0.0], false, &mut states, &mut energies)
            .is_err());
    }

    #[test]
    fn test_rejects_bad_initial_spins() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(1));

        let err = annealer
            .anneal_quso_from(&model, &[0.0], &[1, 0, -1])
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidSpin { index: 1, value: 0 });
    }

    #[test]
    fn test_rejects_bad_schedule() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(1));

        assert!(annealer.anneal_quso(&model, &[-1.0]).is_err());
        assert!(annealer.anneal_quso(&model, &[f64::NAN]).is_err());
    }

    #[test]
    fn test_solution_accessors() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(3));

        let initial = vec![-1i8, -1, -1, -1, -1, 1, 1, 1, 1];
        let solution = annealer.anneal_quso_from(&model, &[0.0], &initial).unwrap();

        assert_eq!(solution.num_trials(), 3);
        assert_eq!(solution.state(1).len(), 3);
        for trial in 0..3 {
            assert_eq!(
                solution.energies[trial],
                model.energy(solution.state(trial)),
                "trial {trial}"
            );
        }
        // Trial 1 started at the global minimum and must stay there.
        assert_eq!(solution.state(1), &[-1, -1, 1]);
        assert_eq!(solution.energies[1], -4.0);
        assert_eq!(solution.best().map(|(_, e)| e), Some(-4.0));
    }

    #[test]
    fn test_zero_trials_is_noop() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(0));

        let solution = annealer.anneal_quso(&model, &[0.0]).unwrap();
        assert_eq!(solution.num_trials(), 0);
        assert!(solution.best().is_none());
    }

    #[test]
    fn test_empty_schedule_keeps_provided_states() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();
        let annealer = Annealer::with_config(descent_config(1));

        let solution = annealer.anneal_quso_from(&model, &[], &[1, -1, 1]).unwrap();
        assert_eq!(solution.state(0), &[1, -1, 1]);
        assert_eq!(solution.energies[0], model.energy(&[1, -1, 1]));
    }
}
