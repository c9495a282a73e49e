//! # QUSO Simulation Driver
//!
//! Advances a single quadratic spin state in place through a temperature
//! schedule with a per-temperature sweep count. Unlike the anneal drivers
//! there is no trial loop and no final-energy computation; the caller reads
//! the evolved state back directly.

use tracing::{debug, instrument};

use crate::error::{EngineError, EngineResult};
use crate::quso::{self, FlipDeltas, QusoModel};
use crate::rng::SpinRng;
use crate::schedule::check_temperatures;
use crate::{validate_spins, Traversal};

/// Evolve `state` through the schedule, mutating it in place.
///
/// For each schedule entry `t`, runs `num_sweeps[t]` Metropolis sweeps at
/// `temperatures[t]`. The flip-delta cache is built once from the incoming
/// state and maintained incrementally across the whole run. An empty
/// schedule leaves the state untouched.
///
/// # Errors
///
/// Returns [`EngineError::InvalidBuffer`] when `state` does not match the
/// model's spin count or the two schedule arrays differ in length,
/// [`EngineError::InvalidSchedule`] on a negative or NaN temperature, and
/// [`EngineError::InvalidSpin`] when the incoming state contains a value
/// other than +1 or -1.
#[instrument(skip(model, state, temperatures, num_sweeps))]
pub fn simulate_quso(
    model: &QusoModel<'_>,
    state: &mut [i8],
    temperatures: &[f64],
    num_sweeps: &[usize],
    traversal: Traversal,
    seed: i64,
) -> EngineResult<()> {
    let n = model.num_spins();
    if state.len() != n {
        return Err(EngineError::buffer(format!(
            "state holds {} spins, model has {n}",
            state.len()
        )));
    }
    if num_sweeps.len() != temperatures.len() {
        return Err(EngineError::buffer(format!(
            "{} temperatures but {} sweep counts",
            temperatures.len(),
            num_sweeps.len()
        )));
    }
    check_temperatures(temperatures)?;
    validate_spins(state)?;

    debug!(
        "Simulating QUSO with {} spins over {} schedule steps",
        n,
        temperatures.len()
    );

    let mut rng = SpinRng::new(seed);
    let mut deltas = FlipDeltas::new(n);
    deltas.recompute(model, state);

    for (&temperature, &sweeps) in temperatures.iter().zip(num_sweeps) {
        for _ in 0..sweeps {
            quso::metropolis_sweep(model, state, &mut deltas, temperature, traversal, &mut rng);
        }
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

    #[test]
    fn test_empty_schedule_is_identity() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut state = [1i8, -1, 1];
        simulate_quso(&model, &mut state, &[], &[], Traversal::InOrder, 0).unwrap();
        assert_eq!(state, [1, -1, 1]);
    }

    #[test]
    fn test_zero_temperature_descends() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut state = [-1i8, -1, -1];
        let before = model.energy(&state);
        simulate_quso(&model, &mut state, &[0.0], &[1], Traversal::InOrder, 0).unwrap();
        assert_eq!(state, [-1, 1, -1]);
        assert!(model.energy(&state) <= before);
    }

    #[test]
    fn test_zero_sweep_count_is_identity() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut state = [-1i8, -1, -1];
        simulate_quso(&model, &mut state, &[0.0, 1.0], &[0, 0], Traversal::InOrder, 0).unwrap();
        assert_eq!(state, [-1, -1, -1]);
    }

    #[test]
    fn test_length_mismatches_rejected() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut short = [1i8, 1];
        assert!(simulate_quso(&model, &mut short, &[0.0], &[1], Traversal::InOrder, 0).is_err());

        let mut state = [1i8, 1, 1];
        assert!(simulate_quso(&model, &mut state, &[0.0], &[1, 2], Traversal::InOrder, 0).is_err());
    }

    #[test]
    fn test_rejects_bad_spins() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut state = [1i8, 2, 1];
        let err = simulate_quso(&model, &mut state, &[0.0], &[1], Traversal::InOrder, 0)
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidSpin { index: 1, value: 2 });
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let (h, deg, nbr, j) = three_spin();
        let model = QusoModel::new(&h, &deg, &nbr, &j).unwrap();

        let mut a = [1i8, -1, 1];
        let mut b = [1i8, -1, 1];
        let temperatures = [2.0, 1.0, 0.5, 0.0];
        let sweeps = [3, 3, 3, 2];
        simulate_quso(&model, &mut a, &temperatures, &sweeps, Traversal::Random, 42).unwrap();
        simulate_quso(&model, &mut b, &temperatures, &sweeps, Traversal::Random, 42).unwrap();
        assert_eq!(a, b);
    }
}
