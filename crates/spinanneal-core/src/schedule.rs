//! # Temperature Schedules
//!
//! The drivers accept any slice of non-negative temperatures; this module
//! provides the common ladder shapes so callers do not have to hand-roll
//! them. One Metropolis sweep is performed per schedule entry, so the length
//! of the expanded schedule is the sweep budget of an anneal.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Declarative description of a cooling ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemperatureSchedule {
    /// `T_i = start * (stop / start)^(i / (steps - 1))`. Both endpoints must
    /// be positive; the classic cooling choice.
    Geometric {
        /// Temperature of the first sweep.
        start: f64,
        /// Temperature of the last sweep.
        stop: f64,
        /// Number of sweeps.
        steps: usize,
    },
    /// `T_i = start + (stop - start) * i / (steps - 1)`.
    Linear {
        /// Temperature of the first sweep.
        start: f64,
        /// Temperature of the last sweep.
        stop: f64,
        /// Number of sweeps.
        steps: usize,
    },
    /// The same temperature for every sweep. `Constant { temperature: 0.0 }`
    /// is a pure descent schedule.
    Constant {
        /// Temperature of every sweep.
        temperature: f64,
        /// Number of sweeps.
        steps: usize,
    },
    /// Explicit temperature values, used verbatim.
    Custom {
        /// One temperature per sweep.
        temperatures: Vec<f64>,
    },
}

impl TemperatureSchedule {
    /// Expand the description into one temperature per sweep.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSchedule`] when an endpoint is negative,
    /// NaN, or (for geometric ladders) not strictly positive.
    pub fn temperatures(&self) -> EngineResult<Vec<f64>> {
        let ladder = match *self {
            Self::Geometric { start, stop, steps } => {
                if !(start.is_finite() && stop.is_finite()) || start <= 0.0 || stop <= 0.0 {
                    return Err(EngineError::schedule(format!(
                        "geometric endpoints must be positive finite reals, got {start} and {stop}"
                    )));
                }
                match steps {
                    0 => Vec::new(),
                    1 => vec![start],
                    _ => {
                        let ratio = (stop / start).powf(1.0 / (steps - 1) as f64);
                        (0..steps).map(|i| start * ratio.powi(i as i32)).collect()
                    }
                }
            }
            Self::Linear { start, stop, steps } => {
                if !(start.is_finite() && stop.is_finite()) || start < 0.0 || stop < 0.0 {
                    return Err(EngineError::schedule(format!(
                        "linear endpoints must be non-negative finite reals, got {start} and {stop}"
                    )));
                }
                match steps {
                    0 => Vec::new(),
                    1 => vec![start],
                    _ => {
                        let step = (stop - start) / (steps - 1) as f64;
                        (0..steps).map(|i| start + step * i as f64).collect()
                    }
                }
            }
            Self::Constant { temperature, steps } => {
                if temperature.is_nan() || temperature < 0.0 {
                    return Err(EngineError::schedule(format!(
                        "constant temperature must be non-negative, got {temperature}"
                    )));
                }
                vec![temperature; steps]
            }
            Self::Custom { ref temperatures } => {
                check_temperatures(temperatures)?;
                temperatures.clone()
            }
        };
        Ok(ladder)
    }
}

/// Reject schedules containing a negative or NaN temperature. Zero and
/// arbitrarily large (even infinite) temperatures are legal.
pub(crate) fn check_temperatures(temperatures: &[f64]) -> EngineResult<()> {
    for (step, &t) in temperatures.iter().enumerate() {
        if t.is_nan() || t < 0.0 {
            return Err(EngineError::schedule(format!(
                "temperature {t} at step {step} is not a non-negative real"
            )));
        }
    }
    Ok(())
}
