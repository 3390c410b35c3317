//! Process noise model
//!
//! The filters describe process noise physically: "over a time step of `time_step` seconds I
//! expect the position to wander by about `x_step` and the velocity by about `vx_step`". This is
//! a random walk, so the variance grows linearly with time and the per-axis variance rate is
//!
//! $$
//! q_i = \frac{s_i^2}{t}
//! $$
//!
//! The resulting diagonal matrix is later scaled by the elapsed time of each prediction.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::linalg::{Matrix6, Vector6};

/// Expected random walk per axis over a reference time step.
///
/// The default (all zero) describes a filter with no process noise at all, which is valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessNoise {
    /// Random step along the first position axis
    pub x_step: f64,
    /// Random step along the second position axis
    pub y_step: f64,
    /// Random step along the third position axis
    pub z_step: f64,
    /// Random step of the first velocity component
    pub vx_step: f64,
    /// Random step of the second velocity component
    pub vy_step: f64,
    /// Random step of the third velocity component
    pub vz_step: f64,
    /// Time over which the random steps above are expected, in seconds
    pub time_step: f64,
}
impl ProcessNoise {
    fn steps(&self) -> Vector6 {
        Vector6::new(
            self.x_step,
            self.y_step,
            self.z_step,
            self.vx_step,
            self.vy_step,
            self.vz_step,
        )
    }
    /// Per-axis variance growth rates, $s_i^2 / t$.
    ///
    /// # Errors
    /// [FilterError::InvalidProcessNoise] if any step is non-zero while `time_step` is zero.
    ///
    /// # Example
    /// ```rust
    /// use geokalman::noise::ProcessNoise;
    /// let noise = ProcessNoise { x_step: 2.0, time_step: 4.0, ..Default::default() };
    /// let rates = noise.variance_rates().unwrap();
    /// assert_eq!(rates[0], 1.0);
    /// ```
    pub fn variance_rates(&self) -> Result<Vector6> {
        let steps = self.steps();
        if self.time_step == 0.0 {
            if steps.iter().any(|step| *step != 0.0) {
                return Err(FilterError::InvalidProcessNoise);
            }
            return Ok(Vector6::zeros());
        }
        Ok(steps.component_mul(&steps) / self.time_step)
    }
    /// Diagonal process noise matrix built from [ProcessNoise::variance_rates].
    pub fn to_matrix(&self) -> Result<Matrix6> {
        let rates = self.variance_rates()?;
        debug!("process noise variance rates: {:?}", rates.as_slice());
        Ok(Matrix6::from_diagonal(&rates))
    }
}
