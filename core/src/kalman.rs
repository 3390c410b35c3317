//! Linear six-state Kalman filter
//!
//! This module contains the generic constant-velocity Kalman filter that the geographic filter
//! in [crate::geo] is built on. The state is three positions and three velocities, in whatever
//! (consistent) units the caller chooses, and every component of the state is observed
//! directly, so the observation operator is the identity.
//!
//! The filter has two states. Before the first observation there is nothing to estimate
//! ([FilterState::Uninitialized]); the first observation is adopted verbatim as the state, with
//! its accuracies squared on the covariance diagonal. Every later observation runs one predict
//! and one update step:
//!
//! $$
//! \hat{x}^- = F \hat{x}, \qquad P^- = F P F^T + Q \Delta t
//! $$
//!
//! $$
//! K = P^- (P^- + R)^{-1}, \qquad \hat{x}^+ = \hat{x}^- + K (z - \hat{x}^-), \qquad P^+ = (I - K) P^-
//! $$
//!
//! where $F$ is [transition_matrix], $Q$ the process noise rates and $R$ the diagonal of the
//! observation's accuracies squared. The covariance update is the plain (non-Joseph) form; no
//! symmetrization or positive-definiteness correction is applied afterwards.
use std::fmt::{self, Display};

use log::{debug, trace, warn};

use crate::NavigationFilter;
use crate::error::{FilterError, Result};
use crate::linalg::{Matrix6, Vector6, diagonal_from_accuracies, invert, transition_matrix};
use crate::noise::ProcessNoise;

/// A single observation of the full state, with a standard deviation per component.
///
/// Observations are consumed by [LinearKalmanFilter::observe] and never retained.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// Accuracy (standard deviation) of `x`
    pub x_accuracy: f64,
    /// Accuracy (standard deviation) of `y`
    pub y_accuracy: f64,
    /// Accuracy (standard deviation) of `z`
    pub z_accuracy: f64,
    /// Accuracy (standard deviation) of `vx`
    pub vx_accuracy: f64,
    /// Accuracy (standard deviation) of `vy`
    pub vy_accuracy: f64,
    /// Accuracy (standard deviation) of `vz`
    pub vz_accuracy: f64,
}
impl Observation {
    /// Observed values as a state vector
    pub fn values(&self) -> Vector6 {
        Vector6::new(self.x, self.y, self.z, self.vx, self.vy, self.vz)
    }
    /// Observed accuracies, ordered like [Observation::values]
    pub fn accuracies(&self) -> Vector6 {
        Vector6::new(
            self.x_accuracy,
            self.y_accuracy,
            self.z_accuracy,
            self.vx_accuracy,
            self.vy_accuracy,
            self.vz_accuracy,
        )
    }
}
impl Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Observation(position: [{}, {}, {}] ± [{}, {}, {}], velocity: [{}, {}, {}] ± [{}, {}, {}])",
            self.x,
            self.y,
            self.z,
            self.x_accuracy,
            self.y_accuracy,
            self.z_accuracy,
            self.vx,
            self.vy,
            self.vz,
            self.vx_accuracy,
            self.vy_accuracy,
            self.vz_accuracy
        )
    }
}

/// Lifecycle of the filter's estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FilterState {
    /// Nothing has been observed yet.
    #[default]
    Uninitialized,
    /// At least one observation has been accepted.
    Tracking {
        /// Current state estimate `[x, y, z, vx, vy, vz]`
        state: Vector6,
        /// Current state covariance
        covariance: Matrix6,
    },
}

/// Snapshot of a tracking filter's state and covariance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    pub state: Vector6,
    pub covariance: Matrix6,
}

/// Constant-velocity Kalman filter over `[x, y, z, vx, vy, vz]`.
#[derive(Clone, Debug)]
pub struct LinearKalmanFilter {
    state: FilterState,
    process_noise: Matrix6,
}
impl Display for LinearKalmanFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            FilterState::Uninitialized => write!(f, "LinearKalmanFilter(uninitialized)"),
            FilterState::Tracking { state, covariance } => f
                .debug_struct("LinearKalmanFilter")
                .field("state", &state.as_slice())
                .field("variances", &covariance.diagonal().as_slice())
                .finish(),
        }
    }
}
impl LinearKalmanFilter {
    /// Create a filter from a physical process noise description.
    ///
    /// # Errors
    /// [FilterError::InvalidProcessNoise] if a random step is given without a time step.
    ///
    /// # Example
    /// ```rust
    /// use geokalman::kalman::LinearKalmanFilter;
    /// use geokalman::noise::ProcessNoise;
    /// let filter = LinearKalmanFilter::new(&ProcessNoise::default()).unwrap();
    /// assert!(!filter.is_initialized());
    /// ```
    pub fn new(process_noise: &ProcessNoise) -> Result<Self> {
        Ok(LinearKalmanFilter {
            state: FilterState::Uninitialized,
            process_noise: process_noise.to_matrix()?,
        })
    }
    /// Current lifecycle state
    pub fn state(&self) -> &FilterState {
        &self.state
    }
    /// Process noise variance rates (per second)
    pub fn process_noise(&self) -> &Matrix6 {
        &self.process_noise
    }
    /// Whether at least one observation has been accepted
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, FilterState::Tracking { .. })
    }
    /// Propagate a state and covariance forward by `dt` under the constant-velocity model.
    fn predict(&self, state: &Vector6, covariance: &Matrix6, dt: f64) -> (Vector6, Matrix6) {
        let transition = transition_matrix(dt);
        let predicted_state = transition * state;
        let predicted_covariance =
            transition * covariance * transition.transpose() + self.process_noise * dt;
        (predicted_state, predicted_covariance)
    }
    /// Blend a prediction with an observation.
    ///
    /// Returns `None` if the innovation covariance cannot be inverted.
    fn update(
        predicted_state: &Vector6,
        predicted_covariance: &Matrix6,
        observation: &Observation,
    ) -> Option<(Vector6, Matrix6)> {
        let observation_noise = diagonal_from_accuracies(&observation.accuracies());
        let innovation_covariance = predicted_covariance + observation_noise;
        let gain = predicted_covariance * invert(&innovation_covariance)?;
        let innovation = observation.values() - predicted_state;
        trace!("innovation: {:?}", innovation.as_slice());
        let state = predicted_state + gain * innovation;
        let covariance = (Matrix6::identity() - gain) * predicted_covariance;
        Some((state, covariance))
    }
}
impl NavigationFilter for LinearKalmanFilter {
    type Observation = Observation;
    type Estimate = Estimate;

    /// Process one observation taken `dt` seconds after the previous one.
    ///
    /// On [FilterError::SingularMatrix] the filter is left exactly as it was before the call,
    /// so the caller may skip the observation and carry on with the next.
    fn observe(&mut self, dt: f64, observation: &Observation) -> Result<()> {
        match self.state {
            FilterState::Uninitialized => {
                debug!("initializing filter from {observation}");
                self.state = FilterState::Tracking {
                    state: observation.values(),
                    covariance: diagonal_from_accuracies(&observation.accuracies()),
                };
                Ok(())
            }
            FilterState::Tracking { state, covariance } => {
                trace!("observe: dt = {dt}");
                let (predicted_state, predicted_covariance) = self.predict(&state, &covariance, dt);
                let Some((state, covariance)) =
                    Self::update(&predicted_state, &predicted_covariance, observation)
                else {
                    warn!("singular innovation covariance, rejecting {observation}");
                    return Err(FilterError::SingularMatrix);
                };
                self.state = FilterState::Tracking { state, covariance };
                Ok(())
            }
        }
    }
    fn estimate(&self) -> Option<Estimate> {
        match self.state {
            FilterState::Uninitialized => None,
            FilterState::Tracking { state, covariance } => Some(Estimate { state, covariance }),
        }
    }
}
