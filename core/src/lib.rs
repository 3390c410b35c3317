//! Geographic Kalman filter for noisy position fixes
//!
//! This crate fuses a sequence of geolocation fixes (latitude, longitude, altitude, ground speed,
//! and direction of travel, each with its own accuracy) into a single running estimate of
//! position and velocity with an accuracy bound. Fixes from phones and GNSS receivers vary
//! wildly in quality from one to the next; the filter weighs each by its reported accuracy and
//! by how long ago the previous fix was taken.
//!
//! The crate is built off of a small set of dependencies:
//! - [`nalgebra`](https://crates.io/crates/nalgebra): Provides the fixed-size linear algebra for the filter.
//! - [`serde`](https://crates.io/crates/serde) and [`csv`](https://crates.io/crates/csv): Configuration and track files for replaying recorded fixes.
//! - [`rand`](https://crates.io/crates/rand) and [`rand_distr`](https://crates.io/crates/rand_distr): Synthetic fix degradation for simulation.
//! - [`log`](https://crates.io/crates/log): Diagnostics. The library never installs a logger itself.
//!
//! ## Crate overview
//!
//! This crate is organized into several modules:
//! - [earth]: Meters-per-degree factors and short-range distance/bearing helpers.
//! - [linalg]: Fixed-size 6×6 matrix types and helpers.
//! - [noise]: Conversion of physical random-walk parameters into process noise.
//! - [kalman]: The generic six-state linear Kalman filter.
//! - [geo]: The geographic adaptation of the linear filter (degrees, meters, seconds).
//! - [sim]: Replaying recorded or synthetic fixes through the filter.
//! - [error]: Error types.
//!
//! ## State definition
//!
//! The state vector is
//!
//! $$
//! x = [p_1, p_2, p_3, v_1, v_2, v_3]
//! $$
//!
//! For the geographic filter $p_1$, $p_2$ are latitude and longitude in degrees, $p_3$ is
//! altitude in meters, and $v_i$ are the corresponding rates (degrees per second, meters per
//! second). The motion model is constant velocity; deviations from it are absorbed by process
//! noise that grows linearly with elapsed time.
//!
//! ## Local linearization
//!
//! Latitude and longitude are angular, but accuracies and speeds arrive in meters. The
//! geographic filter converts between the two with the meters-per-degree factors at the
//! latitude of each fix (and, when estimating, at the estimated latitude) rather than a single
//! global constant, so the flat-earth approximation is always made locally.
//!
//! ## Example
//! ```rust
//! use geokalman::NavigationFilter;
//! use geokalman::geo::{GeoKalmanFilter, GeoObservation, GeoProcessNoise};
//!
//! let mut filter = GeoKalmanFilter::new(&GeoProcessNoise {
//!     base_latitude: 41.15,
//!     distance_per_second: 1.0,
//!     speed_per_second: 0.1,
//! })
//! .unwrap();
//! let fix = GeoObservation {
//!     latitude: 41.154874,
//!     longitude: -73.773139,
//!     altitude: 105.0,
//!     speed_accuracy: 0.1,
//!     horizontal_accuracy: 100.0,
//!     vertical_accuracy: 10.0,
//!     ..Default::default()
//! };
//! filter.observe(0.0, &fix).unwrap();
//! let estimate = filter.estimate().unwrap();
//! assert!((estimate.horizontal_accuracy - 100.0).abs() < 1e-6);
//! ```
pub mod earth;
pub mod error;
pub mod geo;
pub mod kalman;
pub mod linalg;
pub mod noise;
pub mod sim;

pub use error::{FilterError, Result};

/// Common interface of the filters in this crate.
///
/// A filter is driven serially by one caller: each call to [NavigationFilter::observe] mutates
/// the filter in place, and [NavigationFilter::estimate] reads the current best estimate.
/// Sharing a filter between threads requires external synchronization.
pub trait NavigationFilter {
    /// One fix, in the filter's own units
    type Observation;
    /// Best estimate, in the filter's own units
    type Estimate;
    /// Process an observation taken `dt` seconds after the previous one.
    ///
    /// The first observation initializes the filter and `dt` is ignored. A failed update leaves
    /// the filter unchanged.
    fn observe(&mut self, dt: f64, observation: &Self::Observation) -> Result<()>;
    /// Current best estimate, or `None` if nothing has been observed yet.
    fn estimate(&self) -> Option<Self::Estimate>;
}

/// Wrap an angle to the range 0 to 360 degrees
///
/// This function is generic and can be used with any type that implements the necessary traits.
///
/// # Arguments
/// * `angle` - The angle to be wrapped, which can be of any type that implements the necessary traits.
/// # Returns
/// * The wrapped angle, which will be in the range 0 to 360 degrees.
/// # Example
/// ```rust
/// use geokalman::wrap_to_360;
/// let angle = -90.0;
/// let wrapped_angle = wrap_to_360(angle);
/// assert_eq!(wrapped_angle, 270.0);
/// ```
pub fn wrap_to_360<T>(angle: T) -> T
where
    T: PartialOrd + Copy + std::ops::SubAssign + std::ops::AddAssign + From<f64>,
{
    let mut wrapped: T = angle;
    while wrapped >= T::from(360.0) {
        wrapped -= T::from(360.0);
    }
    while wrapped < T::from(0.0) {
        wrapped += T::from(360.0);
    }
    wrapped
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_wrap_to_360() {
        assert_eq!(super::wrap_to_360(370.0), 10.0);
        assert_eq!(super::wrap_to_360(-10.0), 350.0);
        assert_eq!(super::wrap_to_360(0.0), 0.0);
        assert_eq!(super::wrap_to_360(360.0), 0.0);
        assert_eq!(super::wrap_to_360(-180.0), 180.0);
    }
}
