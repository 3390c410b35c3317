//! Geographic Kalman filter
//!
//! Adapts the linear filter in [crate::kalman] to geolocation fixes. Fixes arrive in
//! degrees (latitude, longitude), meters (altitude, accuracies), meters per second (speed) and
//! degrees from north (direction of travel). Internally the filter tracks
//! `[latitude, longitude, altitude, v_lat, v_lng, v_alt]` with horizontal velocities in degrees
//! per second.
//!
//! Conversions between meters and degrees use [fast_meters_per_degree_latitude] and
//! [fast_meters_per_degree_longitude] evaluated at the latitude of the fix being observed, or at
//! the estimated latitude when producing an estimate. Process noise is converted once, at the
//! base latitude given at construction.
use std::f64::consts::SQRT_2;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::earth::{fast_meters_per_degree_latitude, fast_meters_per_degree_longitude};
use crate::error::Result;
use crate::kalman::{LinearKalmanFilter, Observation};
use crate::linalg::{VX, VY, X, Y, Z};
use crate::noise::ProcessNoise;
use crate::{NavigationFilter, wrap_to_360};

/// Floor on velocity accuracy, meters per second.
///
/// Keeps a stationary fix (zero speed, tiny speed accuracy) from producing a zero-variance
/// velocity observation.
pub const MIN_SPEED_ACCURACY: f64 = 0.1;
/// Incline, in degrees, used to derive the vertical random walk from the horizontal one.
pub const INCLINE_DEGREES: f64 = 5.0;

/// Physical process noise for the geographic filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoProcessNoise {
    /// Latitude (degrees) at which the horizontal random walk is converted to degrees
    pub base_latitude: f64,
    /// Expected random walk distance per second, meters
    pub distance_per_second: f64,
    /// Expected change of speed per second, meters per second
    pub speed_per_second: f64,
}
impl GeoProcessNoise {
    /// Per-axis random steps in the filter's internal units, over one second.
    ///
    /// The horizontal walk is split evenly between the latitude and longitude axes, and the
    /// vertical walk is the horizontal one climbing at [INCLINE_DEGREES].
    pub fn to_process_noise(&self) -> ProcessNoise {
        let meters_per_degree_lat = fast_meters_per_degree_latitude(self.base_latitude);
        let meters_per_degree_lng = fast_meters_per_degree_longitude(self.base_latitude);
        let incline = INCLINE_DEGREES.to_radians().sin();
        ProcessNoise {
            x_step: self.distance_per_second / SQRT_2 / meters_per_degree_lat,
            y_step: self.distance_per_second / SQRT_2 / meters_per_degree_lng,
            z_step: self.distance_per_second * incline,
            vx_step: self.speed_per_second / SQRT_2 / meters_per_degree_lat,
            vy_step: self.speed_per_second / SQRT_2 / meters_per_degree_lng,
            vz_step: self.speed_per_second * incline,
            time_step: 1.0,
        }
    }
}

/// A single geolocation fix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoObservation {
    /// Latitude, degrees
    pub latitude: f64,
    /// Longitude, degrees
    pub longitude: f64,
    /// Altitude, meters
    pub altitude: f64,
    /// Ground speed, meters per second
    pub speed: f64,
    /// Speed accuracy, meters per second
    pub speed_accuracy: f64,
    /// Direction of travel, degrees clockwise from north
    pub direction: f64,
    /// Direction accuracy, degrees
    pub direction_accuracy: f64,
    /// Horizontal accuracy radius, meters
    pub horizontal_accuracy: f64,
    /// Vertical accuracy, meters
    pub vertical_accuracy: f64,
}
impl Display for GeoObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoObservation(lat: {}, lng: {}, alt: {}, speed: {}, direction: {}, horiz_acc: {}, vert_acc: {})",
            self.latitude,
            self.longitude,
            self.altitude,
            self.speed,
            self.direction,
            self.horizontal_accuracy,
            self.vertical_accuracy
        )
    }
}

/// Best estimate of the tracked point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoEstimate {
    /// Latitude, degrees
    pub latitude: f64,
    /// Longitude, degrees
    pub longitude: f64,
    /// Altitude, meters
    pub altitude: f64,
    /// Ground speed, meters per second
    pub speed: f64,
    /// Direction of travel, degrees clockwise from north in [0, 360); 0 when stationary
    pub direction: f64,
    /// Horizontal accuracy, meters: the larger of the latitude and longitude standard deviations
    pub horizontal_accuracy: f64,
}
impl Display for GeoEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoEstimate(lat: {:.6}, lng: {:.6}, alt: {:.2}, speed: {:.3}, direction: {:.1}, horiz_acc: {:.2})",
            self.latitude,
            self.longitude,
            self.altitude,
            self.speed,
            self.direction,
            self.horizontal_accuracy
        )
    }
}

/// Accuracy of the latitude velocity component, degrees per second.
///
/// First-order propagation of the speed and direction errors through
/// $v_{lat} = s \cos\theta / m_{lat}$, floored at [MIN_SPEED_ACCURACY].
pub fn latitude_velocity_accuracy(
    speed: f64,
    speed_accuracy: f64,
    direction_rad: f64,
    direction_accuracy_rad: f64,
    meters_per_degree_lat: f64,
) -> f64 {
    let from_speed = direction_rad.cos() / meters_per_degree_lat * speed_accuracy;
    let from_direction =
        -speed * direction_rad.sin() / meters_per_degree_lat * direction_accuracy_rad;
    from_speed
        .hypot(from_direction)
        .max(MIN_SPEED_ACCURACY / meters_per_degree_lat)
}
/// Accuracy of the longitude velocity component, degrees per second.
///
/// First-order propagation of the speed and direction errors through
/// $v_{lng} = s \sin\theta / m_{lng}$, floored at [MIN_SPEED_ACCURACY].
pub fn longitude_velocity_accuracy(
    speed: f64,
    speed_accuracy: f64,
    direction_rad: f64,
    direction_accuracy_rad: f64,
    meters_per_degree_lng: f64,
) -> f64 {
    let from_speed = direction_rad.sin() / meters_per_degree_lng * speed_accuracy;
    let from_direction =
        speed * direction_rad.cos() / meters_per_degree_lng * direction_accuracy_rad;
    from_speed
        .hypot(from_direction)
        .max(MIN_SPEED_ACCURACY / meters_per_degree_lng)
}

/// Kalman filter over geographic coordinates and altitude.
#[derive(Clone, Debug)]
pub struct GeoKalmanFilter {
    filter: LinearKalmanFilter,
}
impl GeoKalmanFilter {
    /// Create a filter from physical process noise parameters.
    ///
    /// # Errors
    /// Propagates [crate::FilterError::InvalidProcessNoise] from the linear filter.
    pub fn new(process_noise: &GeoProcessNoise) -> Result<Self> {
        Ok(GeoKalmanFilter {
            filter: LinearKalmanFilter::new(&process_noise.to_process_noise())?,
        })
    }
    /// The underlying linear filter, in internal units.
    pub fn filter(&self) -> &LinearKalmanFilter {
        &self.filter
    }
    /// Convert a fix into the linear filter's units, linearized at the fix's own latitude.
    pub fn to_observation(fix: &GeoObservation) -> Observation {
        let meters_per_degree_lat = fast_meters_per_degree_latitude(fix.latitude);
        let meters_per_degree_lng = fast_meters_per_degree_longitude(fix.latitude);
        let direction_rad = fix.direction.to_radians();
        let direction_accuracy_rad = fix.direction_accuracy.to_radians();
        Observation {
            x: fix.latitude,
            y: fix.longitude,
            z: fix.altitude,
            vx: fix.speed * direction_rad.cos() / meters_per_degree_lat,
            vy: fix.speed * direction_rad.sin() / meters_per_degree_lng,
            // vertical speed is never observed
            vz: 0.0,
            x_accuracy: fix.horizontal_accuracy / meters_per_degree_lat,
            y_accuracy: fix.horizontal_accuracy / meters_per_degree_lng,
            z_accuracy: fix.vertical_accuracy,
            vx_accuracy: latitude_velocity_accuracy(
                fix.speed,
                fix.speed_accuracy,
                direction_rad,
                direction_accuracy_rad,
                meters_per_degree_lat,
            ),
            vy_accuracy: longitude_velocity_accuracy(
                fix.speed,
                fix.speed_accuracy,
                direction_rad,
                direction_accuracy_rad,
                meters_per_degree_lng,
            ),
            vz_accuracy: MIN_SPEED_ACCURACY,
        }
    }
}
impl NavigationFilter for GeoKalmanFilter {
    type Observation = GeoObservation;
    type Estimate = GeoEstimate;

    fn observe(&mut self, dt: f64, observation: &GeoObservation) -> Result<()> {
        self.filter.observe(dt, &Self::to_observation(observation))
    }
    fn estimate(&self) -> Option<GeoEstimate> {
        let estimate = self.filter.estimate()?;
        let state = estimate.state;
        let covariance = estimate.covariance;
        let meters_per_degree_lat = fast_meters_per_degree_latitude(state[X]);
        let meters_per_degree_lng = fast_meters_per_degree_longitude(state[X]);
        let north_speed = state[VX] * meters_per_degree_lat;
        let east_speed = state[VY] * meters_per_degree_lng;
        let lat_accuracy = covariance[(X, X)].sqrt() * meters_per_degree_lat;
        let lng_accuracy = covariance[(Y, Y)].sqrt() * meters_per_degree_lng;
        Some(GeoEstimate {
            latitude: state[X],
            longitude: state[Y],
            altitude: state[Z],
            speed: north_speed.hypot(east_speed),
            direction: wrap_to_360(east_speed.atan2(north_speed).to_degrees()),
            horizontal_accuracy: lat_accuracy.max(lng_accuracy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterError;
    use crate::linalg::{VZ, Z};
    use assert_approx_eq::assert_approx_eq;

    fn stationary_fix(latitude: f64, longitude: f64, horizontal_accuracy: f64) -> GeoObservation {
        GeoObservation {
            latitude,
            longitude,
            altitude: 100.0,
            speed: 0.0,
            speed_accuracy: 0.01,
            direction: 0.0,
            direction_accuracy: 5.0,
            horizontal_accuracy,
            vertical_accuracy: 10.0,
        }
    }

    #[test]
    fn latitude_velocity_accuracy_reference() {
        let acc = latitude_velocity_accuracy(
            10.0,
            1.0,
            45.0_f64.to_radians(),
            5.0_f64.to_radians(),
            fast_meters_per_degree_latitude(43.0),
        );
        assert_approx_eq!(acc, 8.447849136425959e-06, 1e-12);
    }

    #[test]
    fn longitude_velocity_accuracy_reference() {
        let acc = longitude_velocity_accuracy(
            10.0,
            1.0,
            45.0_f64.to_radians(),
            5.0_f64.to_radians(),
            fast_meters_per_degree_longitude(43.0),
        );
        assert_approx_eq!(acc, 1.1509487689869777e-05, 1e-12);
    }

    #[test]
    fn velocity_accuracy_floor() {
        let m = fast_meters_per_degree_latitude(43.0);
        assert_eq!(
            latitude_velocity_accuracy(0.0, 0.0, 0.0, 0.0, m),
            MIN_SPEED_ACCURACY / m
        );
        assert_eq!(
            longitude_velocity_accuracy(0.0, 0.01, 0.0, 0.0, m),
            MIN_SPEED_ACCURACY / m
        );
    }

    #[test]
    fn process_noise_conversion() {
        let noise = GeoProcessNoise {
            base_latitude: 43.0,
            distance_per_second: 2.0,
            speed_per_second: 0.5,
        }
        .to_process_noise();
        let lat_m = fast_meters_per_degree_latitude(43.0);
        let lng_m = fast_meters_per_degree_longitude(43.0);
        assert_eq!(noise.time_step, 1.0);
        assert_approx_eq!(noise.x_step * lat_m, 2.0 / SQRT_2, 1e-12);
        assert_approx_eq!(noise.y_step * lng_m, 2.0 / SQRT_2, 1e-12);
        assert_approx_eq!(noise.z_step, 2.0 * 0.08715574274765817, 1e-12);
        assert_approx_eq!(noise.vx_step * lat_m, 0.5 / SQRT_2, 1e-12);
        assert_approx_eq!(noise.vz_step, 0.5 * 0.08715574274765817, 1e-12);
    }

    #[test]
    fn observation_conversion() {
        let fix = GeoObservation {
            latitude: 43.0,
            longitude: -71.0,
            altitude: 12.0,
            speed: 10.0,
            speed_accuracy: 1.0,
            direction: 90.0,
            direction_accuracy: 5.0,
            horizontal_accuracy: 20.0,
            vertical_accuracy: 3.0,
        };
        let ob = GeoKalmanFilter::to_observation(&fix);
        let lat_m = fast_meters_per_degree_latitude(43.0);
        let lng_m = fast_meters_per_degree_longitude(43.0);
        assert_approx_eq!(ob.vx * lat_m, 0.0, 1e-9);
        assert_approx_eq!(ob.vy * lng_m, 10.0, 1e-9);
        assert_eq!(ob.vz, 0.0);
        assert_approx_eq!(ob.x_accuracy * lat_m, 20.0, 1e-9);
        assert_approx_eq!(ob.y_accuracy * lng_m, 20.0, 1e-9);
        assert_eq!(ob.z_accuracy, 3.0);
        assert_eq!(ob.vz_accuracy, MIN_SPEED_ACCURACY);
        // heading east: direction error moves the north component, speed error the east one
        assert_approx_eq!(ob.vx_accuracy * lat_m, 10.0 * 5.0_f64.to_radians(), 1e-9);
        assert_approx_eq!(ob.vy_accuracy * lng_m, 1.0, 1e-9);
    }

    #[test]
    fn invalid_process_noise_is_unreachable_from_geo_parameters() {
        // the time step is always one second, so any geographic parameters are accepted
        assert!(
            GeoKalmanFilter::new(&GeoProcessNoise {
                base_latitude: 89.0,
                distance_per_second: 100.0,
                speed_per_second: 10.0,
            })
            .is_ok()
        );
    }

    #[test]
    fn estimate_none_before_first_fix() {
        let filter = GeoKalmanFilter::new(&GeoProcessNoise::default()).unwrap();
        assert!(filter.estimate().is_none());
    }

    #[test]
    fn improve_geo_accuracy() {
        let mut filter = GeoKalmanFilter::new(&GeoProcessNoise::default()).unwrap();
        let fix = stationary_fix(43.0, -71.0, 100.0);

        filter.observe(0.0, &fix).unwrap();
        let e = filter.estimate().unwrap();
        assert_approx_eq!(e.latitude, 43.0, 1e-9);
        assert_approx_eq!(e.longitude, -71.0, 1e-9);
        assert_approx_eq!(e.altitude, 100.0, 1e-9);
        assert_approx_eq!(e.horizontal_accuracy, 100.0, 1e-6);
        assert_eq!(e.speed, 0.0);

        // Documented behavior: sigma shrinks by 1/sqrt(n) for n identical simultaneous fixes.
        filter.observe(0.0, &fix).unwrap();
        let e = filter.estimate().unwrap();
        assert_approx_eq!(e.latitude, 43.0, 0.01);
        assert_approx_eq!(e.horizontal_accuracy, 70.71067811865476, 0.01);

        filter.observe(0.0, &fix).unwrap();
        let e = filter.estimate().unwrap();
        assert_approx_eq!(e.longitude, -71.0, 0.01);
        assert_approx_eq!(e.horizontal_accuracy, 57.73502691896258, 0.01);
    }

    #[test]
    fn more_recent_is_better() {
        let mut filter = GeoKalmanFilter::new(&GeoProcessNoise {
            base_latitude: 43.0,
            distance_per_second: 1.0,
            speed_per_second: 0.1,
        })
        .unwrap();
        let mut fix = stationary_fix(43.0, -71.0, 10.0);
        filter.observe(0.0, &fix).unwrap();
        let e = filter.estimate().unwrap();
        assert_approx_eq!(e.horizontal_accuracy, 10.0, 0.0001);

        // Equal accuracy, but the second fix comes 100 seconds later and wins.
        fix.latitude = 43.01;
        filter.observe(100.0, &fix).unwrap();
        let e = filter.estimate().unwrap();
        assert_approx_eq!(e.latitude, 43.00713, 0.0001);
        assert!(e.latitude > 43.005);
        assert_approx_eq!(e.longitude, -71.0, 1e-9);
    }

    #[test]
    fn heading_is_reconstructed() {
        for direction in [0.0, 45.0, 90.0, 180.0, 270.0] {
            let mut filter = GeoKalmanFilter::new(&GeoProcessNoise::default()).unwrap();
            let fix = GeoObservation {
                speed: 10.0,
                speed_accuracy: 0.5,
                direction,
                ..stationary_fix(43.0, -71.0, 10.0)
            };
            filter.observe(0.0, &fix).unwrap();
            let e = filter.estimate().unwrap();
            assert_approx_eq!(e.speed, 10.0, 1e-9);
            assert_approx_eq!(e.direction, direction, 1e-6);
        }
    }

    #[test]
    fn vertical_velocity_is_pinned_to_zero() {
        let mut filter = GeoKalmanFilter::new(&GeoProcessNoise::default()).unwrap();
        filter
            .observe(0.0, &stationary_fix(43.0, -71.0, 10.0))
            .unwrap();
        let e = filter.filter().estimate().unwrap();
        assert_eq!(e.state[VZ], 0.0);
        assert_approx_eq!(e.covariance[(VZ, VZ)], MIN_SPEED_ACCURACY.powi(2), 1e-15);
        assert_approx_eq!(e.covariance[(Z, Z)], 100.0, 1e-9);
    }

    #[test]
    fn exact_fixes_can_be_singular() {
        let mut filter = GeoKalmanFilter::new(&GeoProcessNoise::default()).unwrap();
        let fix = GeoObservation {
            vertical_accuracy: 0.0,
            ..stationary_fix(43.0, -71.0, 0.0)
        };
        filter.observe(0.0, &fix).unwrap();
        let before = filter.estimate();
        assert_eq!(filter.observe(0.0, &fix), Err(FilterError::SingularMatrix));
        assert_eq!(filter.estimate(), before);
    }
}
