//! Earth-related constants and functions
//!
//! This module contains the small amount of geodesy the geographic filter needs: the length
//! of one degree of latitude and of longitude at a given latitude, plus two short-range helpers
//! for distance and bearing between geographic points. The Earth is treated locally as flat:
//! a small patch around a given latitude is linearized with the meters-per-degree factors at
//! that latitude. Those factors vary considerably with latitude (a degree of longitude is about
//! 111 km at the equator and shrinks to nothing at the poles), so callers are expected to
//! recompute them at the point of interest rather than use a single global constant.
//!
//! # Meters per degree
//! The reference factors are the usual trigonometric series in multiples of the latitude
//! $\phi$:
//!
//! $$
//! m_{lat}(\phi) = 111132.92 - 559.82 \cos 2\phi + 1.175 \cos 4\phi - 0.0023 \cos 6\phi
//! $$
//!
//! $$
//! m_{lng}(\phi) = 111412.84 \cos \phi - 93.5 \cos 3\phi + 0.118 \cos 5\phi
//! $$
//!
//! The filter evaluates these on every observation and every estimate, so the `fast_` variants
//! interpolate linearly in a table of whole-degree values instead of evaluating the series. The
//! relative interpolation error stays below $10^{-4}$, far below anything a position fix can
//! resolve.
use std::sync::LazyLock;

use crate::wrap_to_360;

/// Latitude (degrees) at which [approximate_distance] linearizes the Earth.
pub const REFERENCE_LATITUDE: f64 = 40.0;
/// Approximate meters per degree of latitude at [REFERENCE_LATITUDE]
pub static APPROXIMATE_METERS_PER_DEGREE_LATITUDE: LazyLock<f64> =
    LazyLock::new(|| meters_per_degree_latitude(REFERENCE_LATITUDE));
/// Approximate meters per degree of longitude at [REFERENCE_LATITUDE]
pub static APPROXIMATE_METERS_PER_DEGREE_LONGITUDE: LazyLock<f64> =
    LazyLock::new(|| meters_per_degree_longitude(REFERENCE_LATITUDE));

/// Number of whole-degree entries in the interpolation tables (0 through 90 inclusive)
const TABLE_SIZE: usize = 91;

static LATITUDE_TABLE: LazyLock<[f64; TABLE_SIZE]> =
    LazyLock::new(|| std::array::from_fn(|degree| meters_per_degree_latitude(degree as f64)));
static LONGITUDE_TABLE: LazyLock<[f64; TABLE_SIZE]> =
    LazyLock::new(|| std::array::from_fn(|degree| meters_per_degree_longitude(degree as f64)));

/// Calculate the length of one degree of latitude
///
/// # Parameters
/// - `latitude` - The latitude in degrees
///
/// # Returns
/// The length in meters of one degree of latitude, measured along the meridian at `latitude`.
///
/// # Example
/// ```rust
/// use geokalman::earth;
/// let meters = earth::meters_per_degree_latitude(40.0);
/// assert!((meters - 111034.605288).abs() < 0.01);
/// ```
pub fn meters_per_degree_latitude(latitude: f64) -> f64 {
    let latitude_rad = latitude.to_radians();
    111132.92 - 559.82 * (2.0 * latitude_rad).cos() + 1.175 * (4.0 * latitude_rad).cos()
        - 0.0023 * (6.0 * latitude_rad).cos()
}
/// Calculate the length of one degree of longitude
///
/// # Parameters
/// - `latitude` - The latitude in degrees
///
/// # Returns
/// The length in meters of one degree of longitude along the parallel at `latitude`. This goes
/// to zero at the poles.
///
/// # Example
/// ```rust
/// use geokalman::earth;
/// let meters = earth::meters_per_degree_longitude(40.0);
/// assert!((meters - 85393.826090).abs() < 0.01);
/// ```
pub fn meters_per_degree_longitude(latitude: f64) -> f64 {
    let latitude_rad = latitude.to_radians();
    111412.84 * latitude_rad.cos() - 93.5 * (3.0 * latitude_rad).cos()
        + 0.118 * (5.0 * latitude_rad).cos()
}
/// Fast approximation of [meters_per_degree_latitude]
///
/// Linear interpolation between the whole-degree values of the reference series. Both series
/// are even in latitude, so the southern hemisphere uses the absolute value. Latitudes beyond
/// the poles are clamped to 90 degrees.
pub fn fast_meters_per_degree_latitude(latitude: f64) -> f64 {
    interpolate(&LATITUDE_TABLE, latitude)
}
/// Fast approximation of [meters_per_degree_longitude]
///
/// See [fast_meters_per_degree_latitude] for the interpolation scheme.
pub fn fast_meters_per_degree_longitude(latitude: f64) -> f64 {
    interpolate(&LONGITUDE_TABLE, latitude)
}
fn interpolate(table: &[f64; TABLE_SIZE], latitude: f64) -> f64 {
    let latitude = latitude.abs().min(90.0);
    let index = latitude.floor() as usize;
    if index >= TABLE_SIZE - 1 {
        return table[TABLE_SIZE - 1];
    }
    let fraction = latitude - index as f64;
    table[index] + (table[index + 1] - table[index]) * fraction
}
/// Approximate distance between two points
///
/// Euclidean distance in a flat frame linearized at [REFERENCE_LATITUDE]. Only meaningful for
/// short spans (a few kilometers) at mid latitudes; this is not a geodesic distance.
///
/// # Parameters
/// - `lat1`, `lng1` - The first point, degrees
/// - `lat2`, `lng2` - The second point, degrees
///
/// # Returns
/// The approximate distance in meters.
///
/// # Example
/// ```rust
/// use geokalman::earth;
/// let d = earth::approximate_distance(40.0, -73.0, 40.0001, -73.0001);
/// assert!((d - 14.007423).abs() < 0.01);
/// ```
pub fn approximate_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let delta_lat = (lat1 - lat2) * *APPROXIMATE_METERS_PER_DEGREE_LATITUDE;
    let delta_lng = (lng1 - lng2) * *APPROXIMATE_METERS_PER_DEGREE_LONGITUDE;
    delta_lat.hypot(delta_lng)
}
/// Bearing from the first point to the second
///
/// Computed on the raw degree differences, so like [approximate_distance] it is a short-range
/// approximation.
///
/// # Returns
/// The direction of travel from point 1 to point 2, in degrees clockwise from north in the
/// range [0, 360).
///
/// # Example
/// ```rust
/// use geokalman::earth;
/// let east = earth::bearing(40.0, 10.0, 40.0, 10.1);
/// assert!((east - 90.0).abs() < 1e-9);
/// ```
pub fn bearing(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let delta_lat = lat2 - lat1;
    let delta_lng = lng2 - lng1;
    wrap_to_360(delta_lng.atan2(delta_lat).to_degrees())
}

// === Unit tests ===
#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    #[test]
    fn meters_per_degree_latitude() {
        assert_approx_eq!(super::meters_per_degree_latitude(40.0), 111034.605288, 0.01);
        assert_approx_eq!(super::meters_per_degree_latitude(0.0), 110574.2727, 0.001);
        assert_approx_eq!(super::meters_per_degree_latitude(90.0), 111693.9173, 0.001);
    }
    #[test]
    fn meters_per_degree_longitude() {
        assert_approx_eq!(super::meters_per_degree_longitude(40.0), 85393.826090, 0.01);
        assert_approx_eq!(super::meters_per_degree_longitude(90.0), 0.0, 0.001);
    }
    #[test]
    fn fast_meters_per_degree_latitude() {
        assert_approx_eq!(super::fast_meters_per_degree_latitude(0.0), 110574.2727, 0.001);
        assert_approx_eq!(super::fast_meters_per_degree_latitude(90.0), 111693.9173, 0.001);
        assert_approx_eq!(super::fast_meters_per_degree_latitude(2.1), 110575.793897, 0.001);
    }
    #[test]
    fn fast_meters_per_degree_longitude() {
        assert_approx_eq!(super::fast_meters_per_degree_longitude(0.0), 111319.458, 0.001);
        assert_approx_eq!(super::fast_meters_per_degree_longitude(90.0), 0.0, 0.001);
        assert_approx_eq!(super::fast_meters_per_degree_longitude(2.1), 111243.6806156, 0.001);
    }
    #[test]
    fn fast_factors_track_reference() {
        let mut latitude = -89.75;
        while latitude < 90.0 {
            let lat_error = super::fast_meters_per_degree_latitude(latitude)
                - super::meters_per_degree_latitude(latitude);
            let lng_error = super::fast_meters_per_degree_longitude(latitude)
                - super::meters_per_degree_longitude(latitude);
            assert!(lat_error.abs() < 0.1, "latitude factor off by {lat_error} at {latitude}");
            assert!(lng_error.abs() < 5.0, "longitude factor off by {lng_error} at {latitude}");
            latitude += 0.5;
        }
    }
    #[test]
    fn fast_factors_are_symmetric_and_clamped() {
        assert_eq!(
            super::fast_meters_per_degree_latitude(-43.2),
            super::fast_meters_per_degree_latitude(43.2)
        );
        assert_eq!(
            super::fast_meters_per_degree_longitude(-43.2),
            super::fast_meters_per_degree_longitude(43.2)
        );
        assert_eq!(
            super::fast_meters_per_degree_latitude(95.0),
            super::fast_meters_per_degree_latitude(90.0)
        );
    }
    #[test]
    fn approximate_distance() {
        assert_approx_eq!(super::approximate_distance(40.0, -73.0, 40.0001, -73.0001), 14.007423, 0.01);
        assert_eq!(super::approximate_distance(40.0, -73.0, 40.0, -73.0), 0.0);
    }
    #[test]
    fn bearing() {
        assert_approx_eq!(super::bearing(40.0, 10.0, 40.1, 10.0), 0.0, 0.01);
        assert_approx_eq!(super::bearing(40.0, 10.0, 40.1, 10.1), 45.0, 0.01);
        assert_approx_eq!(super::bearing(40.0, 10.0, 40.0, 10.1), 90.0, 0.01);
        assert_approx_eq!(super::bearing(40.0, 10.0, 39.0, 10.0), 180.0, 0.01);
        assert_approx_eq!(super::bearing(40.0, 10.0, 40.0, 9.0), 270.0, 0.01);
    }
}
