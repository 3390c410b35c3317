//! Fixed-size linear algebra helpers for the six-state filter.
//!
//! Public API:
//!     pub type Matrix6 / Vector6
//!     pub fn diagonal_from_accuracies(accuracies: &Vector6) -> Matrix6
//!     pub fn transition_matrix(dt: f64) -> Matrix6
//!     pub fn invert(matrix: &Matrix6) -> Option<Matrix6>
//!     pub fn symmetry_error(matrix: &Matrix6) -> f64
//!
//! Everything is stack allocated (`nalgebra::SMatrix`), so a predict/update cycle never touches
//! the heap. State ordering is `[x, y, z, vx, vy, vz]`: three positions followed by the
//! matching three velocities.
use nalgebra::{SMatrix, SVector};

/// Number of states: three positions and three velocities
pub const STATE_SIZE: usize = 6;

/// Row/column of the first position component
pub const X: usize = 0;
/// Row/column of the second position component
pub const Y: usize = 1;
/// Row/column of the third position component
pub const Z: usize = 2;
/// Row/column of the velocity along [X]
pub const VX: usize = 3;
/// Row/column of the velocity along [Y]
pub const VY: usize = 4;
/// Row/column of the velocity along [Z]
pub const VZ: usize = 5;

/// 6×6 matrix used for covariances, noise, gains, and the transition operator
pub type Matrix6 = SMatrix<f64, STATE_SIZE, STATE_SIZE>;
/// 6×1 vector used for states and observations
pub type Vector6 = SVector<f64, STATE_SIZE>;

/// Build a diagonal covariance from per-axis standard deviations: $\mathrm{diag}(\sigma_i^2)$.
///
/// Axes are assumed independent, so all off-diagonal terms are zero.
#[inline]
pub fn diagonal_from_accuracies(accuracies: &Vector6) -> Matrix6 {
    Matrix6::from_diagonal(&accuracies.component_mul(accuracies))
}
/// Constant-velocity state transition operator for a time step `dt`.
///
/// Identity, except that each position is coupled to its velocity by `dt`:
///
/// $$
/// F = \begin{bmatrix} I_3 & \Delta t \, I_3 \\\\ 0 & I_3 \end{bmatrix}
/// $$
pub fn transition_matrix(dt: f64) -> Matrix6 {
    let mut transition = Matrix6::identity();
    transition[(X, VX)] = dt;
    transition[(Y, VY)] = dt;
    transition[(Z, VZ)] = dt;
    transition
}
/// Invert a 6×6 matrix, returning `None` if it is singular.
///
/// No regularization is attempted: a singular innovation covariance is reported to the caller
/// rather than patched with jitter.
#[inline]
pub fn invert(matrix: &Matrix6) -> Option<Matrix6> {
    matrix.try_inverse()
}
/// Largest absolute difference between a matrix and its transpose.
///
/// The textbook covariance update is not guaranteed to stay symmetric in floating point; this
/// is a diagnostic for that drift and is never used to correct it.
pub fn symmetry_error(matrix: &Matrix6) -> f64 {
    (matrix - matrix.transpose()).amax()
}

/* =============================== Tests ==================================== */

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn t_diagonal_from_accuracies() {
        let accuracies = Vector6::new(1.0, 2.0, 3.0, 0.1, 0.2, 0.3);
        let m = diagonal_from_accuracies(&accuracies);
        assert_eq!(m[(X, X)], 1.0);
        assert_eq!(m[(Y, Y)], 4.0);
        assert_eq!(m[(Z, Z)], 9.0);
        assert_approx_eq!(m[(VX, VX)], 0.01, 1e-15);
        assert_approx_eq!(m[(VZ, VZ)], 0.09, 1e-15);
        assert_eq!(m[(X, Y)], 0.0);
        assert_eq!(m[(VY, Z)], 0.0);
    }

    #[test]
    fn t_transition_matrix() {
        let f = transition_matrix(2.5);
        let state = Vector6::new(1.0, 2.0, 3.0, 1.0, -1.0, 0.5);
        let next = f * state;
        assert_eq!(next[X], 3.5);
        assert_eq!(next[Y], -0.5);
        assert_eq!(next[Z], 4.25);
        // velocities are carried through unchanged
        assert_eq!(next[VX], state[VX]);
        assert_eq!(next[VY], state[VY]);
        assert_eq!(next[VZ], state[VZ]);
    }

    #[test]
    fn t_transition_matrix_zero_dt_is_identity() {
        assert_eq!(transition_matrix(0.0), Matrix6::identity());
    }

    #[test]
    fn t_invert() {
        let m = Matrix6::from_diagonal(&Vector6::new(2.0, 4.0, 5.0, 0.5, 0.25, 8.0));
        let inv = invert(&m).expect("diagonal matrix with non-zero entries is invertible");
        let back = m * inv;
        assert!((back - Matrix6::identity()).amax() < 1e-12);
    }

    #[test]
    fn t_invert_singular() {
        let mut m = Matrix6::identity();
        m[(Z, Z)] = 0.0;
        assert!(invert(&m).is_none());
        assert!(invert(&Matrix6::zeros()).is_none());
    }

    #[test]
    fn t_symmetry_error() {
        let mut m = Matrix6::identity();
        assert_eq!(symmetry_error(&m), 0.0);
        m[(X, VX)] = 0.3;
        m[(VX, X)] = 0.1;
        assert_approx_eq!(symmetry_error(&m), 0.2, 1e-15);
    }
}
