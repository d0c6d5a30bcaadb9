//! Graded membership functions shared by the attribute and relation library.
//!
//! All features in this crate report an *activity* in `[0, 1]`; most of them
//! compute it by running a measured value through a logistic sigmoid.

/// The general sigmoid used throughout the feature library:
/// `sigma(k, m, x) = 1 / (1 + exp(k * (m - x)))`.
///
/// `k` controls steepness, `m` is the midpoint where the curve crosses 0.5.
pub fn sigma(k: f64, m: f64, x: f64) -> f64 {
    1.0 / (1.0 + (k * (m - x)).exp())
}

/// `1 - sigma(k, m, x)`, i.e. a sigmoid that falls off rather than rises.
pub fn sigma_inv(k: f64, m: f64, x: f64) -> f64 {
    1.0 - sigma(k, m, x)
}

/// Graded "close to zero" membership: 1 at `x == 0`, falling off as `x` grows.
/// Used by `left_most`/`right_most`/`top_most` and the `single` attribute.
pub fn close_membership(x: f64) -> f64 {
    sigma_inv(10.0, 0.1, x.abs())
}

/// Clamp a value produced by arithmetic on activities back into `[0, 1]`.
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigma_is_half_at_midpoint() {
        assert_relative_eq!(sigma(4.0, 1.8, 1.8), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn sigma_inv_complements_sigma() {
        for x in [-2.0, 0.0, 0.5, 3.0] {
            assert_relative_eq!(sigma(4.0, 1.0, x) + sigma_inv(4.0, 1.0, x), 1.0, epsilon = 1e-9);
        }
    }
}
