//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturate a value between min and max.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap an angle in radians into the range (-pi, pi].
///
/// Works for angles spanning any number of full rotations, not just the
/// single-wrap case of a difference between two normalised headings.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float + std::ops::Rem,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    pi_t - rem_euclid(pi_t - angle, tau_t)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Rem,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_to_pi() {
        assert_eq!(wrap_to_pi(0f64), 0f64);
        assert_eq!(wrap_to_pi(PI), PI);
        assert_eq!(wrap_to_pi(-PI), PI);
        assert_eq!(wrap_to_pi(TAU), 0f64);

        // Single-wrap differences, as produced by two normalised headings
        assert!((wrap_to_pi(1.5 * PI) - (-0.5 * PI)).abs() < 1e-12);
        assert!((wrap_to_pi(-1.5 * PI) - (0.5 * PI)).abs() < 1e-12);

        // Angles spanning multiple full rotations
        assert!((wrap_to_pi(5.0 * TAU + 1.0) - 1.0).abs() < 1e-9);
        assert!((wrap_to_pi(-7.0 * TAU - 1.0) - (-1.0)).abs() < 1e-9);

        // Result is always in (-pi, pi]
        for i in -100..100 {
            let wrapped = wrap_to_pi(0.17 * i as f64);
            assert!(wrapped > -PI && wrapped <= PI);
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&45f64, &-30f64, &30f64), 30f64);
        assert_eq!(clamp(&-45f64, &-30f64, &30f64), -30f64);
        assert_eq!(clamp(&12f64, &-30f64, &30f64), 12f64);
    }
}
