use crate::FsError;

/// Floating point type used throughout the workspace.
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, FsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FsError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, FsError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(FsError::NonPositive { what, value: v })
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(v: Real, decimals: u32) -> Real {
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        assert!(format!("{err}").contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(1.5, "x").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "x"),
            Err(FsError::NonPositive { .. })
        ));
        assert!(ensure_positive(-3.0, "x").is_err());
        assert!(matches!(
            ensure_positive(Real::INFINITY, "x"),
            Err(FsError::NonFinite { .. })
        ));
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(0.552_631_578, 2), 0.55);
        assert_eq!(round_to(1.5, 2), 1.5);
        assert_eq!(round_to(0.9947, 2), 0.99);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rounding_is_idempotent(v in -1e6f64..1e6, decimals in 0u32..6) {
            let once = round_to(v, decimals);
            prop_assert_eq!(round_to(once, decimals), once);
            prop_assert!((once - v).abs() <= 0.5 * 10f64.powi(-(decimals as i32)) + 1e-9);
        }
    }
}
