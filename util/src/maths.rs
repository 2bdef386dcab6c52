//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Saturating clamp of `value` into `[min, max]`.
///
/// Values at or beyond a bound are pinned to it, values strictly inside are
/// returned unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    saturate(value, min, max).0
}

/// Saturating clamp which also reports whether the value was limited.
///
/// NaN has no position relative to the bounds so it is mapped to zero (or the
/// nearest bound if zero lies outside `[min, max]`) and reported as limited.
pub fn saturate<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: Float
{
    if value.is_nan() {
        let zero = T::zero();
        let fallback = if zero < min {
            min
        }
        else if zero > max {
            max
        }
        else {
            zero
        };
        return (fallback, true)
    }

    if value > max {
        (max, true)
    }
    else if value < min {
        (min, true)
    }
    else {
        (value, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (0f64, 100f64), 0.25), 25.0);
        assert_eq!(lin_map((-100f64, 100f64), (-1f64, 1f64), 50.0), 0.5);
    }

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(120f64, -100.0, 100.0), (100.0, true));
        assert_eq!(saturate(-180f64, -100.0, 100.0), (-100.0, true));
        assert_eq!(saturate(40f64, -100.0, 100.0), (40.0, false));
        assert_eq!(saturate(100f64, -100.0, 100.0), (100.0, false));
        assert_eq!(saturate(f64::INFINITY, -100.0, 100.0), (100.0, true));
        assert_eq!(saturate(f64::NAN, -100.0, 100.0), (0.0, true));
        assert_eq!(saturate(f64::NAN, 10.0, 100.0), (10.0, true));
        assert_eq!(clamp(-0.5f64, 0.0, 1.0), 0.0);
    }
}
