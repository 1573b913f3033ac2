//! Scaled-decimal representation of doubles.
//!
//! A finite double can ride the integer path when some scaling `10^k`,
//! `k <= 12`, turns its magnitude into an exact unsigned integer without
//! shrinking it (`scaled >= abs` guards against the scaling itself
//! rounding). The probe tests scales 0, 4, 8 and 12 as gates and refines
//! linearly inside the first tier that passes, so the common no-fraction and
//! few-places cases settle in a handful of multiplies.

pub(crate) const POWERS_OF_TEN: [f64; 13] = [
    1.0,
    10.0,
    100.0,
    1_000.0,
    10_000.0,
    100_000.0,
    1_000_000.0,
    10_000_000.0,
    100_000_000.0,
    1_000_000_000.0,
    10_000_000_000.0,
    100_000_000_000.0,
    1_000_000_000_000.0,
];

/// Mantissas at or above this do not qualify for the scaled form.
pub(crate) const MANTISSA_LIMIT: u64 = 1 << 48;

#[inline]
fn exact(scaled: f64, abs: f64) -> bool {
    scaled == (scaled as u64) as f64 && scaled >= abs
}

/// Smallest number of decimal places that scales `abs` (non-negative,
/// finite) to an exact integer, with the scaled value itself. `None` when no
/// scale in `0..=12` works.
pub(crate) fn decimal_places(abs: f64) -> Option<(u8, f64)> {
    if exact(abs, abs) {
        return Some((0, abs));
    }
    for tier in [4usize, 8, 12] {
        let gate = abs * POWERS_OF_TEN[tier];
        if exact(gate, abs) {
            for k in tier - 3..tier {
                let scaled = abs * POWERS_OF_TEN[k];
                if exact(scaled, abs) {
                    return Some((k as u8, scaled));
                }
            }
            return Some((tier as u8, gate));
        }
    }
    None
}

/// Rebuilds the double from its wire parts.
#[inline]
pub(crate) fn from_parts(places: usize, mantissa: u64, negative: bool) -> f64 {
    let value = mantissa as f64 / POWERS_OF_TEN[places];
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_take_zero_places() {
        assert_eq!(decimal_places(0.0), Some((0, 0.0)));
        assert_eq!(decimal_places(1.0), Some((0, 1.0)));
        assert_eq!(decimal_places(123456789.0), Some((0, 123456789.0)));
    }

    #[test]
    fn fractions_take_minimal_places() {
        assert_eq!(decimal_places(1.5), Some((1, 15.0)));
        assert_eq!(decimal_places(0.25), Some((2, 25.0)));
        assert_eq!(decimal_places(3.141), Some((3, 3141.0)));
        assert_eq!(decimal_places(0.0001), Some((4, 1.0)));
        assert_eq!(decimal_places(1.00000001), Some((8, 100000001.0)));
        assert_eq!(decimal_places(0.000000000001), Some((12, 1.0)));
    }

    #[test]
    fn unrepresentable_magnitudes_bail() {
        assert!(decimal_places(1e-18).is_none());
        assert!(decimal_places(0.1 + 0.2).is_none());
        assert!(decimal_places(f64::MAX).is_none());
    }

    #[test]
    fn reconstruction_matches() {
        for value in [0.0, 1.5, 0.25, 3.141, 42.0, 0.0001] {
            let (places, scaled) = decimal_places(value).unwrap();
            assert_eq!(from_parts(places as usize, scaled as u64, false), value);
            if value != 0.0 {
                assert_eq!(from_parts(places as usize, scaled as u64, true), -value);
            }
        }
    }
}
