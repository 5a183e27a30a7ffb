//! Floating point equality measured in units in the last place (ULP).
//!
//! Two floats are compared by mapping their bit patterns onto a monotonic unsigned integer
//! line, where `-0.0` and `+0.0` share a position, and counting the representable values
//! between them.

use num_traits::Float;

/// Default tolerance used by [`float_equal`] callers that have no better estimate.
pub const DEFAULT_MAX_ULP: u64 = 4;

/// A floating point type whose bit pattern can be mapped to a biased integer.
pub trait UlpFloat: Float {
    /// The number of representable values between `self` and `other`.
    ///
    /// Meaningless if either value is NaN; use [`ulp_distance`] for a checked version.
    fn biased_distance(self, other: Self) -> u64;
}

macro_rules! impl_ulp_float {
    ($float:ty, $bits:ty) => {
        impl UlpFloat for $float {
            #[inline]
            fn biased_distance(self, other: Self) -> u64 {
                const SIGN_MASK: $bits = 1 << (<$bits>::BITS - 1);

                // Sign-magnitude to biased: negative values are reflected below the sign bit,
                // non-negative values are shifted above it.
                let to_biased = |bits: $bits| -> $bits {
                    if bits & SIGN_MASK != 0 {
                        (!bits).wrapping_add(1)
                    } else {
                        bits | SIGN_MASK
                    }
                };

                let lhs = to_biased(self.to_bits());
                let rhs = to_biased(other.to_bits());
                u64::from(lhs.abs_diff(rhs))
            }
        }
    };
}

impl_ulp_float!(f32, u32);
impl_ulp_float!(f64, u64);

/// The ULP distance between two floats, or `None` if either is NaN.
///
/// ```
/// use geoarrow_bounds::algorithm::native::eq::ulp_distance;
///
/// assert_eq!(ulp_distance(1.0f64, 1.0), Some(0));
/// assert_eq!(ulp_distance(0.0f32, -0.0), Some(0));
/// assert_eq!(ulp_distance(f64::NAN, 1.0), None);
/// ```
pub fn ulp_distance<T: UlpFloat>(lhs: T, rhs: T) -> Option<u64> {
    if lhs.is_nan() || rhs.is_nan() {
        None
    } else {
        Some(lhs.biased_distance(rhs))
    }
}

/// Returns `true` if `lhs` and `rhs` are within `MAX_ULP` representable values of each other.
///
/// NaN never compares equal, not even to itself. Infinities compare equal to themselves.
///
/// ```
/// use geoarrow_bounds::algorithm::native::eq::{float_equal, DEFAULT_MAX_ULP};
///
/// let sum = 0.1f64 + 0.2;
/// assert!(sum != 0.3);
/// assert!(float_equal::<DEFAULT_MAX_ULP, _>(sum, 0.3));
/// assert!(!float_equal::<0, _>(sum, 0.3));
/// ```
pub fn float_equal<const MAX_ULP: u64, T: UlpFloat>(lhs: T, rhs: T) -> bool {
    ulp_distance(lhs, rhs).is_some_and(|distance| distance <= MAX_ULP)
}
