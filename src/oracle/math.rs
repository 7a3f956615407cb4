//! Exact price arithmetic
//!
//! All aggregation happens in `BigRational` and is rounded to an integer
//! `ScaledPrice` exactly once, at the boundary. Rounding is
//! half-away-from-zero: swapping the rounding rule silently changes
//! consensus prices, so it is fixed here and nowhere else.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;

use crate::types::ScaledPrice;

/// 10^decimals
pub fn scaled_one(decimals: u32) -> BigInt {
    BigInt::from(10u8).pow(decimals)
}

/// Exact rational form of a provider-reported decimal price
pub fn decimal_to_rational(price: Decimal) -> BigRational {
    BigRational::new(BigInt::from(price.mantissa()), scaled_one(price.scale()))
}

/// Re-expand a scaled integer price to its rational value
pub fn scaled_to_rational(price: &ScaledPrice, decimals: u32) -> BigRational {
    BigRational::new(price.clone(), scaled_one(decimals))
}

/// Round `value * 10^decimals` to an integer, half away from zero
pub fn to_scaled_price(value: &BigRational, decimals: u32) -> ScaledPrice {
    let scaled = value * BigRational::from_integer(scaled_one(decimals));
    let (numer, denom) = (scaled.numer(), scaled.denom());

    // BigRational keeps the denominator positive; BigInt division truncates
    // toward zero, so offsetting the numerator by half the denominator in
    // its own direction rounds half away from zero.
    let twice_denom = denom * 2;
    if numer.is_negative() {
        (numer * 2 - denom) / twice_denom
    } else {
        (numer * 2 + denom) / twice_denom
    }
}

/// Median of the candidate prices. Even count: arithmetic mean of the two
/// middle values, still exact.
pub fn median(mut candidates: Vec<BigRational>) -> Option<BigRational> {
    if candidates.is_empty() {
        return None;
    }

    candidates.sort();
    let mid = candidates.len() / 2;
    if candidates.len() % 2 == 1 {
        Some(candidates[mid].clone())
    } else {
        let sum = &candidates[mid - 1] + &candidates[mid];
        Some(sum / BigRational::from_integer(BigInt::from(2)))
    }
}

/// True if the rational is a usable price (strictly positive)
pub fn is_positive_price(value: &BigRational) -> bool {
    value > &BigRational::zero()
}
