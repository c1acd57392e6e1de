//! Timestamp translation between stream time bases.

use ffmpeg_next::{Rational, Rescale, Rounding};

/// Rescales `value` ticks of `from` into ticks of `to`, i.e.
/// `value * from / to`, rounding half away from zero.
///
/// FFmpeg carries the product in 128 bits, so timestamps close to `i64::MAX`
/// do not overflow as long as the result fits.
///
/// # Panics
///
/// Panics if either time base has a zero denominator, or if `to` is zero.
pub fn rescale(value: i64, from: Rational, to: Rational) -> i64 {
    assert_valid(from, to);
    value.rescale_with(from, to, Rounding::NearestInfinity)
}

pub(crate) fn assert_valid(from: Rational, to: Rational) {
    assert!(
        from.denominator() != 0 && to.denominator() != 0,
        "time base denominator cannot be zero"
    );
    assert!(to.numerator() != 0, "cannot rescale into a zero time base");
}
