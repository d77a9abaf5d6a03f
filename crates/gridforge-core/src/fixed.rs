use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Belt speeds and lane capacities are carried in this type so that sums
/// and minimums over a component do not depend on reduction order.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use at data boundaries only.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert an f64 to Fixed64, or `None` when it is NaN, infinite, or
/// outside the representable range.
#[inline]
pub fn checked_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    Fixed64::checked_from_num(v)
}

/// Convert Fixed64 to f64 for reporting.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Sum an iterator of Fixed64 values, saturating at the numeric bounds.
pub fn saturating_sum<I>(values: I) -> Fixed64
where
    I: IntoIterator<Item = Fixed64>,
{
    values
        .into_iter()
        .fold(Fixed64::ZERO, |acc, v| acc.saturating_add(v))
}
