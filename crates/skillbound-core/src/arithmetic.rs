//! # Integer Arithmetic
//!
//! Checked and truncating integer primitives for the statistics engine.
//!
//! Floating point is denied workspace-wide: stored averages depend on the
//! exact truncation of every division, and a rounding difference here would
//! shift every normalized score derived from them.

use crate::error::{LedgerError, Result};

/// Checked addition.
pub fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or(LedgerError::ArithmeticOverflow("add"))
}

/// Checked subtraction.
pub fn sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b)
        .ok_or(LedgerError::ArithmeticOverflow("sub"))
}

/// Checked multiplication.
pub fn mul(a: u64, b: u64) -> Result<u64> {
    a.checked_mul(b)
        .ok_or(LedgerError::ArithmeticOverflow("mul"))
}

/// Truncating division. Fails on a zero divisor instead of panicking.
pub fn div(a: u64, b: u64) -> Result<u64> {
    a.checked_div(b)
        .ok_or(LedgerError::ArithmeticOverflow("div"))
}

/// Absolute difference of two unsigned values.
#[must_use]
pub fn abs_diff(a: u64, b: u64) -> u64 {
    a.abs_diff(b)
}

/// Narrow to `u16`, failing if the value does not fit.
pub fn to_u16(value: u64) -> Result<u16> {
    u16::try_from(value).map_err(|_| LedgerError::ArithmeticOverflow("narrow to u16"))
}

/// Integer square root by the Babylonian method.
///
/// Starts from `y = x`, `z = (x + 1) / 2` and iterates `z = (x / z + z) / 2`
/// while `z` keeps decreasing. Returns `floor(sqrt(x))`; `isqrt(0) == 0`.
#[must_use]
pub fn isqrt(x: u64) -> u64 {
    let mut y = x;
    // (x + 1) / 2 without overflowing at u64::MAX
    let mut z = x / 2 + x % 2;
    while z < y {
        y = z;
        z = (x / z + z) / 2;
    }
    y
}

/// Truncating mean of a byte sequence; `None` when empty.
#[must_use]
pub fn mean_u8(values: &[u8]) -> Option<u8> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    Some((sum / values.len() as u64) as u8)
}

// =============================================================================
// TESTS
// =============================================================================
