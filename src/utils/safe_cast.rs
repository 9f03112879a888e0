//! Checked and saturating numeric conversions for pixel arithmetic

use crate::{Error, Result};

/// Safely convert usize to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds `i32::MAX`
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Truncate toward zero and saturate at the i32 bounds; NaN maps to 0
#[must_use]
#[allow(clippy::cast_possible_truncation)] // `as` saturates for float -> int
pub fn f32_to_i32_saturating(value: f32) -> i32 {
    value as i32
}

/// Truncate toward zero and saturate at the i32 bounds; NaN maps to 0
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn f64_to_i32_saturating(value: f64) -> i32 {
    value as i32
}

/// Round half to even and saturate into `0..=255`, as 8-bit image kernels do
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped first
pub fn f32_to_u8_rounded(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
