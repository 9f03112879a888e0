//! Numeric and image interoperability helpers.

pub mod safe_cast;

#[cfg(feature = "opencv")]
pub mod image_conversion;
