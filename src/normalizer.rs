//! Classifier input preparation.
//!
//! The classifier only produces meaningful scores when its input matches the
//! preprocessing it was trained with. Every step here is therefore fixed and
//! deterministic:
//!
//! 1. Convert the crop to the training channel order (RGB)
//! 2. Apply `|p * contrast + brightness|`, rounded and saturated to 8 bits
//! 3. Resize to the square input size with bilinear interpolation
//! 4. Scale intensities to `[0, 1]` and add a batch dimension
//!
//! With the `opencv` feature steps 1-3 run through OpenCV, the same kernels
//! the model was trained with. Without it a pure Rust port of OpenCV's 8-bit
//! fixed-point kernels is used.

use crate::{
    constants::{DEFAULT_BRIGHTNESS, DEFAULT_CLASSIFIER_INPUT_SIZE, DEFAULT_CONTRAST},
    frame::{ChannelOrder, Frame},
    Error, Result,
};
use ndarray::Array4;

/// Preprocessing parameters, mirrored from the classifier's training setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerSettings {
    /// Side length of the square output
    pub target_size: usize,
    /// Multiplier applied to every channel value
    pub contrast: f32,
    /// Offset added after the multiplier
    pub brightness: f32,
    /// Channel order the classifier was trained on
    pub channel_order: ChannelOrder,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_CLASSIFIER_INPUT_SIZE,
            contrast: DEFAULT_CONTRAST,
            brightness: DEFAULT_BRIGHTNESS,
            channel_order: ChannelOrder::Rgb,
        }
    }
}

/// Single-item NHWC batch with values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    tensor: Array4<f32>,
}

impl NormalizedImage {
    #[must_use]
    pub fn tensor(&self) -> &Array4<f32> {
        &self.tensor
    }

    #[must_use]
    pub fn into_tensor(self) -> Array4<f32> {
        self.tensor
    }

    /// `[batch, height, width, channels]`
    #[must_use]
    pub fn shape(&self) -> [usize; 4] {
        let (n, h, w, c) = self.tensor.dim();
        [n, h, w, c]
    }
}

/// Turns hand crops into classifier input tensors
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    settings: NormalizerSettings,
}

impl ImageNormalizer {
    /// Create a normalizer
    ///
    /// # Errors
    ///
    /// Returns an error if the target size is zero or the adjustment
    /// parameters are not finite.
    pub fn new(settings: NormalizerSettings) -> Result<Self> {
        if settings.target_size == 0 {
            return Err(Error::InvalidInput("Target size must be greater than 0".to_string()));
        }
        if !settings.contrast.is_finite() || !settings.brightness.is_finite() {
            return Err(Error::InvalidInput(
                "Contrast and brightness must be finite".to_string(),
            ));
        }
        Ok(Self { settings })
    }

    #[must_use]
    pub fn settings(&self) -> &NormalizerSettings {
        &self.settings
    }

    /// Shape of every tensor this normalizer produces
    #[must_use]
    pub fn output_shape(&self) -> [usize; 4] {
        [1, self.settings.target_size, self.settings.target_size, 3]
    }

    /// Full preprocessing of a hand crop
    ///
    /// # Errors
    ///
    /// Returns an error if an image operation fails.
    pub fn normalize(&self, crop: &Frame) -> Result<NormalizedImage> {
        let prepared = self.prepare(crop)?;
        self.to_tensor(&prepared)
    }

    /// Color conversion and contrast adjustment at the crop's own resolution.
    ///
    /// This is the image the classifier sees before resizing; it doubles as
    /// the model input preview.
    ///
    /// # Errors
    ///
    /// Returns an error if an OpenCV call fails.
    pub fn prepare(&self, crop: &Frame) -> Result<Frame> {
        #[cfg(feature = "opencv")]
        {
            cv::prepare(crop, &self.settings)
        }
        #[cfg(not(feature = "opencv"))]
        {
            Ok(portable::prepare(crop, &self.settings))
        }
    }

    /// Resize a prepared crop and scale it to `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if the resize fails.
    pub fn to_tensor(&self, prepared: &Frame) -> Result<NormalizedImage> {
        let size = self.settings.target_size;
        let resized = resize_bilinear(prepared, size, size)?;
        let pixels = resized.pixels();
        let tensor = Array4::from_shape_fn((1, size, size, 3), |(_, row, col, ch)| {
            f32::from(pixels[[row, col, ch]]) / 255.0
        });
        Ok(NormalizedImage { tensor })
    }
}

/// Bilinear resize with `INTER_LINEAR` semantics.
///
/// Half-pixel centers, clamped borders, 8-bit fixed-point weights with ties
/// rounded up, and a 2x2 box average when both sides shrink by exactly two.
/// The channel order of `src` is kept.
///
/// # Errors
///
/// Returns an error if either destination dimension is zero.
pub fn resize_bilinear(src: &Frame, dst_width: usize, dst_height: usize) -> Result<Frame> {
    if dst_width == 0 || dst_height == 0 {
        return Err(Error::InvalidInput(format!(
            "Invalid resize target: {dst_width}x{dst_height}"
        )));
    }
    #[cfg(feature = "opencv")]
    {
        cv::resize(src, dst_width, dst_height)
    }
    #[cfg(not(feature = "opencv"))]
    {
        portable::resize(src, dst_width, dst_height)
    }
}

#[cfg(feature = "opencv")]
mod cv {
    use super::NormalizerSettings;
    use crate::{
        frame::Frame,
        utils::image_conversion::{frame_to_mat_raw, mat_to_frame_with_order},
        utils::safe_cast::usize_to_i32,
        Result,
    };
    use opencv::{
        core::{self, Mat, Size},
        imgproc::{self, InterpolationFlags},
    };

    pub(super) fn prepare(crop: &Frame, settings: &NormalizerSettings) -> Result<Frame> {
        let src = frame_to_mat_raw(crop)?;
        // BGR <-> RGB is the same channel swap in both directions
        let converted = if crop.order() == settings.channel_order {
            src
        } else {
            let mut swapped = Mat::default();
            imgproc::cvt_color(&src, &mut swapped, imgproc::COLOR_BGR2RGB, 0)?;
            swapped
        };

        let mut adjusted = Mat::default();
        core::convert_scale_abs(
            &converted,
            &mut adjusted,
            f64::from(settings.contrast),
            f64::from(settings.brightness),
        )?;
        mat_to_frame_with_order(&adjusted, settings.channel_order)
    }

    pub(super) fn resize(src: &Frame, dst_width: usize, dst_height: usize) -> Result<Frame> {
        let mut resized = Mat::default();
        imgproc::resize(
            &frame_to_mat_raw(src)?,
            &mut resized,
            Size::new(usize_to_i32(dst_width)?, usize_to_i32(dst_height)?),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;
        mat_to_frame_with_order(&resized, src.order())
    }
}

/// Pure Rust versions of the OpenCV 8-bit kernels
#[cfg_attr(feature = "opencv", allow(dead_code))]
mod portable {
    use super::NormalizerSettings;
    use crate::{frame::Frame, utils::safe_cast::f32_to_u8_rounded, Result};
    use ndarray::Array3;

    /// Fractional bits of the interpolation weights
    const COEF_BITS: u32 = 11;
    const COEF_SCALE: i32 = 1 << COEF_BITS;

    pub(super) fn prepare(crop: &Frame, settings: &NormalizerSettings) -> Frame {
        let mut converted = crop.to_order(settings.channel_order);
        let (alpha, beta) = (settings.contrast, settings.brightness);
        converted
            .pixels_mut()
            .mapv_inplace(|p| f32_to_u8_rounded((f32::from(p) * alpha + beta).abs()));
        converted
    }

    /// Per destination index: `(lower, upper, lower_weight, upper_weight)`
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) fn linear_taps(dst_len: usize, src_len: usize) -> Vec<(usize, usize, i32, i32)> {
        let scale = 1.0 / (dst_len as f64 / src_len as f64);
        (0..dst_len)
            .map(|d| {
                let f = ((d as f64 + 0.5) * scale - 0.5) as f32;
                let floor = f.floor();
                let (lower, frac) = if floor < 0.0 {
                    (0, 0.0)
                } else if floor as usize >= src_len - 1 {
                    (src_len - 1, 0.0)
                } else {
                    (floor as usize, f - floor)
                };
                let w0 = ((1.0 - frac) * COEF_SCALE as f32).round_ties_even() as i32;
                let w1 = (frac * COEF_SCALE as f32).round_ties_even() as i32;
                (lower, (lower + 1).min(src_len - 1), w0, w1)
            })
            .collect()
    }

    pub(super) fn resize(src: &Frame, dst_width: usize, dst_height: usize) -> Result<Frame> {
        if src.width() == dst_width * 2 && src.height() == dst_height * 2 {
            return halve(src);
        }

        let xs = linear_taps(dst_width, src.width());
        let ys = linear_taps(dst_height, src.height());
        let pixels = src.pixels();
        let shift = 2 * COEF_BITS;

        let out = Array3::from_shape_fn((dst_height, dst_width, 3), |(row, col, ch)| {
            let (x0, x1, a0, a1) = xs[col];
            let (y0, y1, b0, b1) = ys[row];
            let horizontal =
                |y: usize| i64::from(pixels[[y, x0, ch]]) * i64::from(a0) + i64::from(pixels[[y, x1, ch]]) * i64::from(a1);
            let value = horizontal(y0) * i64::from(b0) + horizontal(y1) * i64::from(b1);
            u8::try_from((value + (1 << (shift - 1))) >> shift).unwrap_or(u8::MAX)
        });
        Frame::new(out, src.order())
    }

    /// Exact 2x downscale: rounded mean of each 2x2 block
    fn halve(src: &Frame) -> Result<Frame> {
        let (width, height) = (src.width() / 2, src.height() / 2);
        let pixels = src.pixels();
        let out = Array3::from_shape_fn((height, width, 3), |(row, col, ch)| {
            let (r, c) = (row * 2, col * 2);
            let sum: u32 = [(r, c), (r, c + 1), (r + 1, c), (r + 1, c + 1)]
                .iter()
                .map(|&(y, x)| u32::from(pixels[[y, x, ch]]))
                .sum();
            u8::try_from((sum + 2) >> 2).unwrap_or(u8::MAX)
        });
        Frame::new(out, src.order())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(NormalizerSettings::default()).unwrap()
    }

    #[test]
    fn test_output_shape_and_range() {
        let crop = Frame::filled(37, 53, [0, 128, 255], ChannelOrder::Bgr).unwrap();
        let image = normalizer().normalize(&crop).unwrap();
        assert_eq!(image.shape(), [1, 128, 128, 3]);
        assert!(image.tensor().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_contrast_then_channel_swap() {
        // BGR (0, 100, 200) -> RGB (200, 100, 0) -> |p * 1.3 + 10|
        let crop = Frame::filled(4, 4, [0, 100, 200], ChannelOrder::Bgr).unwrap();
        let prepared = normalizer().prepare(&crop).unwrap();
        assert_eq!(prepared.order(), ChannelOrder::Rgb);
        assert_eq!(prepared.pixel(0, 0), [255, 140, 10]);

        let image = normalizer().normalize(&crop).unwrap();
        let t = image.tensor();
        assert_eq!(t[[0, 5, 5, 0]], 1.0);
        assert_eq!(t[[0, 5, 5, 1]], 140.0 / 255.0);
        assert_eq!(t[[0, 5, 5, 2]], 10.0 / 255.0);
    }

    #[test]
    fn test_negative_adjustment_is_absolute() {
        let settings = NormalizerSettings {
            contrast: -1.0,
            brightness: 0.0,
            ..NormalizerSettings::default()
        };
        let n = ImageNormalizer::new(settings).unwrap();
        let crop = Frame::filled(2, 2, [50, 60, 70], ChannelOrder::Rgb).unwrap();
        assert_eq!(n.prepare(&crop).unwrap().pixel(0, 0), [50, 60, 70]);
    }

    #[test]
    fn test_deterministic() {
        let pixels = Array3::from_shape_fn((31, 45, 3), |(r, c, ch)| ((r * 7 + c * 13 + ch * 29) % 256) as u8);
        let crop = Frame::new(pixels, ChannelOrder::Bgr).unwrap();
        let a = normalizer().normalize(&crop).unwrap();
        let b = normalizer().normalize(&crop).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resize_identity() {
        let pixels = Array3::from_shape_fn((5, 7, 3), |(r, c, ch)| (r * 10 + c + ch) as u8);
        let frame = Frame::new(pixels, ChannelOrder::Rgb).unwrap();
        let resized = resize_bilinear(&frame, 7, 5).unwrap();
        assert_eq!(resized, frame);
    }

    #[test]
    fn test_resize_upscale_interpolates() {
        // Two columns 0 and 100, upscaled to 4 columns:
        // src x = (d + 0.5) * 0.5 - 0.5 -> -0.25, 0.25, 0.75, 1.25
        let frame = Frame::from_raw(2, 1, vec![0, 0, 0, 100, 100, 100], ChannelOrder::Rgb).unwrap();
        let resized = resize_bilinear(&frame, 4, 1).unwrap();
        let row: Vec<u8> = (0..4).map(|c| resized.pixel(0, c)[0]).collect();
        assert_eq!(row, vec![0, 25, 75, 100]);
    }

    #[test]
    fn test_single_pixel_source() {
        let frame = Frame::filled(1, 1, [9, 8, 7], ChannelOrder::Rgb).unwrap();
        let resized = resize_bilinear(&frame, 3, 3).unwrap();
        assert!(resized.to_raw().chunks(3).all(|p| p == [9, 8, 7]));
    }

    /// Columns alternating 10 and 11
    fn striped(width: usize, height: usize) -> Frame {
        let pixels = Array3::from_shape_fn((height, width, 3), |(_, c, _)| 10 + (c % 2) as u8);
        Frame::new(pixels, ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn test_exact_halving_rounds_half_up() {
        // (10 + 11 + 10 + 11 + 2) >> 2 = 11
        let resized = resize_bilinear(&striped(256, 256), 128, 128).unwrap();
        assert!(resized.to_raw().iter().all(|&v| v == 11));
        let resized = portable::resize(&striped(256, 256), 128, 128).unwrap();
        assert!(resized.to_raw().iter().all(|&v| v == 11));
    }

    #[test]
    fn test_linear_tie_rounds_half_up() {
        // Horizontal halving only takes the interpolation path: 10.5 -> 11
        let resized = resize_bilinear(&striped(2, 1), 1, 1).unwrap();
        assert_eq!(resized.pixel(0, 0), [11, 11, 11]);
        let resized = portable::resize(&striped(256, 3), 128, 3).unwrap();
        assert!(resized.to_raw().iter().all(|&v| v == 11));
    }

    #[test]
    fn test_crop_of_256_normalizes_to_ties_rounded_up() {
        let crop = striped(256, 256);
        let settings = NormalizerSettings {
            contrast: 1.0,
            brightness: 0.0,
            ..NormalizerSettings::default()
        };
        let image = ImageNormalizer::new(settings).unwrap().normalize(&crop).unwrap();
        assert!(image.tensor().iter().all(|&v| v == 11.0 / 255.0));
    }

    #[test]
    fn test_fixed_point_taps() {
        // 2 -> 4 upscale: positions -0.25, 0.25, 0.75, 1.25
        let taps = portable::linear_taps(4, 2);
        assert_eq!(taps, vec![(0, 1, 2048, 0), (0, 1, 1536, 512), (0, 1, 512, 1536), (1, 1, 2048, 0)]);
    }

    #[test]
    fn test_invalid_settings() {
        let settings = NormalizerSettings {
            target_size: 0,
            ..NormalizerSettings::default()
        };
        assert!(ImageNormalizer::new(settings).is_err());
        assert!(resize_bilinear(&Frame::filled(2, 2, [0; 3], ChannelOrder::Rgb).unwrap(), 0, 4).is_err());
    }
}
