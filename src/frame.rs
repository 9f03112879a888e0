//! Owned video frames independent of the capture backend.

use crate::{roi::BoundingBox, Error, Result};
use ndarray::{s, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Order of the three color channels in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Blue, green, red (camera / `OpenCV` order)
    Bgr,
    /// Red, green, blue (training order of the classifier)
    Rgb,
}

/// Image inversion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvertMode {
    /// No inversion
    None,
    /// Mirror horizontally
    X,
    /// Flip vertically
    Y,
    /// Both horizontal and vertical
    XY,
}

impl InvertMode {
    /// Parse a command line value, falling back to no inversion
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "x" => Self::X,
            "y" => Self::Y,
            "xy" => Self::XY,
            _ => Self::None,
        }
    }
}

/// A 3-channel 8-bit frame stored as `(height, width, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap a pixel array
    ///
    /// # Errors
    ///
    /// Returns an error if the array does not have exactly 3 channels or has
    /// zero width or height.
    pub fn new(pixels: Array3<u8>, order: ChannelOrder) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        if channels != 3 {
            return Err(Error::InvalidInput(format!("Expected 3 channels, got {channels}")));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!("Invalid frame dimensions: {width}x{height}")));
        }
        Ok(Self { pixels, order })
    }

    /// Build a frame from tightly packed interleaved bytes
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold `width * height * 3` bytes.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>, order: ChannelOrder) -> Result<Self> {
        let pixels = Array3::from_shape_vec((height, width, 3), data)
            .map_err(|e| Error::InvalidInput(format!("Failed to create frame from raw data: {e}")))?;
        Self::new(pixels, order)
    }

    /// A frame filled with a single color, given in the frame's own channel order
    ///
    /// # Errors
    ///
    /// Returns an error for zero dimensions.
    pub fn filled(width: usize, height: usize, color: [u8; 3], order: ChannelOrder) -> Result<Self> {
        let pixels = Array3::from_shape_fn((height, width, 3), |(_, _, ch)| color[ch]);
        Self::new(pixels, order)
    }

    /// Decode an image file into an RGB frame
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path)?.to_rgb8();
        Self::from_rgb_image(image)
    }

    /// Convert a decoded RGB image
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized images.
    pub fn from_rgb_image(image: image::RgbImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_raw(width as usize, height as usize, image.into_raw(), ChannelOrder::Rgb)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    #[must_use]
    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    #[must_use]
    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut Array3<u8> {
        &mut self.pixels
    }

    /// Pixel at `(row, col)` in the frame's channel order
    #[must_use]
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        [
            self.pixels[[row, col, 0]],
            self.pixels[[row, col, 1]],
            self.pixels[[row, col, 2]],
        ]
    }

    /// Interleaved bytes in row-major order
    #[must_use]
    pub fn to_raw(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }

    /// Copy the region inside `bbox`
    ///
    /// # Errors
    ///
    /// Returns an error if the box is empty or extends past the frame.
    #[allow(clippy::cast_sign_loss)] // Coordinates are checked to be non-negative
    pub fn crop(&self, bbox: &BoundingBox) -> Result<Self> {
        if bbox.width() <= 0 || bbox.height() <= 0 {
            return Err(Error::DegenerateRoi {
                width: bbox.width().max(0),
                height: bbox.height().max(0),
            });
        }
        if bbox.x_min < 0
            || bbox.y_min < 0
            || bbox.x_max as usize > self.width()
            || bbox.y_max as usize > self.height()
        {
            return Err(Error::InvalidInput(format!(
                "Crop {bbox:?} exceeds frame {}x{}",
                self.width(),
                self.height()
            )));
        }
        let view = self.pixels.slice(s![
            bbox.y_min as usize..bbox.y_max as usize,
            bbox.x_min as usize..bbox.x_max as usize,
            ..
        ]);
        Ok(Self {
            pixels: view.to_owned(),
            order: self.order,
        })
    }

    /// Return a copy with channels rearranged into `order`
    #[must_use]
    pub fn to_order(&self, order: ChannelOrder) -> Self {
        if order == self.order {
            return self.clone();
        }
        // BGR <-> RGB is a reversal of the channel axis
        let mut pixels = self.pixels.clone();
        pixels.invert_axis(Axis(2));
        Self {
            pixels: pixels.as_standard_layout().into_owned(),
            order,
        }
    }

    /// Mirror or flip the frame in place
    pub fn apply_inversion(&mut self, mode: InvertMode) {
        let axes: &[usize] = match mode {
            InvertMode::None => return,
            InvertMode::X => &[1],
            InvertMode::Y => &[0],
            InvertMode::XY => &[0, 1],
        };
        let mut pixels = std::mem::take(&mut self.pixels);
        for &axis in axes {
            pixels.invert_axis(Axis(axis));
        }
        self.pixels = pixels.as_standard_layout().into_owned();
    }
}
