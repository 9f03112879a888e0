//! Conversion between OpenCV `Mat` and [`Frame`].

use crate::{
    frame::{ChannelOrder, Frame},
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::prelude::*;

/// Copy an 8-bit BGR `Mat` into a [`Frame`]
///
/// # Errors
///
/// Returns an error if the Mat is empty or not `CV_8UC3`.
pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
    mat_to_frame_with_order(mat, ChannelOrder::Bgr)
}

/// Copy an 8-bit 3-channel `Mat` whose channels are in `order`
///
/// # Errors
///
/// Returns an error if the Mat is empty or not `CV_8UC3`.
#[allow(clippy::cast_sign_loss)] // Checked positive above
pub fn mat_to_frame_with_order(mat: &Mat, order: ChannelOrder) -> Result<Frame> {
    if mat.empty() || mat.rows() <= 0 || mat.cols() <= 0 {
        return Err(Error::InvalidInput("Empty Mat".to_string()));
    }
    if mat.typ() != CV_8UC3 {
        return Err(Error::InvalidInput(format!(
            "Expected an 8-bit 3-channel Mat, got type {}",
            mat.typ()
        )));
    }

    let (width, height) = (mat.cols() as usize, mat.rows() as usize);
    let data = if mat.is_continuous() {
        mat.data_bytes()?.to_vec()
    } else {
        mat.try_clone()?.data_bytes()?.to_vec()
    };
    Frame::from_raw(width, height, data, order)
}

/// Copy a [`Frame`] into a new BGR `Mat` for drawing and display
///
/// # Errors
///
/// Returns an error if the frame is too large for OpenCV or allocation fails.
pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    frame_to_mat_raw(&frame.to_order(ChannelOrder::Bgr))
}

/// Copy a [`Frame`] into a `Mat` keeping its channel order
///
/// # Errors
///
/// Returns an error if the frame is too large for OpenCV or allocation fails.
pub fn frame_to_mat_raw(frame: &Frame) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        usize_to_i32(frame.height())?,
        usize_to_i32(frame.width())?,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.to_raw());
    Ok(mat)
}
