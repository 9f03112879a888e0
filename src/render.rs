//! Drawing of pipeline results onto display frames.

use crate::{
    keypoints::{KeypointSet, HAND_CONNECTIONS},
    overlay::{OverlayLayout, TextKind, TextRow},
    pipeline::{FrameResult, HandResult},
    roi::BoundingBox,
    utils::safe_cast::f32_to_i32_saturating,
    Result,
};
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

const LANDMARK_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);
const CONNECTION_COLOR: (f64, f64, f64) = (224.0, 224.0, 224.0);
const BOX_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const LABEL_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const ANGLE_COLOR: (f64, f64, f64) = (255.0, 255.0, 0.0);

fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// Stateless painter for [`FrameResult`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    layout: OverlayLayout,
}

impl Renderer {
    #[must_use]
    pub fn new(layout: OverlayLayout) -> Self {
        Self { layout }
    }

    /// Draw every hand of `result`, plus the frame rate when given
    ///
    /// # Errors
    ///
    /// Returns an error if an OpenCV drawing call fails.
    pub fn draw(&self, canvas: &mut Mat, result: &FrameResult, fps: Option<f64>) -> Result<()> {
        for hand in &result.hands {
            self.draw_hand(canvas, hand)?;
        }
        if let Some(fps) = fps {
            imgproc::put_text(
                canvas,
                &format!("FPS: {fps:.1}"),
                Point::new(10, 30),
                FONT_HERSHEY_SIMPLEX,
                1.0,
                bgr(LABEL_COLOR),
                2,
                LINE_8,
                false,
            )?;
        }
        Ok(())
    }

    /// Skeleton always; box and text only for hands that were classified
    ///
    /// # Errors
    ///
    /// Returns an error if an OpenCV drawing call fails.
    pub fn draw_hand(&self, canvas: &mut Mat, hand: &HandResult) -> Result<()> {
        draw_skeleton(canvas, &hand.keypoints)?;
        if let Some(roi) = &hand.roi {
            if hand.has_overlay() {
                draw_box(canvas, roi)?;
            }
        }
        for row in self.layout.rows(hand) {
            draw_text(canvas, &row)?;
        }
        Ok(())
    }
}

/// Hand connectivity lines with a dot on every landmark
///
/// # Errors
///
/// Returns an error if an OpenCV drawing call fails.
pub fn draw_skeleton(canvas: &mut Mat, keypoints: &KeypointSet) -> Result<()> {
    let (width, height) = (canvas.cols(), canvas.rows());
    let to_point = |idx: usize| {
        keypoints.get(idx).map(|p| {
            let (x, y) = p.to_pixel(width, height);
            Point::new(f32_to_i32_saturating(x), f32_to_i32_saturating(y))
        })
    };

    for &(a, b) in HAND_CONNECTIONS {
        if let (Some(start), Some(end)) = (to_point(a as usize), to_point(b as usize)) {
            imgproc::line(canvas, start, end, bgr(CONNECTION_COLOR), 2, LINE_8, 0)?;
        }
    }
    for idx in 0..keypoints.len() {
        if let Some(center) = to_point(idx) {
            imgproc::circle(canvas, center, 2, bgr(LANDMARK_COLOR), -1, LINE_8, 0)?;
        }
    }
    Ok(())
}

fn draw_box(canvas: &mut Mat, roi: &BoundingBox) -> Result<()> {
    imgproc::rectangle(
        canvas,
        Rect::new(roi.x_min, roi.y_min, roi.width(), roi.height()),
        bgr(BOX_COLOR),
        2,
        LINE_8,
        0,
    )?;
    Ok(())
}

fn draw_text(canvas: &mut Mat, row: &TextRow) -> Result<()> {
    let (scale, color) = match row.kind {
        TextKind::Label => (0.8, LABEL_COLOR),
        TextKind::Angle => (0.6, ANGLE_COLOR),
    };
    imgproc::put_text(
        canvas,
        &row.text,
        Point::new(row.x, row.y),
        FONT_HERSHEY_SIMPLEX,
        scale,
        bgr(color),
        2,
        LINE_8,
        false,
    )?;
    Ok(())
}
