//! Text layout of the per-hand overlay.
//!
//! Positions are computed here without any drawing backend so the layout can
//! be checked in isolation; the renderer only paints what this produces.

use crate::{
    constants::{ANGLE_ROW_OFFSET_Y, ANGLE_ROW_SPACING, DEFAULT_ANGLE_ROWS, LABEL_OFFSET_Y},
    decision::LabelDecision,
    pipeline::HandResult,
    pose_features::AngleVector,
    roi::BoundingBox,
    utils::safe_cast::{f64_to_i32_saturating, usize_to_i32},
};

/// What a text row shows, so the renderer can pick a color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Label,
    Angle,
}

/// One line of overlay text anchored at its bottom-left corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub kind: TextKind,
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// Overlay text placement relative to the hand's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    angle_rows: usize,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            angle_rows: DEFAULT_ANGLE_ROWS,
        }
    }
}

impl OverlayLayout {
    #[must_use]
    pub fn new(angle_rows: usize) -> Self {
        Self { angle_rows }
    }

    #[must_use]
    pub fn angle_rows(&self) -> usize {
        self.angle_rows
    }

    /// Label text just above the box
    #[must_use]
    pub fn label_row(&self, decision: &LabelDecision, roi: &BoundingBox) -> TextRow {
        TextRow {
            kind: TextKind::Label,
            text: decision.to_string(),
            x: roi.x_min,
            y: roi.y_min - LABEL_OFFSET_Y,
        }
    }

    /// Leading smoothed angles, one row each, truncated to whole degrees
    #[must_use]
    pub fn angle_text_rows(&self, angles: &AngleVector, roi: &BoundingBox) -> Vec<TextRow> {
        angles
            .iter()
            .take(self.angle_rows)
            .enumerate()
            .map(|(i, &angle)| {
                let row = usize_to_i32(i).unwrap_or(i32::MAX);
                TextRow {
                    kind: TextKind::Angle,
                    text: format!("A{}:{}", i + 1, f64_to_i32_saturating(angle)),
                    x: roi.x_min,
                    y: roi
                        .y_min
                        .saturating_add(ANGLE_ROW_OFFSET_Y)
                        .saturating_add(row.saturating_mul(ANGLE_ROW_SPACING)),
                }
            })
            .collect()
    }

    /// All text rows for one hand, empty when the hand has no overlay
    #[must_use]
    pub fn rows(&self, hand: &HandResult) -> Vec<TextRow> {
        let (Some(roi), Some(decision)) = (&hand.roi, &hand.decision) else {
            return Vec::new();
        };
        let mut rows = vec![self.label_row(decision, roi)];
        if let Some(smoothed) = &hand.smoothed {
            rows.extend(self.angle_text_rows(smoothed, roi));
        }
        rows
    }
}
