//! Text marking engraved on a reference side.

use super::common::{planar_angle, SideContext};
use crate::params::{
    AlignmentHorizontal, AlignmentMultiline, AlignmentVertical, Interval, ParameterMap, ParameterMapBuilder,
    SIGNED_ANGLE, START_X, START_Y,
};
use crate::{Processing, Result, ValidationError};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::Frame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Character height.
const TEXT_HEIGHT: Interval = Interval::new(0.0, 5000.0);

/// Layout of a text marking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    /// Vertical alignment at the placement point.
    pub alignment_vertical: AlignmentVertical,
    /// Horizontal alignment at the placement point.
    pub alignment_horizontal: AlignmentHorizontal,
    /// Alignment of multiple lines.
    pub alignment_multiline: AlignmentMultiline,
    /// Characters stacked instead of in a row.
    pub stacked_marking: bool,
    /// Let the machine choose the height.
    pub text_height_auto: bool,
    /// Character height.
    pub text_height: f64,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            alignment_vertical: AlignmentVertical::Bottom,
            alignment_horizontal: AlignmentHorizontal::Left,
            alignment_multiline: AlignmentMultiline::Left,
            stacked_marking: false,
            text_height_auto: true,
            text_height: 20.0,
        }
    }
}

/// A text marking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Placement along the blank.
    pub start_x: f64,
    /// Placement across the side.
    pub start_y: f64,
    /// Direction of the baseline in degrees, from x toward y.
    pub angle: f64,
    /// Vertical alignment.
    pub alignment_vertical: AlignmentVertical,
    /// Horizontal alignment.
    pub alignment_horizontal: AlignmentHorizontal,
    /// Alignment of multiple lines.
    pub alignment_multiline: AlignmentMultiline,
    /// Characters stacked.
    pub stacked_marking: bool,
    /// Machine-chosen height.
    pub text_height_auto: bool,
    /// Character height.
    pub text_height: f64,
    /// The marking.
    pub text: String,
}

impl Text {
    /// BTLx element name.
    pub const NAME: &'static str = "Text";

    /// Parameter keys in output order.
    pub const PARAMETER_KEYS: &'static [&'static str] = &[
        "StartX",
        "StartY",
        "Angle",
        "AlignmentVertical",
        "AlignmentHorizontal",
        "AlignmentMultiline",
        "StackedMarking",
        "TextHeightAuto",
        "TextHeight",
        "Text",
    ];

    /// Check every field against its interval.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        START_X.check("StartX", self.start_x)?;
        START_Y.check("StartY", self.start_y)?;
        SIGNED_ANGLE.check("Angle", self.angle)?;
        TEXT_HEIGHT.check("TextHeight", self.text_height)?;
        if self.text.is_empty() {
            return Err(ValidationError::Empty("Text"));
        }
        Ok(())
    }

    /// Place a marking at a frame: origin on the baseline, x along it.
    ///
    /// The frame's origin and x axis are projected onto the reference side.
    pub fn from_frame(
        frame: &Frame,
        beam: &Beam,
        ref_side: usize,
        text: &str,
        options: &TextOptions,
    ) -> Result<Processing> {
        let side = SideContext::new(beam, ref_side)?;
        let (start_x, start_y, _) = side.coordinates(&frame.point);
        let angle = planar_angle(&frame.xaxis, &side.x(), &side.y());
        debug!(kind = Self::NAME, ref_side, start_x, start_y, angle, text, "derived processing");
        Ok(Processing::new(
            Self {
                start_x,
                start_y,
                angle,
                alignment_vertical: options.alignment_vertical,
                alignment_horizontal: options.alignment_horizontal,
                alignment_multiline: options.alignment_multiline,
                stacked_marking: options.stacked_marking,
                text_height_auto: options.text_height_auto,
                text_height: options.text_height,
                text: text.to_string(),
            },
            ref_side,
        )?)
    }

    /// Placement frame on the reference side, z out of the blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<Frame> {
        let side = SideContext::new(beam, ref_side)?;
        let (s, c) = self.angle.to_radians().sin_cos();
        Ok(Frame::new(
            side.point(self.start_x, self.start_y, 0.0),
            side.x() * c + side.y() * s,
            side.y() * c - side.x() * s,
        ))
    }

    /// Ordered parameter map.
    pub fn parameter_map(&self, precision: usize) -> ParameterMap {
        ParameterMapBuilder::new(precision)
            .float("StartX", self.start_x)
            .float("StartY", self.start_y)
            .float("Angle", self.angle)
            .text("AlignmentVertical", self.alignment_vertical.as_str())
            .text("AlignmentHorizontal", self.alignment_horizontal.as_str())
            .text("AlignmentMultiline", self.alignment_multiline.as_str())
            .flag("StackedMarking", self.stacked_marking)
            .flag("TextHeightAuto", self.text_height_auto)
            .float("TextHeight", self.text_height)
            .text("Text", self.text.as_str())
            .build()
    }
}
