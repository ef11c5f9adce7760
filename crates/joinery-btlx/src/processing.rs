//! The validated processing and dispatch over feature kinds.

use crate::features::{
    DoubleCut, DovetailMortise, DovetailTenon, Drilling, DrillingGeometry, FrenchRidgeLap, FrenchRidgeLapGeometry,
    JackRafterCut, Lap, LongitudinalCut, LongitudinalCutGeometry, Mortise, MortiseGeometry, Pocket, ScarfJoint,
    ScarfJointGeometry, Slot, SlotGeometry, StepJoint, StepJointGeometry, StepJointNotch, StepJointNotchGeometry,
    Tenon, TenonGeometry, Text,
};
use crate::params::ParameterMap;
use crate::{BtlxSettings, ProcessingError, Result, ValidationError};
use joinery_kernel_blank::{Beam, REF_SIDE_COUNT};
use joinery_kernel_geom::{Frame, Hexahedron, Line, Plane};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Kinds
// =============================================================================

macro_rules! feature_kinds {
    ($($(#[$meta:meta])* $kind:ident),+ $(,)?) => {
        /// Tag naming a feature kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ProcessingKind {
            $($(#[$meta])* $kind,)+
        }

        impl ProcessingKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [ProcessingKind] = &[$(ProcessingKind::$kind,)+];

            /// BTLx element name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ProcessingKind::$kind => $kind::NAME,)+
                }
            }

            /// Parameter keys in output order.
            pub fn parameter_keys(&self) -> &'static [&'static str] {
                match self {
                    $(ProcessingKind::$kind => $kind::PARAMETER_KEYS,)+
                }
            }
        }

        /// Parameters of one feature, tagged by kind.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind")]
        pub enum Feature {
            $($(#[$meta])* $kind($kind),)+
        }

        impl Feature {
            /// The feature's kind.
            pub fn kind(&self) -> ProcessingKind {
                match self {
                    $(Feature::$kind(_) => ProcessingKind::$kind,)+
                }
            }

            /// Check every field against its interval.
            pub fn validate(&self) -> std::result::Result<(), ValidationError> {
                match self {
                    $(Feature::$kind(f) => f.validate(),)+
                }
            }

            /// Ordered parameter map with `precision` fractional digits.
            pub fn parameter_map(&self, precision: usize) -> ParameterMap {
                match self {
                    $(Feature::$kind(f) => f.parameter_map(precision),)+
                }
            }
        }

        $(
            impl From<$kind> for Feature {
                fn from(feature: $kind) -> Self {
                    Feature::$kind(feature)
                }
            }
        )+
    };
}

feature_kinds! {
    /// Single planar end cut.
    JackRafterCut,
    /// Two bevel cuts meeting in a ridge.
    DoubleCut,
    /// Birdsmouth on the strut of a step joint.
    StepJoint,
    /// Notch receiving a step joint.
    StepJointNotch,
    /// Dovetail tenon at an end.
    DovetailTenon,
    /// Dovetail socket.
    DovetailMortise,
    /// Tenon at an end.
    Tenon,
    /// Mortise.
    Mortise,
    /// Lap removed from a side.
    Lap,
    /// Pocket with tilted walls.
    Pocket,
    /// Drilled hole.
    Drilling,
    /// Saw kerf slot.
    Slot,
    /// Rip along the blank.
    LongitudinalCut,
    /// End-to-end scarf.
    ScarfJoint,
    /// Half-depth French ridge lap.
    FrenchRidgeLap,
    /// Engraved marking.
    Text,
}

impl fmt::Display for ProcessingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Feature {
    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam, ref_side: usize) -> Result<FeatureGeometry> {
        Ok(match self {
            Feature::JackRafterCut(f) => FeatureGeometry::JackRafterCut(f.to_plane(beam, ref_side)?),
            Feature::DoubleCut(f) => FeatureGeometry::DoubleCut(f.to_planes(beam, ref_side)?),
            Feature::StepJoint(f) => FeatureGeometry::StepJoint(f.to_geometry(beam, ref_side)?),
            Feature::StepJointNotch(f) => FeatureGeometry::StepJointNotch(f.to_geometry(beam, ref_side)?),
            Feature::DovetailTenon(f) => FeatureGeometry::DovetailTenon(f.to_geometry(beam, ref_side)?),
            Feature::DovetailMortise(f) => FeatureGeometry::DovetailMortise(f.to_geometry(beam, ref_side)?),
            Feature::Tenon(f) => FeatureGeometry::Tenon(f.to_geometry(beam, ref_side)?),
            Feature::Mortise(f) => FeatureGeometry::Mortise(f.to_geometry(beam, ref_side)?),
            Feature::Lap(f) => FeatureGeometry::Lap(f.to_geometry(beam, ref_side)?),
            Feature::Pocket(f) => FeatureGeometry::Pocket(f.to_geometry(beam, ref_side)?),
            Feature::Drilling(f) => FeatureGeometry::Drilling(f.to_geometry(beam, ref_side)?),
            Feature::Slot(f) => FeatureGeometry::Slot(f.to_geometry(beam, ref_side)?),
            Feature::LongitudinalCut(f) => FeatureGeometry::LongitudinalCut(f.to_geometry(beam, ref_side)?),
            Feature::ScarfJoint(f) => FeatureGeometry::ScarfJoint(f.to_geometry(beam, ref_side)?),
            Feature::FrenchRidgeLap(f) => FeatureGeometry::FrenchRidgeLap(f.to_geometry(beam, ref_side)?),
            Feature::Text(f) => FeatureGeometry::Text(f.to_geometry(beam, ref_side)?),
        })
    }
}

// =============================================================================
// Processing
// =============================================================================

/// A machining feature on one reference side.
///
/// Only constructed through [`Processing::new`] (or [`Processing::update`]),
/// so every field is within its interval. Kind and reference side are fixed
/// for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedProcessing")]
pub struct Processing {
    feature: Feature,
    ref_side_index: usize,
}

#[derive(Deserialize)]
struct UncheckedProcessing {
    feature: Feature,
    ref_side_index: usize,
}

impl TryFrom<UncheckedProcessing> for Processing {
    type Error = ValidationError;

    fn try_from(raw: UncheckedProcessing) -> std::result::Result<Self, Self::Error> {
        Processing::new(raw.feature, raw.ref_side_index)
    }
}

impl Processing {
    /// Validate a feature and attach it to a reference side.
    pub fn new(feature: impl Into<Feature>, ref_side_index: usize) -> std::result::Result<Self, ValidationError> {
        if ref_side_index >= REF_SIDE_COUNT {
            return Err(ValidationError::InvalidRefSide(ref_side_index));
        }
        let feature = feature.into();
        feature.validate()?;
        Ok(Self {
            feature,
            ref_side_index,
        })
    }

    /// A copy with modified fields, validated as a whole.
    ///
    /// The closure may not replace the feature with another kind.
    pub fn update(&self, f: impl FnOnce(&mut Feature)) -> std::result::Result<Self, ValidationError> {
        let mut feature = self.feature.clone();
        f(&mut feature);
        if feature.kind() != self.kind() {
            return Err(ValidationError::KindChanged {
                from: self.name(),
                to: feature.kind().name(),
            });
        }
        Self::new(feature, self.ref_side_index)
    }

    /// The feature's parameters.
    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    /// The feature's kind.
    pub fn kind(&self) -> ProcessingKind {
        self.feature.kind()
    }

    /// BTLx element name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Reference side, 0-based.
    pub fn ref_side_index(&self) -> usize {
        self.ref_side_index
    }

    /// Parameter map with the default precision.
    pub fn to_parameter_map(&self) -> ParameterMap {
        self.to_parameter_map_with(&BtlxSettings::default())
    }

    /// Parameter map with the configured precision.
    pub fn to_parameter_map_with(&self, settings: &BtlxSettings) -> ParameterMap {
        self.feature.parameter_map(settings.precision)
    }

    /// Cutting geometry on the given blank.
    pub fn to_geometry(&self, beam: &Beam) -> Result<FeatureGeometry> {
        self.feature.to_geometry(beam, self.ref_side_index)
    }

    /// Per-feature record for a BTLx writer.
    pub fn record(&self) -> ProcessingRecord {
        self.record_with(&BtlxSettings::default())
    }

    /// Per-feature record with the configured precision.
    pub fn record_with(&self, settings: &BtlxSettings) -> ProcessingRecord {
        ProcessingRecord {
            name: self.name().to_string(),
            reference_side: self.ref_side_index + 1,
            parameters: self.to_parameter_map_with(settings),
        }
    }

    /// Attribute a geometry kernel failure to one element of this feature.
    pub fn application_error(&self, element: &str, reason: impl Into<String>) -> ProcessingError {
        ProcessingError::Application {
            kind: self.name(),
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

/// Name, 1-based reference side and parameters of one processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingRecord {
    /// BTLx element name.
    pub name: String,
    /// Reference side number, starting at 1.
    pub reference_side: usize,
    /// Ordered parameters.
    pub parameters: ParameterMap,
}

impl ProcessingRecord {
    /// Render as JSON, parameter order preserved.
    pub fn to_json_string(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Cutting geometry of one processing, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// Cutting plane.
    JackRafterCut(Plane),
    /// Both cutting planes.
    DoubleCut([Plane; 2]),
    /// Step joint cuts.
    StepJoint(StepJointGeometry),
    /// Notch cuts.
    StepJointNotch(StepJointNotchGeometry),
    /// Dovetail tenon.
    DovetailTenon(TenonGeometry),
    /// Dovetail socket.
    DovetailMortise(MortiseGeometry),
    /// Tenon.
    Tenon(TenonGeometry),
    /// Mortise.
    Mortise(MortiseGeometry),
    /// Lap volume.
    Lap(Hexahedron),
    /// Pocket volume.
    Pocket(Hexahedron),
    /// Hole axis.
    Drilling(DrillingGeometry),
    /// Slot volume.
    Slot(SlotGeometry),
    /// Rip plane and bounds.
    LongitudinalCut(LongitudinalCutGeometry),
    /// Scarf cuts and holes.
    ScarfJoint(ScarfJointGeometry),
    /// Lap volume and peg hole.
    FrenchRidgeLap(FrenchRidgeLapGeometry),
    /// Marking frame.
    Text(Frame),
}

/// One labelled piece of cutting geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryElement {
    /// Label naming the element within its feature.
    pub label: String,
    /// The geometry.
    pub shape: ElementShape,
}

/// Geometry handed to the boolean kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementShape {
    /// Half space behind a plane.
    Plane(Plane),
    /// Placement frame.
    Frame(Frame),
    /// Volume bounded by six planes.
    Volume(Hexahedron),
    /// Cylinder along an axis.
    Axis {
        /// Cylinder axis.
        axis: Line,
        /// Cylinder diameter.
        diameter: f64,
    },
}

impl FeatureGeometry {
    /// Every element, in application order.
    pub fn elements(&self) -> Vec<GeometryElement> {
        let mut out = Vec::new();
        let mut push = |label: String, shape: ElementShape| out.push(GeometryElement { label, shape });
        let hole = |d: &DrillingGeometry| ElementShape::Axis {
            axis: d.axis,
            diameter: d.diameter,
        };
        match self {
            FeatureGeometry::JackRafterCut(plane) => push("cut".into(), ElementShape::Plane(*plane)),
            FeatureGeometry::DoubleCut(planes) => {
                for (i, plane) in planes.iter().enumerate() {
                    push(format!("cut_{}", i + 1), ElementShape::Plane(*plane));
                }
            }
            FeatureGeometry::StepJoint(g) => {
                for (i, plane) in g.cuts.iter().enumerate() {
                    push(format!("cut_{}", i + 1), ElementShape::Plane(*plane));
                }
                if let Some(tenon) = g.tenon {
                    push("tenon".into(), ElementShape::Volume(tenon));
                }
            }
            FeatureGeometry::StepJointNotch(g) => {
                for (i, plane) in g.cuts.iter().enumerate() {
                    push(format!("cut_{}", i + 1), ElementShape::Plane(*plane));
                }
                if let Some(sides) = g.side_cuts {
                    for (i, plane) in sides.iter().enumerate() {
                        push(format!("side_{}", i + 1), ElementShape::Plane(*plane));
                    }
                }
                if let Some(mortise) = g.mortise {
                    push("mortise".into(), ElementShape::Volume(mortise));
                }
            }
            FeatureGeometry::DovetailTenon(g) | FeatureGeometry::Tenon(g) => {
                push("cut".into(), ElementShape::Plane(g.cut_plane));
                push("volume".into(), ElementShape::Volume(g.volume));
            }
            FeatureGeometry::DovetailMortise(g) | FeatureGeometry::Mortise(g) => {
                push("volume".into(), ElementShape::Volume(g.volume));
            }
            FeatureGeometry::Lap(volume) | FeatureGeometry::Pocket(volume) => {
                push("volume".into(), ElementShape::Volume(*volume));
            }
            FeatureGeometry::Drilling(d) => push("axis".into(), hole(d)),
            FeatureGeometry::Slot(g) => push("volume".into(), ElementShape::Volume(g.volume)),
            FeatureGeometry::LongitudinalCut(g) => {
                push("cut".into(), ElementShape::Plane(g.cut_plane));
                for (label, bound) in [("start", g.start_plane), ("end", g.end_plane), ("depth", g.depth_plane)] {
                    if let Some(plane) = bound {
                        push(label.into(), ElementShape::Plane(plane));
                    }
                }
            }
            FeatureGeometry::ScarfJoint(g) => {
                for (i, plane) in g.cuts.iter().enumerate() {
                    push(format!("cut_{}", i + 1), ElementShape::Plane(*plane));
                }
                for (i, d) in g.drill_holes.iter().enumerate() {
                    push(format!("drill_hole_{}", i + 1), hole(d));
                }
            }
            FeatureGeometry::FrenchRidgeLap(g) => {
                push("volume".into(), ElementShape::Volume(g.volume));
                if let Some(d) = &g.drill_hole {
                    push("drill_hole".into(), hole(d));
                }
            }
            FeatureGeometry::Text(frame) => push("frame".into(), ElementShape::Frame(*frame)),
        }
        out
    }

    /// The element with the given label.
    pub fn element(&self, label: &str) -> Option<GeometryElement> {
        self.elements().into_iter().find(|e| e.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::common::testing::beam;
    use crate::features::{MortiseOptions, TenonOptions};
    use crate::orientation::Orientation;
    use joinery_kernel_math::{Point3, Tolerance, Vec3};

    fn jack() -> Processing {
        Processing::new(JackRafterCut::new(Orientation::End, 1500.0, 90.0, 90.0), 1).unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_processing_is_send_sync() {
        assert_send_sync::<Processing>();
        assert_send_sync::<FeatureGeometry>();
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(ProcessingKind::ALL.len(), 16);
        let mut names: Vec<_> = ProcessingKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 16);
        assert_eq!(ProcessingKind::DoubleCut.parameter_keys()[3], "Angle1");
        assert_eq!(ProcessingKind::StepJointNotch.to_string(), "StepJointNotch");
    }

    #[test]
    fn test_new_rejects_bad_ref_side() {
        let err = Processing::new(JackRafterCut::new(Orientation::End, 0.0, 90.0, 90.0), 6).unwrap_err();
        assert_eq!(err, ValidationError::InvalidRefSide(6));
    }

    #[test]
    fn test_new_rejects_out_of_range_field() {
        let err = Processing::new(JackRafterCut::new(Orientation::End, 0.0, 180.0, 90.0), 1).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "Angle", .. }));
    }

    #[test]
    fn test_update_revalidates() {
        let p = jack();
        let err = p
            .update(|f| {
                if let Feature::JackRafterCut(c) = f {
                    c.inclination = 0.0;
                }
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "Inclination", .. }));

        let q = p
            .update(|f| {
                if let Feature::JackRafterCut(c) = f {
                    c.angle = 45.0;
                }
            })
            .unwrap();
        assert_eq!(q.to_parameter_map().get_str("Angle"), Some("45.000"));
        assert_eq!(p.to_parameter_map().get_str("Angle"), Some("90.000"));
    }

    #[test]
    fn test_update_cannot_change_kind() {
        let err = jack()
            .update(|f| {
                *f = Feature::Text(Text {
                    start_x: 0.0,
                    start_y: 0.0,
                    angle: 0.0,
                    alignment_vertical: crate::params::AlignmentVertical::Bottom,
                    alignment_horizontal: crate::params::AlignmentHorizontal::Left,
                    alignment_multiline: crate::params::AlignmentMultiline::Left,
                    stacked_marking: false,
                    text_height_auto: true,
                    text_height: 10.0,
                    text: "x".to_string(),
                })
            })
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::KindChanged {
                from: "JackRafterCut",
                to: "Text"
            }
        );
    }

    #[test]
    fn test_parameter_map_is_stable_and_complete() {
        let b = beam();
        let processings = vec![
            jack(),
            Tenon::from_plane(
                &Plane::new(Point3::new(1500.0, 0.0, 0.0), Vec3::x()),
                &b,
                2,
                &TenonOptions {
                    start_y: 50.0,
                    height: 30.0,
                    ..TenonOptions::default()
                },
            )
            .unwrap(),
            Mortise::from_frame(
                &Frame::new(Point3::new(400.0, 0.0, 60.0), Vec3::x(), Vec3::y()),
                &b,
                2,
                &MortiseOptions::default(),
            )
            .unwrap(),
            Drilling::from_line(
                &Line::new(Point3::new(500.0, 0.0, 100.0), Point3::new(500.0, 0.0, 0.0)),
                10.0,
                &b,
                None,
                &Tolerance::DEFAULT,
            )
            .unwrap(),
        ];
        for p in &processings {
            let first = p.to_parameter_map();
            assert_eq!(first, p.to_parameter_map());
            let keys: Vec<_> = first.keys().collect();
            assert_eq!(keys, p.kind().parameter_keys().to_vec(), "{}", p.name());
        }
    }

    #[test]
    fn test_precision_from_settings() {
        let settings = BtlxSettings {
            precision: 1,
            ..BtlxSettings::default()
        };
        let map = jack().to_parameter_map_with(&settings);
        assert_eq!(map.get_str("StartX"), Some("1500.0"));
    }

    #[test]
    fn test_record_json() {
        let record = jack().record();
        assert_eq!(record.reference_side, 2);
        let json = record.to_json_string().unwrap();
        assert!(json.starts_with(
            r#"{"Name":"JackRafterCut","ReferenceSide":2,"Parameters":{"Orientation":"end","StartX":"1500.000""#
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let p = jack();
        let json = serde_json::to_string(&p).unwrap();
        let back: Processing = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let bad = json.replace("\"angle\":90.0", "\"angle\":200.0");
        assert_ne!(bad, json);
        assert!(serde_json::from_str::<Processing>(&bad).is_err());
    }

    #[test]
    fn test_geometry_elements_are_labelled() {
        let b = beam();
        let g = jack().to_geometry(&b).unwrap();
        let cut = g.element("cut").unwrap();
        match cut.shape {
            ElementShape::Plane(plane) => assert!((plane.normal - Vec3::x()).norm() < 1e-12),
            other => panic!("unexpected shape {other:?}"),
        }
        assert!(g.element("volume").is_none());

        let err = jack().application_error("cut", "boolean difference failed");
        assert!(matches!(
            err,
            ProcessingError::Application { kind: "JackRafterCut", ref element, .. } if element == "cut"
        ));
    }
}
