//! Deferred derivation: keep the geometric input, derive on first use.

use crate::features::{
    DoubleCut, DovetailMortise, DovetailOptions, DovetailTenon, Drilling, FrenchRidgeLap, JackRafterCut, Lap,
    LongitudinalCut, LongitudinalCutOptions, Mortise, MortiseOptions, Pocket, ScarfJoint, ScarfJointOptions, Slot,
    StepJoint, StepJointNotch, Tenon, TenonOptions, Text, TextOptions,
};
use crate::params::{LimitationTop, ParameterMap};
use crate::processing::{FeatureGeometry, ProcessingKind};
use crate::{BtlxSettings, Processing, ProcessingError, Result};
use joinery_kernel_blank::Beam;
use joinery_kernel_geom::{Frame, Hexahedron, Line, Plane};
use joinery_kernel_math::Point3;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Geometric input of one derivation, by kind.
///
/// Mirrors the arguments of each kind's `from_*` constructor. The tolerance
/// and the dovetail tool come from [`BtlxSettings`] at derivation time.
///
/// Plane and frame based kinds derive on side 0 when `ref_side` is omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[allow(missing_docs)]
pub enum ProcessingInput {
    JackRafterCut {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
    },
    DoubleCut {
        planes: [Plane; 2],
        #[serde(default)]
        ref_side: usize,
    },
    StepJoint {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        step_depth: f64,
        heel_depth: f64,
        tapered_heel: bool,
        /// Tenon width and height.
        tenon: Option<(f64, f64)>,
    },
    StepJointNotch {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        start_y: f64,
        notch_width: Option<f64>,
        strut_height: f64,
        step_depth: f64,
        heel_depth: f64,
        tapered_heel: bool,
        /// Mortise width and height.
        mortise: Option<(f64, f64)>,
    },
    DovetailTenon {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        options: TenonOptions,
        dovetail: DovetailOptions,
        /// Bound the height by the configured dovetail tool.
        use_tool: bool,
    },
    DovetailMortise {
        frame: Frame,
        #[serde(default)]
        ref_side: usize,
        options: MortiseOptions,
        dovetail: DovetailOptions,
        limitation_top: LimitationTop,
        /// Bound the depth by the configured dovetail tool.
        use_tool: bool,
    },
    Tenon {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        options: TenonOptions,
    },
    Mortise {
        frame: Frame,
        #[serde(default)]
        ref_side: usize,
        options: MortiseOptions,
    },
    Lap {
        volume: Hexahedron,
        /// `None` picks the side facing the top face.
        #[serde(default)]
        ref_side: Option<usize>,
    },
    Pocket {
        volume: Hexahedron,
        /// `None` picks the side facing the top face.
        #[serde(default)]
        ref_side: Option<usize>,
    },
    Drilling {
        line: Line,
        diameter: f64,
        /// `None` picks the side the line enters first.
        #[serde(default)]
        ref_side: Option<usize>,
    },
    Slot {
        outline: [Point3; 4],
        thickness: f64,
        /// `None` picks the side facing from edge `P2P3` toward edge `P1P4`.
        #[serde(default)]
        ref_side: Option<usize>,
    },
    LongitudinalCut {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        options: LongitudinalCutOptions,
    },
    ScarfJoint {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        options: ScarfJointOptions,
    },
    FrenchRidgeLap {
        plane: Plane,
        #[serde(default)]
        ref_side: usize,
        drillhole_diam: Option<f64>,
    },
    Text {
        frame: Frame,
        #[serde(default)]
        ref_side: usize,
        text: String,
        options: TextOptions,
    },
}

impl ProcessingInput {
    /// Kind of the processing this input derives.
    pub fn kind(&self) -> ProcessingKind {
        match self {
            ProcessingInput::JackRafterCut { .. } => ProcessingKind::JackRafterCut,
            ProcessingInput::DoubleCut { .. } => ProcessingKind::DoubleCut,
            ProcessingInput::StepJoint { .. } => ProcessingKind::StepJoint,
            ProcessingInput::StepJointNotch { .. } => ProcessingKind::StepJointNotch,
            ProcessingInput::DovetailTenon { .. } => ProcessingKind::DovetailTenon,
            ProcessingInput::DovetailMortise { .. } => ProcessingKind::DovetailMortise,
            ProcessingInput::Tenon { .. } => ProcessingKind::Tenon,
            ProcessingInput::Mortise { .. } => ProcessingKind::Mortise,
            ProcessingInput::Lap { .. } => ProcessingKind::Lap,
            ProcessingInput::Pocket { .. } => ProcessingKind::Pocket,
            ProcessingInput::Drilling { .. } => ProcessingKind::Drilling,
            ProcessingInput::Slot { .. } => ProcessingKind::Slot,
            ProcessingInput::LongitudinalCut { .. } => ProcessingKind::LongitudinalCut,
            ProcessingInput::ScarfJoint { .. } => ProcessingKind::ScarfJoint,
            ProcessingInput::FrenchRidgeLap { .. } => ProcessingKind::FrenchRidgeLap,
            ProcessingInput::Text { .. } => ProcessingKind::Text,
        }
    }

    /// Run the derivation on the given blank.
    pub fn derive(&self, beam: &Beam, settings: &BtlxSettings) -> Result<Processing> {
        let tol = &settings.tolerance;
        let tool = |use_tool: bool| use_tool.then_some(&settings.dovetail_tool);
        match self {
            ProcessingInput::JackRafterCut { plane, ref_side } => JackRafterCut::from_plane(plane, beam, *ref_side),
            ProcessingInput::DoubleCut { planes, ref_side } => DoubleCut::from_planes(planes, beam, *ref_side),
            ProcessingInput::StepJoint {
                plane,
                ref_side,
                step_depth,
                heel_depth,
                tapered_heel,
                tenon,
            } => {
                let joint = StepJoint::from_plane(plane, beam, *ref_side, *step_depth, *heel_depth, *tapered_heel)?;
                match tenon {
                    Some((width, height)) => StepJoint::add_tenon(&joint, beam, *width, *height),
                    None => Ok(joint),
                }
            }
            ProcessingInput::StepJointNotch {
                plane,
                ref_side,
                start_y,
                notch_width,
                strut_height,
                step_depth,
                heel_depth,
                tapered_heel,
                mortise,
            } => {
                let notch = StepJointNotch::from_plane(
                    plane,
                    beam,
                    *ref_side,
                    *start_y,
                    *notch_width,
                    *strut_height,
                    *step_depth,
                    *heel_depth,
                    *tapered_heel,
                )?;
                match mortise {
                    Some((width, height)) => StepJointNotch::add_mortise(&notch, beam, *width, *height),
                    None => Ok(notch),
                }
            }
            ProcessingInput::DovetailTenon {
                plane,
                ref_side,
                options,
                dovetail,
                use_tool,
            } => DovetailTenon::from_plane(plane, beam, *ref_side, options, dovetail, tool(*use_tool)),
            ProcessingInput::DovetailMortise {
                frame,
                ref_side,
                options,
                dovetail,
                limitation_top,
                use_tool,
            } => DovetailMortise::from_frame(
                frame,
                beam,
                *ref_side,
                options,
                dovetail,
                *limitation_top,
                tool(*use_tool),
            ),
            ProcessingInput::Tenon {
                plane,
                ref_side,
                options,
            } => Tenon::from_plane(plane, beam, *ref_side, options),
            ProcessingInput::Mortise {
                frame,
                ref_side,
                options,
            } => Mortise::from_frame(frame, beam, *ref_side, options),
            ProcessingInput::Lap { volume, ref_side } => Lap::from_volume(volume, beam, *ref_side, tol),
            ProcessingInput::Pocket { volume, ref_side } => Pocket::from_volume(volume, beam, *ref_side, tol),
            ProcessingInput::Drilling {
                line,
                diameter,
                ref_side,
            } => Drilling::from_line(line, *diameter, beam, *ref_side, tol),
            ProcessingInput::Slot {
                outline,
                thickness,
                ref_side,
            } => Slot::from_outline(outline, *thickness, beam, *ref_side, tol),
            ProcessingInput::LongitudinalCut {
                plane,
                ref_side,
                options,
            } => LongitudinalCut::from_plane(plane, beam, *ref_side, options, tol),
            ProcessingInput::ScarfJoint {
                plane,
                ref_side,
                options,
            } => ScarfJoint::from_plane(plane, beam, *ref_side, options, tol),
            ProcessingInput::FrenchRidgeLap {
                plane,
                ref_side,
                drillhole_diam,
            } => FrenchRidgeLap::from_plane(plane, beam, *ref_side, *drillhole_diam, tol),
            ProcessingInput::Text {
                frame,
                ref_side,
                text,
                options,
            } => Text::from_frame(frame, beam, *ref_side, text, options),
        }
    }
}

/// A processing derived on first access.
///
/// Holds the geometric input and a copy of the blank. The first call that
/// needs parameters runs the derivation; the outcome, success or failure, is
/// kept and every later call sees the same value. Safe to share between
/// threads: concurrent first calls derive exactly once.
#[derive(Debug)]
pub struct DeferredProcessing {
    input: ProcessingInput,
    beam: Beam,
    settings: BtlxSettings,
    cell: OnceLock<std::result::Result<Processing, ProcessingError>>,
}

impl DeferredProcessing {
    /// Wrap an input without deriving it.
    pub fn new(input: ProcessingInput, beam: Beam, settings: BtlxSettings) -> Self {
        Self {
            input,
            beam,
            settings,
            cell: OnceLock::new(),
        }
    }

    /// Kind, known without deriving.
    pub fn kind(&self) -> ProcessingKind {
        self.input.kind()
    }

    /// The geometric input.
    pub fn input(&self) -> &ProcessingInput {
        &self.input
    }

    /// Whether the derivation has run.
    pub fn is_materialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The derived processing, deriving it on first call.
    pub fn processing(&self) -> std::result::Result<&Processing, &ProcessingError> {
        self.cell
            .get_or_init(|| {
                debug!(kind = %self.kind(), "materializing deferred processing");
                self.input.derive(&self.beam, &self.settings)
            })
            .as_ref()
    }

    /// Reference side of the derived processing.
    pub fn ref_side_index(&self) -> Result<usize> {
        self.processing().map(Processing::ref_side_index).map_err(Clone::clone)
    }

    /// Parameter map at the configured precision.
    pub fn to_parameter_map(&self) -> Result<ParameterMap> {
        self.processing()
            .map(|p| p.to_parameter_map_with(&self.settings))
            .map_err(Clone::clone)
    }

    /// Cutting geometry on the stored blank.
    pub fn to_geometry(&self) -> Result<FeatureGeometry> {
        self.processing().map_err(Clone::clone)?.to_geometry(&self.beam)
    }

    /// Consume the proxy, deriving if needed.
    pub fn into_processing(self) -> Result<Processing> {
        match self.cell.into_inner() {
            Some(result) => result,
            None => self.input.derive(&self.beam, &self.settings),
        }
    }
}
