//! Feature kinds and their geometric derivations.
//!
//! Every kind derives itself from 3-D input (`from_plane`, `from_planes`,
//! `from_frame`, `from_line`, `from_volume`, `from_outline`) into a validated
//! [`Processing`](crate::Processing), and rebuilds its cutting geometry with
//! `to_geometry` (or `to_plane`/`to_planes` for the planar cuts).
//!
//! Plane and frame based kinds take the reference side explicitly; side 0 is
//! the conventional default. Volume and outline based kinds (lap, pocket,
//! slot) and drilling also accept `None` and pick the side facing the cut.

pub(crate) mod common;
mod double_cut;
mod dovetail_mortise;
mod dovetail_tenon;
mod drilling;
mod french_ridge_lap;
mod jack_rafter_cut;
mod lap;
mod longitudinal_cut;
mod mortise;
mod pocket;
mod scarf_joint;
mod slot;
mod step_joint;
mod step_joint_notch;
mod tenon;
mod text;

pub use double_cut::DoubleCut;
pub use dovetail_mortise::DovetailMortise;
pub use dovetail_tenon::{DovetailOptions, DovetailTenon};
pub use drilling::{Drilling, DrillingGeometry};
pub use french_ridge_lap::{FrenchRidgeLap, FrenchRidgeLapGeometry};
pub use jack_rafter_cut::JackRafterCut;
pub use lap::Lap;
pub use longitudinal_cut::{LongitudinalCut, LongitudinalCutGeometry, LongitudinalCutOptions};
pub use mortise::{Mortise, MortiseGeometry, MortiseOptions};
pub use pocket::Pocket;
pub use scarf_joint::{ScarfJoint, ScarfJointGeometry, ScarfJointOptions};
pub use slot::{Slot, SlotGeometry};
pub use step_joint::{StepJoint, StepJointGeometry};
pub use step_joint_notch::{StepJointNotch, StepJointNotchGeometry};
pub use tenon::{Tenon, TenonGeometry, TenonOptions};
pub use text::{Text, TextOptions};
