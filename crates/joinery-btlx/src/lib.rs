#![warn(missing_docs)]

//! BTLx machining parameters for timber joinery.
//!
//! Derives the parameters of CNC timber processings (cuts, laps, tenons,
//! mortises, drillings, slots, markings) from 3-D cutting geometry placed on
//! a rectangular blank, and rebuilds that geometry from the parameters.
//!
//! Parameters are always expressed relative to one of the blank's six
//! reference sides (see [`joinery_kernel_blank::Beam`]).
//!
//! ```ignore
//! use joinery_btlx::{JackRafterCut, Processing};
//!
//! let processing = JackRafterCut::from_plane(&plane, &beam, 1)?;
//! let record = processing.record();
//! println!("{}", record.to_json_string()?);
//! let cut = processing.to_geometry(&beam)?;
//! ```

mod batch;
mod deferred;
mod error;
pub mod features;
mod orientation;
pub mod params;
mod processing;
mod settings;

pub use batch::derive_all;
pub use deferred::{DeferredProcessing, ProcessingInput};
pub use error::{ConfigError, ProcessingError, Result, ValidationError};
pub use features::*;
pub use orientation::{classify, Orientation, OrientationConvention};
pub use params::{
    AlignmentHorizontal, AlignmentMultiline, AlignmentVertical, LimitationTop, MachiningLimits, ParameterMap,
    ParameterValue, RefPosition, StepShape, TenonShape, ToolPosition,
};
pub use processing::{
    ElementShape, Feature, FeatureGeometry, GeometryElement, Processing, ProcessingKind, ProcessingRecord,
};
pub use settings::{BtlxSettings, DovetailTool};
