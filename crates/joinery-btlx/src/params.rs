//! Parameter intervals, BTLx literals and the ordered parameter map.

use crate::ValidationError;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// =============================================================================
// Intervals
// =============================================================================

/// A closed numeric interval for a parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
}

impl Interval {
    /// Create an interval.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies in the interval (bounds included, NaN rejected).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Validate a value for the named field.
    pub fn check(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Clamp a value into the interval.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Position along the blank.
pub const START_X: Interval = Interval::new(-100_000.0, 100_000.0);
/// Position across the reference side.
pub const START_Y: Interval = Interval::new(-50_000.0, 50_000.0);
/// Position below the reference side.
pub const START_DEPTH: Interval = Interval::new(-50_000.0, 50_000.0);
/// Angles that must stay away from 0 and 180 degrees.
pub const ANGLE: Interval = Interval::new(0.1, 179.9);
/// Full signed angle.
pub const SIGNED_ANGLE: Interval = Interval::new(-180.0, 180.0);
/// Signed angle that must stay away from +/-180 degrees.
pub const SIGNED_ANGLE_OPEN: Interval = Interval::new(-179.9, 179.9);
/// Depth into the blank.
pub const DEPTH: Interval = Interval::new(0.0, 50_000.0);
/// Length along the blank.
pub const LENGTH: Interval = Interval::new(0.0, 100_000.0);
/// Width across the blank.
pub const WIDTH: Interval = Interval::new(0.0, 50_000.0);
/// Joint feature dimensions (tenons, mortises, drill diameters, radii).
pub const JOINT_SIZE: Interval = Interval::new(0.0, 1000.0);
/// Joint feature lengths.
pub const JOINT_LENGTH: Interval = Interval::new(0.0, 5000.0);

// =============================================================================
// Literals
// =============================================================================

macro_rules! btlx_choice {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $literal:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $literal)]
                $variant,
            )+
        }

        impl $name {
            /// BTLx literal.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $literal,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($literal => Ok($name::$variant),)+
                    other => Err(ValidationError::InvalidChoice {
                        field: $field,
                        value: other.to_string(),
                        allowed: concat!($($literal, " "),+),
                    }),
                }
            }
        }
    };
}

btlx_choice! {
    /// Profile of a step joint or step joint notch.
    StepShape, "StepShape" {
        /// Single step at the front.
        Step => "step",
        /// Single heel at the back.
        Heel => "heel",
        /// Heel running out as one tapered face.
        TaperedHeel => "taperedheel",
        /// Step and heel.
        Double => "double",
    }
}

btlx_choice! {
    /// Corner shape of tenons and mortises.
    TenonShape, "Shape" {
        /// Chosen by the machine.
        Automatic => "automatic",
        /// Sharp corners.
        Square => "square",
        /// Fully rounded ends.
        Round => "round",
        /// Rounded corners.
        Rounded => "rounded",
        /// Corners with an explicit radius.
        Radius => "radius",
    }
}

btlx_choice! {
    /// How a dovetail mortise is bounded at the reference side.
    LimitationTop, "LimitationTop" {
        /// Closed at the top.
        Limited => "limited",
        /// Open through the top.
        Unlimited => "unlimited",
        /// Pocket below the top.
        Pocket => "pocket",
    }
}

btlx_choice! {
    /// Saw blade position relative to a longitudinal cut line.
    ToolPosition, "ToolPosition" {
        /// Blade left of the line.
        Left => "left",
        /// Blade centred on the line.
        Center => "center",
        /// Blade right of the line.
        Right => "right",
    }
}

btlx_choice! {
    /// Edge a French ridge lap is measured from.
    RefPosition, "RefPosition" {
        /// Reference edge of the reference side.
        RefEdge => "refedge",
        /// Edge opposite the reference edge.
        OppEdge => "oppedge",
    }
}

btlx_choice! {
    /// Vertical text alignment.
    AlignmentVertical, "AlignmentVertical" {
        /// Align to the top line.
        Top => "top",
        /// Centre vertically.
        Center => "center",
        /// Align to the baseline.
        Bottom => "bottom",
    }
}

btlx_choice! {
    /// Horizontal text alignment.
    AlignmentHorizontal, "AlignmentHorizontal" {
        /// Left aligned.
        Left => "left",
        /// Centred.
        Center => "center",
        /// Right aligned.
        Right => "right",
    }
}

btlx_choice! {
    /// Alignment of the lines of a multi-line text.
    AlignmentMultiline, "AlignmentMultiline" {
        /// Left aligned.
        Left => "left",
        /// Centred.
        Center => "center",
        /// Right aligned.
        Right => "right",
    }
}

impl Default for TenonShape {
    fn default() -> Self {
        TenonShape::Automatic
    }
}

impl Default for ToolPosition {
    fn default() -> Self {
        ToolPosition::Center
    }
}

impl Default for RefPosition {
    fn default() -> Self {
        RefPosition::RefEdge
    }
}

// =============================================================================
// Machining limits
// =============================================================================

/// Which bounding faces of a volumetric feature are explicitly limited.
///
/// An unlimited face coincides with (or lies beyond) the blank boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachiningLimits {
    /// Start face limited.
    pub face_limited_start: bool,
    /// End face limited.
    pub face_limited_end: bool,
    /// Front face limited.
    pub face_limited_front: bool,
    /// Back face limited.
    pub face_limited_back: bool,
    /// Top face limited.
    pub face_limited_top: bool,
    /// Bottom face limited.
    pub face_limited_bottom: bool,
}

impl MachiningLimits {
    /// Keys in serialization order.
    pub const KEYS: [&'static str; 6] = [
        "FaceLimitedStart",
        "FaceLimitedEnd",
        "FaceLimitedFront",
        "FaceLimitedBack",
        "FaceLimitedTop",
        "FaceLimitedBottom",
    ];

    /// Every face limited.
    pub fn all() -> Self {
        Self::from_array([true; 6])
    }

    /// Every face limited except the top, which lies on the reference side.
    pub fn open_top() -> Self {
        Self::from_array([true, true, true, true, false, true])
    }

    /// Flags in the order start, end, front, back, top, bottom.
    pub fn as_array(&self) -> [bool; 6] {
        [
            self.face_limited_start,
            self.face_limited_end,
            self.face_limited_front,
            self.face_limited_back,
            self.face_limited_top,
            self.face_limited_bottom,
        ]
    }

    /// Build from flags ordered like [`MachiningLimits::as_array`].
    pub fn from_array(flags: [bool; 6]) -> Self {
        let [start, end, front, back, top, bottom] = flags;
        Self {
            face_limited_start: start,
            face_limited_end: end,
            face_limited_front: front,
            face_limited_back: back,
            face_limited_top: top,
            face_limited_bottom: bottom,
        }
    }

    /// The nested parameter map.
    pub fn to_parameter_map(&self) -> ParameterMap {
        let mut map = ParameterMap::new();
        for (key, flag) in Self::KEYS.iter().zip(self.as_array()) {
            map.push(key, ParameterValue::Value(format_bool(flag).to_string()));
        }
        map
    }
}

impl Default for MachiningLimits {
    fn default() -> Self {
        Self::open_top()
    }
}

// =============================================================================
// Parameter map
// =============================================================================

/// A formatted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// A single formatted value.
    Value(String),
    /// A nested map (machining limits).
    Map(ParameterMap),
}

impl ParameterValue {
    /// The formatted value, if this is not a nested map.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Value(s) => Some(s),
            ParameterValue::Map(_) => None,
        }
    }
}

impl Serialize for ParameterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParameterValue::Value(s) => serializer.serialize_str(s),
            ParameterValue::Map(m) => m.serialize(serializer),
        }
    }
}

/// Ordered mapping from BTLx parameter key to formatted value.
///
/// Keys appear in insertion order; serialization preserves it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterMap {
    entries: Vec<(&'static str, ParameterValue)>,
}

impl ParameterMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, key: &'static str, value: ParameterValue) {
        self.entries.push((key, value));
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Look up a formatted scalar value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParameterValue::as_str)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ParameterValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a JSON object, keys in order.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Builds a [`ParameterMap`] with a fixed float precision.
#[derive(Debug, Clone)]
pub struct ParameterMapBuilder {
    precision: usize,
    map: ParameterMap,
}

impl ParameterMapBuilder {
    /// Start a map whose floats render with `precision` fractional digits.
    pub fn new(precision: usize) -> Self {
        Self {
            precision,
            map: ParameterMap::new(),
        }
    }

    /// Append a float.
    pub fn float(mut self, key: &'static str, value: f64) -> Self {
        let text = format_float(value, self.precision);
        self.map.push(key, ParameterValue::Value(text));
        self
    }

    /// Append a boolean as "yes"/"no".
    pub fn flag(mut self, key: &'static str, value: bool) -> Self {
        self.map
            .push(key, ParameterValue::Value(format_bool(value).to_string()));
        self
    }

    /// Append an integer.
    pub fn int(mut self, key: &'static str, value: i64) -> Self {
        self.map.push(key, ParameterValue::Value(value.to_string()));
        self
    }

    /// Append a literal or free text.
    pub fn text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.map.push(key, ParameterValue::Value(value.into()));
        self
    }

    /// Append machining limits as a nested map.
    pub fn limits(mut self, key: &'static str, limits: &MachiningLimits) -> Self {
        self.map
            .push(key, ParameterValue::Map(limits.to_parameter_map()));
        self
    }

    /// Finish the map.
    pub fn build(self) -> ParameterMap {
        self.map
    }
}

/// Format a float with a fixed number of fractional digits.
///
/// Negative zero renders without a sign.
pub fn format_float(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// BTLx boolean literal.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds_inclusive() {
        assert!(ANGLE.check("Angle", 0.1).is_ok());
        assert!(ANGLE.check("Angle", 179.9).is_ok());
        assert!(ANGLE.check("Angle", 0.09).is_err());
        assert!(ANGLE.check("Angle", f64::NAN).is_err());
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1985.30149, 3), "1985.301");
        assert_eq!(format_float(90.0, 3), "90.000");
        assert_eq!(format_float(-0.0001, 3), "0.000");
        assert_eq!(format_float(-2.5, 1), "-2.5");
    }

    #[test]
    fn test_builder_keeps_order() {
        let map = ParameterMapBuilder::new(3)
            .text("Orientation", "end")
            .float("StartX", 12.0)
            .flag("Chamfer", false)
            .build();
        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["Orientation", "StartX", "Chamfer"]);
        assert_eq!(map.get_str("Chamfer"), Some("no"));
        assert_eq!(map.get_str("StartX"), Some("12.000"));
    }

    #[test]
    fn test_limits_nested_map() {
        let map = ParameterMapBuilder::new(3)
            .limits("MachiningLimits", &MachiningLimits::open_top())
            .build();
        let nested = match map.get("MachiningLimits") {
            Some(ParameterValue::Map(m)) => m.clone(),
            other => panic!("expected nested map, got {other:?}"),
        };
        let keys: Vec<_> = nested.keys().collect();
        assert_eq!(keys, MachiningLimits::KEYS.to_vec());
        assert_eq!(nested.get_str("FaceLimitedTop"), Some("no"));
        assert_eq!(nested.get_str("FaceLimitedBottom"), Some("yes"));
    }

    #[test]
    fn test_json_preserves_order() {
        let map = ParameterMapBuilder::new(1)
            .float("Zeta", 1.0)
            .float("Alpha", 2.0)
            .build();
        assert_eq!(map.to_json_string().unwrap(), r#"{"Zeta":"1.0","Alpha":"2.0"}"#);
    }

    #[test]
    fn test_choice_literals() {
        assert_eq!(TenonShape::Radius.as_str(), "radius");
        assert_eq!("oppedge".parse::<RefPosition>().unwrap(), RefPosition::OppEdge);
        assert!(matches!(
            "diagonal".parse::<ToolPosition>(),
            Err(ValidationError::InvalidChoice { field: "ToolPosition", .. })
        ));
    }
}
