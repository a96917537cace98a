//! Error types for parsing, interpretation and optimization.

use thiserror::Error;

/// Errors produced while turning program text into blocks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A word whose value is not a number.
    #[error("invalid number in word '{0}'")]
    InvalidNumber(String),

    /// An address letter with nothing after it.
    #[error("word '{0}' has no value")]
    MissingValue(char),

    /// A failure on a given source line.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        source: Box<ParseError>,
    },
}

/// Fatal errors raised by the machine while interpreting a program.
///
/// These abort the current compilation unit; the toolpath built so far
/// should not be trusted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MachineError {
    /// A waypoint or arc input contained NaN.
    #[error("internal failure: move attempted with NaN value")]
    NanCoordinate,

    /// The arc center coincides with its start or end point.
    #[error("invalid arc: zero radius")]
    ZeroRadius,

    /// Start and end radius disagree beyond tolerance.
    #[error("arc radius deviation of {percent:.4} percent and {difference:.4} mm")]
    RadiusMismatch { percent: f64, difference: f64 },

    /// Arc rotation count below one.
    #[error("arc rotations must be at least 1, got {0}")]
    InvalidRotations(f64),

    /// Non-positive chord deviation or segment length.
    #[error("{name} must be positive, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    /// Coordinates given before any motion mode was selected.
    #[error("coordinates given without an active motion mode")]
    NoMotionMode,

    /// A G or M code the machine does not implement.
    #[error("unsupported word {letter}{value}")]
    UnsupportedWord { letter: char, value: f64 },

    /// Coordinate system index outside 1..=6.
    #[error("invalid coordinate system {0}")]
    InvalidCoordinateSystem(f64),

    /// A failure while running a given block.
    #[error("block {block}: {source}")]
    AtBlock {
        block: usize,
        source: Box<MachineError>,
    },
}

/// Recoverable validation failures reported by optimizer passes.
///
/// A pass that returns one of these leaves the toolpath untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("complex z-motion detected at waypoint {index}")]
    ComplexZMotion { index: usize },

    #[error("multiple drill feedrates detected ({first} and {second})")]
    MultipleDrillFeedrates { first: f64, second: f64 },

    #[error("rapid move in stock detected at waypoint {index}")]
    RapidInStock { index: usize },

    #[error("move above stock detected at waypoint {index}")]
    MoveAboveStock { index: usize },

    #[error("incomplete final drill set")]
    IncompleteFinalGroup,

    #[error("unable to detect safety height")]
    NoSafetyHeight,

    #[error("unable to detect drill feedrate")]
    NoDrillFeedrate,

    #[error("new safety height collides with lower feed height of {lower}")]
    SafetyHeightCollision { lower: f64 },
}

/// Result type for machine operations.
pub type Result<T> = std::result::Result<T, MachineError>;
