//! Modal state and toolpath waypoints.

use serde::{Deserialize, Serialize};

/// How the tool travels to a waypoint from the one before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMode {
    #[default]
    None,
    Rapid,
    Linear,
    /// Modal only; arc chords are emitted as `Linear`.
    CwArc,
    CcwArc,
    Dwell,
}

impl MoveMode {
    /// Rapid and linear waypoints are the only ones that move the tool.
    pub fn is_motion(self) -> bool {
        matches!(self, MoveMode::Rapid | MoveMode::Linear)
    }
}

/// Settings that persist across blocks until changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub mode: MoveMode,
    /// Units per minute (mm/min once interpreted)
    pub feedrate: f64,
    pub spindle_enabled: bool,
    pub spindle_clockwise: bool,
    pub spindle_speed: f64,
    pub mist_coolant: bool,
    pub flood_coolant: bool,
    pub tool_index: u32,
    pub next_tool_index: u32,
    /// Seconds, only meaningful when `mode` is [`MoveMode::Dwell`]
    pub dwell_time: f64,
}

/// Plain 3-D vector used by the geometric passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn diff(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance ignoring Z.
    pub fn xy_distance(self, other: Vector) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn has_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }
}

/// One absolute point on the toolpath, in millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub state: ModalState,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Waypoint {
    pub fn new(state: ModalState, x: f64, y: f64, z: f64) -> Self {
        Self { state, x, y, z }
    }

    pub fn vector(&self) -> Vector {
        Vector::new(self.x, self.y, self.z)
    }

    pub fn same_xy(&self, x: f64, y: f64) -> bool {
        self.x == x && self.y == y
    }

    pub fn mode(&self) -> MoveMode {
        self.state.mode
    }
}

/// The ordered waypoint sequence; index order is execution order.
pub type Toolpath = Vec<Waypoint>;
