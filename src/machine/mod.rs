//! Machine context
//!
//! Holds everything that persists while a program is interpreted: the
//! modal state, coordinate systems, unit and distance modes, the working
//! plane, arc tunables and the toolpath being built.

pub mod coordinates;
mod dispatch;
pub mod plane;
mod positioning;
pub mod state;

pub use coordinates::CoordinateSystem;
pub use plane::Plane;
pub use positioning::ResolvedPosition;
pub use state::{ModalState, MoveMode, Toolpath, Vector, Waypoint};

use crate::error::{MachineError, Result};

pub(crate) const MM_PER_INCH: f64 = 25.4;

/// Default maximum distance between an arc and its approximating chords (mm).
pub const DEFAULT_MAX_ARC_DEVIATION: f64 = 0.002;
/// Default shortest segment emitted while approximating an arc (mm).
pub const DEFAULT_MIN_ARC_LINE_LENGTH: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Machine {
    pub state: ModalState,
    pub coordinate_system: CoordinateSystem,
    pub imperial: bool,
    pub absolute_move: bool,
    pub absolute_arc: bool,
    pub plane: Plane,
    positions: Toolpath,
    max_arc_deviation: f64,
    min_arc_line_length: f64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// A machine at the origin with metric, absolute moves, relative arc
    /// centers and the XY plane.
    pub fn new() -> Self {
        let state = ModalState::default();
        Self {
            state,
            coordinate_system: CoordinateSystem::new(),
            imperial: false,
            absolute_move: true,
            absolute_arc: false,
            plane: Plane::XY,
            positions: vec![Waypoint::new(state, 0.0, 0.0, 0.0)],
            max_arc_deviation: DEFAULT_MAX_ARC_DEVIATION,
            min_arc_line_length: DEFAULT_MIN_ARC_LINE_LENGTH,
        }
    }

    /// A machine with custom arc tunables; both must be positive.
    pub fn with_tolerances(max_arc_deviation: f64, min_arc_line_length: f64) -> Result<Self> {
        check_positive("max arc deviation", max_arc_deviation)?;
        check_positive("min arc line length", min_arc_line_length)?;

        Ok(Self {
            max_arc_deviation,
            min_arc_line_length,
            ..Self::new()
        })
    }

    pub fn max_arc_deviation(&self) -> f64 {
        self.max_arc_deviation
    }

    pub fn min_arc_line_length(&self) -> f64 {
        self.min_arc_line_length
    }

    pub fn toolpath(&self) -> &Toolpath {
        &self.positions
    }

    /// Exclusive access for optimizer passes.
    pub fn toolpath_mut(&mut self) -> &mut Toolpath {
        &mut self.positions
    }

    pub fn into_toolpath(self) -> Toolpath {
        self.positions
    }

    /// Last waypoint, or the origin if the toolpath has been emptied.
    pub fn current_position(&self) -> Waypoint {
        self.positions.last().copied().unwrap_or_default()
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MachineError::InvalidTolerance { name, value })
    }
}
