//! Position interpreter: resolves command fields into absolute
//! coordinates and appends waypoints, expanding arcs into chords.

use std::f64::consts::PI;

use super::{MM_PER_INCH, Machine};
use super::state::{MoveMode, Vector, Waypoint};
use crate::error::{MachineError, Result};
use crate::parser::WordSource;

/// Absolute end point and arc center of one command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPosition {
    pub end: Vector,
    pub center: Vector,
}

impl Machine {
    /// Resolve X/Y/Z and I/J/K of `words` against the previous position,
    /// the unit mode and the active coordinate system.
    pub fn resolve_position(&self, words: &impl WordSource) -> ResolvedPosition {
        let pos = self.current_position().vector();
        let offset = self.coordinate_system.active_offset();
        let scale = if self.imperial { MM_PER_INCH } else { 1.0 };

        // The override forces absolute interpretation for this block only
        let absolute = self.absolute_move || self.coordinate_system.override_active();

        let axis = |letter: char, previous: f64, origin: f64| match words.word(letter) {
            None => previous,
            Some(value) if absolute => value * scale + origin,
            Some(value) => value * scale + previous,
        };

        let end = Vector::new(
            axis('X', pos.x, offset.x),
            axis('Y', pos.y, offset.y),
            axis('Z', pos.z, offset.z),
        );

        let base = if self.absolute_arc { offset } else { pos };
        let center = Vector::new(
            words.word_or('I', 0.0) * scale + base.x,
            words.word_or('J', 0.0) * scale + base.y,
            words.word_or('K', 0.0) * scale + base.z,
        );

        ResolvedPosition { end, center }
    }

    /// Append a waypoint carrying the current modal state.
    pub fn move_to(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        let state = self.state;
        self.push(Waypoint::new(state, x, y, z))
    }

    fn push(&mut self, waypoint: Waypoint) -> Result<()> {
        if waypoint.vector().has_nan() {
            return Err(MachineError::NanCoordinate);
        }
        self.positions.push(waypoint);
        Ok(())
    }

    /// Append a dwell of `seconds` at the current position.
    pub fn dwell(&mut self, seconds: f64) {
        let pos = self.current_position();
        let mut state = self.state;
        state.mode = MoveMode::Dwell;
        state.dwell_time = seconds;
        self.positions.push(Waypoint::new(state, pos.x, pos.y, pos.z));
    }

    /// Approximate an arc from the current position to `end` around
    /// `center` with linear waypoints.
    ///
    /// The direction comes from the modal motion mode (`CwArc` or
    /// `CcwArc`). `rotations` counts full turns including the partial
    /// one, so 1 means "up to one circle".
    pub fn arc(&mut self, end: Vector, center: Vector, rotations: f64) -> Result<()> {
        if end.has_nan() || center.has_nan() {
            return Err(MachineError::NanCoordinate);
        }
        if rotations.is_nan() || rotations < 1.0 {
            return Err(MachineError::InvalidRotations(rotations));
        }

        let clockwise = self.state.mode == MoveMode::CwArc;
        let plane = self.plane;
        let start = self.current_position().vector();

        let [s1, s2, s3] = plane.to_local([start.x, start.y, start.z]);
        let [e1, e2, e3] = plane.to_local([end.x, end.y, end.z]);
        let [c1, c2, _] = plane.to_local([center.x, center.y, center.z]);

        let radius = (s1 - c1).hypot(s2 - c2);
        let end_radius = (e1 - c1).hypot(e2 - c2);
        if radius == 0.0 || end_radius == 0.0 {
            return Err(MachineError::ZeroRadius);
        }

        let difference = (end_radius - radius).abs();
        let percent = (difference / radius) * 100.0;
        if (difference > 0.005 && percent > 0.1) || difference > 0.5 {
            return Err(MachineError::RadiusMismatch {
                percent,
                difference,
            });
        }

        let theta1 = (s2 - c2).atan2(s1 - c1);
        let theta2 = (e2 - c2).atan2(e1 - c1);

        let mut sweep = theta2 - theta1;
        if sweep == 0.0 {
            sweep = if clockwise { -2.0 * PI } else { 2.0 * PI };
        } else if sweep < 0.0 && !clockwise {
            sweep += 2.0 * PI;
        } else if sweep > 0.0 && clockwise {
            sweep -= 2.0 * PI;
        }

        let extra_turns = (rotations - 1.0) * 2.0 * PI;
        sweep += if clockwise { -extra_turns } else { extra_turns };

        let steps = self.arc_steps(radius, sweep, e3 - s3);

        // Chords are always fed linearly; the modal arc mode stays intact
        let mut chord_state = self.state;
        chord_state.mode = MoveMode::Linear;

        let mut emit = |local: [f64; 3]| -> Result<()> {
            let [x, y, z] = plane.to_machine(local);
            self.push(Waypoint::new(chord_state, x, y, z))
        };

        if steps > 0 {
            let step_angle = sweep / steps as f64;
            let step_depth = (e3 - s3) / steps as f64;
            for i in 0..=steps {
                let angle = theta1 + step_angle * i as f64;
                emit([
                    c1 + radius * angle.cos(),
                    c2 + radius * angle.sin(),
                    s3 + step_depth * i as f64,
                ])?;
            }
        }

        emit([e1, e2, e3])
    }

    /// Number of chords for an arc: enough to respect the chord deviation,
    /// but never so many that a chord gets shorter than the minimum length.
    fn arc_steps(&self, radius: f64, sweep: f64, depth: f64) -> usize {
        let mut steps = 1;

        if self.max_arc_deviation < radius {
            let chord_angle = 2.0 * (1.0 - self.max_arc_deviation / radius).acos();
            steps = (sweep / chord_angle).abs().ceil() as usize;
        }

        let arc_length = sweep.abs() * (radius.powi(2) + (depth / sweep).powi(2)).sqrt();
        let max_steps = (arc_length / self.min_arc_line_length) as usize;

        steps.min(max_steps)
    }
}
