//! Bogus-move elimination
//!
//! Drops intermediate waypoints that continue in exactly the same
//! direction as the move before them. Kept for existing pipelines;
//! [`optimize_vector`](super::optimize_vector) does the same job with a
//! tolerance.

use crate::machine::{MoveMode, Toolpath, Vector};

/// Merge consecutive moves that share the same unit direction.
pub fn optimize_bogus_moves(toolpath: &mut Toolpath) {
    let mut optimized = Toolpath::with_capacity(toolpath.len());
    let mut last = Vector::default();
    let mut direction: Option<(MoveMode, Vector)> = None;

    for &waypoint in toolpath.iter() {
        let position = waypoint.vector();
        let delta = position.diff(last);
        last = position;

        if !waypoint.mode().is_motion() {
            direction = None;
            optimized.push(waypoint);
            continue;
        }

        let length = delta.norm();
        if length == 0.0 {
            continue;
        }

        let unit = Vector::new(delta.x / length, delta.y / length, delta.z / length);
        match direction {
            Some((mode, previous)) if mode == waypoint.mode() && previous == unit => {
                if let Some(kept) = optimized.last_mut() {
                    *kept = waypoint;
                }
            }
            _ => {
                optimized.push(waypoint);
                direction = Some((waypoint.mode(), unit));
            }
        }
    }

    log::debug!(
        "bogus moves: {} -> {} waypoints",
        toolpath.len(),
        optimized.len()
    );
    *toolpath = optimized;
}
