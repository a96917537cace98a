//! Vector-tolerance simplification
//!
//! Slides a three-point window over runs of same-mode motion. When the
//! detour through the middle point is shorter than the tolerance, the
//! middle point is dropped.

use crate::machine::{MoveMode, Toolpath, Vector};

/// Remove nearly-collinear intermediate waypoints.
pub fn optimize_vector(toolpath: &mut Toolpath, tolerance: f64) {
    let mut optimized = Toolpath::with_capacity(toolpath.len());
    let mut window: Vec<Vector> = Vec::with_capacity(3);
    let mut run_mode: Option<MoveMode> = None;

    for &waypoint in toolpath.iter() {
        let mode = waypoint.mode();
        if !mode.is_motion() {
            window.clear();
            optimized.push(waypoint);
            continue;
        }

        if run_mode != Some(mode) {
            run_mode = Some(mode);
            window.clear();
        }

        let point = waypoint.vector();
        match window.len() {
            0 | 1 => {
                window.push(point);
                optimized.push(waypoint);
                continue;
            }
            2 => window.push(point),
            _ => {
                window.rotate_left(1);
                window[2] = point;
            }
        }

        let through = window[1].diff(window[0]).norm() + window[2].diff(window[1]).norm();
        let direct = window[2].diff(window[0]).norm();

        if through - direct < tolerance {
            // The middle point is redundant; the anchor stays put
            if let Some(kept) = optimized.last_mut() {
                *kept = waypoint;
            }
            window[1] = window[0];
        } else {
            optimized.push(waypoint);
        }
    }

    log::debug!(
        "vector: {} -> {} waypoints (tolerance {})",
        toolpath.len(),
        optimized.len(),
        tolerance
    );
    *toolpath = optimized;
}
