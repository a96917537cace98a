//! Bulk toolpath transforms
//!
//! Whole-path rewrites applied after interpretation: axis swaps, feed and
//! scale adjustments, spindle enforcement, safety-height changes and the
//! return to origin.

use crate::error::OptimizeError;
use crate::machine::{ModalState, MoveMode, Toolpath, Waypoint};

/// Swap the X and Y axes of every waypoint.
pub fn flip_xy(toolpath: &mut Toolpath) {
    for waypoint in toolpath.iter_mut() {
        std::mem::swap(&mut waypoint.x, &mut waypoint.y);
    }
}

/// Clamp every feedrate to `ceiling`.
pub fn limit_feedrate(toolpath: &mut Toolpath, ceiling: f64) {
    for waypoint in toolpath.iter_mut() {
        if waypoint.state.feedrate > ceiling {
            waypoint.state.feedrate = ceiling;
        }
    }
}

/// Scale every feedrate by `multiplier`.
pub fn multiply_feedrate(toolpath: &mut Toolpath, multiplier: f64) {
    for waypoint in toolpath.iter_mut() {
        waypoint.state.feedrate *= multiplier;
    }
}

/// Scale every coordinate by `multiplier`.
///
/// This changes the physical part. Scaling around the origin also moves
/// the safety height and cut depths, so misuse can crash the tool.
pub fn multiply_moves(toolpath: &mut Toolpath, multiplier: f64) {
    for waypoint in toolpath.iter_mut() {
        waypoint.x *= multiplier;
        waypoint.y *= multiplier;
        waypoint.z *= multiplier;
    }
}

/// Force the spindle settings of every waypoint.
pub fn enforce_spindle(toolpath: &mut Toolpath, enabled: bool, clockwise: bool, speed: f64) {
    for waypoint in toolpath.iter_mut() {
        waypoint.state.spindle_enabled = enabled;
        waypoint.state.spindle_clockwise = clockwise;
        waypoint.state.spindle_speed = speed;
    }
}

/// Highest Z reached by the toolpath (never below zero).
pub fn find_safety_height(toolpath: &[Waypoint]) -> f64 {
    toolpath.iter().map(|w| w.z).fold(0.0, f64::max)
}

/// Move the safety plane to `height`.
///
/// Fails without touching the toolpath when `height` is at or below the
/// next lower Z plane used by the program.
pub fn set_safety_height(toolpath: &mut Toolpath, height: f64) -> Result<(), OptimizeError> {
    let max_z = find_safety_height(toolpath);
    let next_z = toolpath
        .iter()
        .map(|w| w.z)
        .filter(|&z| z < max_z)
        .fold(0.0, f64::max);

    if height <= next_z {
        return Err(OptimizeError::SafetyHeightCollision { lower: next_z });
    }

    // Rewrite vertical moves onto the safety plane and travel along it
    let (mut last_x, mut last_y, mut last_z) = (0.0, 0.0, 0.0);
    let mut rewritten = 0usize;
    for waypoint in toolpath.iter_mut() {
        let (x, y, z) = (waypoint.x, waypoint.y, waypoint.z);
        if z == max_z && (waypoint.same_xy(last_x, last_y) || last_z == max_z) {
            waypoint.z = height;
            rewritten += 1;
        }
        (last_x, last_y, last_z) = (x, y, z);
    }

    log::debug!(
        "safety height: {} -> {} ({} waypoints)",
        max_z,
        height,
        rewritten
    );
    Ok(())
}

/// Append the rapid moves needed to end at X0 Y0 Z0.
///
/// Adds nothing if the path already ends at the origin, a single drop if it
/// ends above the origin, travel-then-drop if it ends at the safety height
/// and lift-travel-drop otherwise. No drop is added when the travel
/// already arrives at Z0. The spindle and coolant flags are only
/// cleared on the final waypoint.
pub fn return_to_origin(toolpath: &mut Toolpath, disable_spindle: bool, disable_coolant: bool) {
    let Some(&last) = toolpath.last() else {
        return;
    };
    let max_z = find_safety_height(toolpath);

    let finish = |state: &mut ModalState| {
        if disable_spindle {
            state.spindle_enabled = false;
        }
        if disable_coolant {
            state.mist_coolant = false;
            state.flood_coolant = false;
        }
    };

    let at_origin_xy = last.x == 0.0 && last.y == 0.0;
    if at_origin_xy && last.z == 0.0 {
        if let Some(end) = toolpath.last_mut() {
            finish(&mut end.state);
        }
        return;
    }

    let mut moves = Vec::with_capacity(3);
    let mut step = last;
    step.state.mode = MoveMode::Rapid;

    if !at_origin_xy {
        if last.z != max_z {
            step.z = max_z;
            moves.push(step);
        }
        step.x = 0.0;
        step.y = 0.0;
        moves.push(step);
    }
    if step.z != 0.0 {
        step.z = 0.0;
        moves.push(step);
    }
    if let Some(end) = moves.last_mut() {
        finish(&mut end.state);
    }

    toolpath.extend(moves);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(x: f64, y: f64, z: f64) -> Waypoint {
        let state = ModalState {
            mode: MoveMode::Linear,
            feedrate: 500.0,
            spindle_enabled: true,
            flood_coolant: true,
            ..ModalState::default()
        };
        Waypoint::new(state, x, y, z)
    }

    fn job() -> Toolpath {
        vec![
            wp(0.0, 0.0, 0.0),
            wp(0.0, 0.0, 10.0),
            wp(5.0, 5.0, 10.0),
            wp(5.0, 5.0, 5.0),
            wp(5.0, 5.0, -1.0),
            wp(5.0, 5.0, 10.0),
        ]
    }

    #[test]
    fn test_flip_and_scale() {
        let mut path = vec![wp(1.0, 2.0, 3.0)];
        flip_xy(&mut path);
        assert_eq!((path[0].x, path[0].y), (2.0, 1.0));

        multiply_moves(&mut path, 2.0);
        assert_eq!((path[0].x, path[0].y, path[0].z), (4.0, 2.0, 6.0));
    }

    #[test]
    fn test_feedrate_adjustments() {
        let mut path = vec![wp(0.0, 0.0, 0.0), wp(1.0, 0.0, 0.0)];
        path[0].state.feedrate = 100.0;

        limit_feedrate(&mut path, 300.0);
        assert_eq!(path[0].state.feedrate, 100.0);
        assert_eq!(path[1].state.feedrate, 300.0);

        multiply_feedrate(&mut path, 1.5);
        assert_eq!(path[1].state.feedrate, 450.0);
    }

    #[test]
    fn test_enforce_spindle() {
        let mut path = job();
        enforce_spindle(&mut path, true, false, 9000.0);
        assert!(path.iter().all(|w| w.state.spindle_enabled
            && !w.state.spindle_clockwise
            && w.state.spindle_speed == 9000.0));
    }

    #[test]
    fn test_set_safety_height_rewrites_plane() {
        let mut path = job();
        assert_eq!(find_safety_height(&path), 10.0);

        set_safety_height(&mut path, 7.0).unwrap();
        let zs: Vec<f64> = path.iter().map(|w| w.z).collect();
        assert_eq!(zs, vec![0.0, 7.0, 7.0, 5.0, -1.0, 7.0]);
    }

    #[test]
    fn test_set_safety_height_rejects_collision() {
        let mut path = job();
        let original = path.clone();

        for height in [5.0, 4.0] {
            assert_eq!(
                set_safety_height(&mut path, height),
                Err(OptimizeError::SafetyHeightCollision { lower: 5.0 })
            );
            assert_eq!(path, original);
        }
    }

    #[test]
    fn test_return_from_safety_height() {
        let mut path = job();
        return_to_origin(&mut path, true, true);

        assert_eq!(path.len(), 8);
        assert_eq!(path[6].vector().z, 10.0);
        assert_eq!((path[6].x, path[6].y), (0.0, 0.0));
        assert!(path[6].state.spindle_enabled);
        let end = path[7];
        assert_eq!((end.x, end.y, end.z), (0.0, 0.0, 0.0));
        assert_eq!(end.mode(), MoveMode::Rapid);
        assert!(!end.state.spindle_enabled);
        assert!(!end.state.flood_coolant);
    }

    #[test]
    fn test_return_from_depth_lifts_first() {
        let mut path = job();
        path.push(wp(6.0, 5.0, -1.0));
        return_to_origin(&mut path, false, false);

        let tail: Vec<(f64, f64, f64)> = path[7..].iter().map(|w| (w.x, w.y, w.z)).collect();
        assert_eq!(
            tail,
            vec![(6.0, 5.0, 10.0), (0.0, 0.0, 10.0), (0.0, 0.0, 0.0)]
        );
        assert!(path[9].state.spindle_enabled);
    }

    #[test]
    fn test_return_along_floor_skips_drop() {
        let mut path = vec![wp(0.0, 0.0, 0.0), wp(4.0, 3.0, 0.0)];
        return_to_origin(&mut path, true, false);

        assert_eq!(path.len(), 3);
        let end = path[2];
        assert_eq!((end.x, end.y, end.z), (0.0, 0.0, 0.0));
        assert_eq!(end.mode(), MoveMode::Rapid);
        assert!(!end.state.spindle_enabled);
    }

    #[test]
    fn test_return_from_above_origin_and_at_origin() {
        let mut above = vec![wp(0.0, 0.0, 0.0), wp(0.0, 0.0, 3.0)];
        return_to_origin(&mut above, true, false);
        assert_eq!(above.len(), 3);
        assert_eq!(above[2].z, 0.0);

        let mut home = vec![wp(1.0, 0.0, 0.0), wp(0.0, 0.0, 0.0)];
        return_to_origin(&mut home, true, false);
        assert_eq!(home.len(), 2);
        assert!(!home[1].state.spindle_enabled);
        assert!(home[1].state.flood_coolant);
    }
}
