//! Lift-speed optimization

use crate::machine::{MoveMode, Toolpath};

/// Promote every pure Z retraction to a rapid move.
pub fn optimize_lift_speed(toolpath: &mut Toolpath) {
    let (mut last_x, mut last_y, mut last_z) = (0.0, 0.0, 0.0);
    let mut promoted = 0usize;

    for waypoint in toolpath.iter_mut() {
        if waypoint.same_xy(last_x, last_y) && waypoint.z > last_z {
            if waypoint.state.mode != MoveMode::Rapid {
                promoted += 1;
            }
            waypoint.state.mode = MoveMode::Rapid;
        }
        (last_x, last_y, last_z) = (waypoint.x, waypoint.y, waypoint.z);
    }

    log::debug!("lift speed: promoted {} retractions", promoted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{ModalState, Waypoint};

    fn linear(x: f64, y: f64, z: f64) -> Waypoint {
        let state = ModalState {
            mode: MoveMode::Linear,
            ..ModalState::default()
        };
        Waypoint::new(state, x, y, z)
    }

    #[test]
    fn test_retraction_becomes_rapid() {
        let mut path = vec![linear(0.0, 0.0, 0.0), linear(0.0, 0.0, 10.0)];
        optimize_lift_speed(&mut path);
        assert_eq!(path[1].mode(), MoveMode::Rapid);
    }

    #[test]
    fn test_descent_and_diagonal_rise_unchanged() {
        let mut path = vec![
            linear(0.0, 0.0, 10.0),
            linear(0.0, 0.0, 2.0),
            linear(1.0, 0.0, 3.0),
        ];
        optimize_lift_speed(&mut path);
        // First waypoint rises from the implicit origin
        assert_eq!(path[0].mode(), MoveMode::Rapid);
        assert_eq!(path[1].mode(), MoveMode::Linear);
        assert_eq!(path[2].mode(), MoveMode::Linear);
    }
}
