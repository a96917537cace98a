//! Route grouping
//!
//! Splits the toolpath into "down" groups, the runs spent below Z0
//! between a plunge and the next lift, and reorders them nearest-first
//! starting from the origin. Travel between groups is rebuilt: short hops
//! stay at cutting depth, everything else goes up to the safety height.
//!
//! The pass only understands simple drill/route programs. Anything it
//! cannot prove safe is rejected and the toolpath is left as it was.

use crate::error::OptimizeError;
use crate::machine::{MoveMode, Toolpath, Vector, Waypoint};

type Group = Vec<Waypoint>;

/// What the scan learned about the input.
#[derive(Debug)]
struct Survey {
    groups: Vec<Group>,
    safety_height: f64,
    drill_feedrate: f64,
}

/// Reorder down groups to shorten travel between them.
///
/// `tolerance` is the largest XY hop made without lifting to the safety
/// height.
pub fn optimize_route_grouping(
    toolpath: &mut Toolpath,
    tolerance: f64,
) -> Result<(), OptimizeError> {
    let Some(&origin) = toolpath.first() else {
        return Err(OptimizeError::NoSafetyHeight);
    };

    let survey = survey(toolpath)?;
    let group_count = survey.groups.len();
    let sorted = sort_nearest_first(survey.groups);
    let rebuilt = rebuild(
        origin,
        sorted,
        survey.safety_height,
        survey.drill_feedrate,
        tolerance,
    );

    log::debug!(
        "route grouping: {} groups, {} -> {} waypoints",
        group_count,
        toolpath.len(),
        rebuilt.len()
    );
    *toolpath = rebuilt;
    Ok(())
}

fn survey(toolpath: &[Waypoint]) -> Result<Survey, OptimizeError> {
    let (mut last_x, mut last_y, mut last_z) = (0.0, 0.0, 0.0);
    let mut groups = Vec::new();
    let mut current = Group::new();
    let mut in_group = false;
    let mut safety_height = 0.0_f64;
    let mut drill_feedrate = 0.0;

    for (index, &m) in toolpath.iter().enumerate() {
        let stationary = m.same_xy(last_x, last_y);

        if m.z != last_z && !stationary {
            return Err(OptimizeError::ComplexZMotion { index });
        }

        if stationary && last_z >= 0.0 && m.z < 0.0 {
            // Plunge into stock
            in_group = true;

            let feed = m.state.feedrate;
            if m.mode() == MoveMode::Linear && feed > 0.0 {
                if drill_feedrate == 0.0 {
                    drill_feedrate = feed;
                } else if feed != drill_feedrate {
                    return Err(OptimizeError::MultipleDrillFeedrates {
                        first: drill_feedrate,
                        second: feed,
                    });
                }
            }
        } else if stationary && last_z < 0.0 && m.z >= 0.0 {
            // Lift out of stock closes the group; the lift itself is rebuilt later
            if in_group {
                groups.push(std::mem::take(&mut current));
            }
            in_group = false;
            current.clear();
            safety_height = safety_height.max(m.z);
            (last_x, last_y, last_z) = (m.x, m.y, m.z);
            continue;
        } else if !stationary && m.z < 0.0 && m.mode() == MoveMode::Rapid {
            return Err(OptimizeError::RapidInStock { index });
        }

        if in_group {
            // Invariant guard: lifts and sideways Z changes are handled above
            if m.z > 0.0 {
                return Err(OptimizeError::MoveAboveStock { index });
            }
            current.push(m);
        }

        safety_height = safety_height.max(m.z);
        (last_x, last_y, last_z) = (m.x, m.y, m.z);
    }

    if safety_height == 0.0 {
        return Err(OptimizeError::NoSafetyHeight);
    }
    if drill_feedrate == 0.0 {
        return Err(OptimizeError::NoDrillFeedrate);
    }
    if !current.is_empty() {
        return Err(OptimizeError::IncompleteFinalGroup);
    }

    Ok(Survey {
        groups,
        safety_height,
        drill_feedrate,
    })
}

/// Greedy nearest-neighbour ordering by the XY position of each group's
/// first point. Equal distances prefer the group starting higher.
fn sort_nearest_first(mut groups: Vec<Group>) -> Vec<Group> {
    let mut sorted = Vec::with_capacity(groups.len());
    let mut position = Vector::default();

    while !groups.is_empty() {
        let mut selected = 0;
        for idx in 1..groups.len() {
            let candidate = groups[idx][0];
            let best = groups[selected][0];
            let candidate_distance = candidate.vector().xy_distance(position);
            let best_distance = best.vector().xy_distance(position);

            if candidate_distance < best_distance
                || (candidate_distance == best_distance && candidate.z > best.z)
            {
                selected = idx;
            }
        }

        let group = groups.remove(selected);
        position = group[0].vector();
        sorted.push(group);
    }

    sorted
}

fn rebuild(
    origin: Waypoint,
    groups: Vec<Group>,
    safety_height: f64,
    drill_feedrate: f64,
    tolerance: f64,
) -> Toolpath {
    let mut path = vec![origin];

    for group in groups {
        let mut points = group.into_iter();
        let Some(entry) = points.next() else {
            continue;
        };

        let current = *path.last().unwrap_or(&origin);
        if current.vector().xy_distance(entry.vector()) < tolerance {
            if !current.same_xy(entry.x, entry.y) {
                let mut step = current;
                step.state.mode = MoveMode::Linear;
                step.x = entry.x;
                step.y = entry.y;
                path.push(step);
            }
            path.push(entry);
        } else {
            let mut lift = current;
            lift.z = safety_height;
            lift.state.mode = MoveMode::Rapid;

            let mut travel = lift;
            travel.x = entry.x;
            travel.y = entry.y;

            let mut plunge = travel;
            plunge.z = entry.z;
            plunge.state.mode = MoveMode::Linear;
            plunge.state.feedrate = drill_feedrate;

            path.extend([lift, travel, plunge]);
        }

        path.extend(points);
    }

    // Never finish inside the stock
    if let Some(&last) = path.last()
        && last.z < safety_height
    {
        let mut lift = last;
        lift.z = safety_height;
        lift.state.mode = MoveMode::Rapid;
        path.push(lift);
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::ModalState;

    fn wp(mode: MoveMode, x: f64, y: f64, z: f64) -> Waypoint {
        let state = ModalState {
            mode,
            feedrate: 100.0,
            ..ModalState::default()
        };
        Waypoint::new(state, x, y, z)
    }

    /// Drill at (x, y) from safety height 5 down to `depth` and back up.
    fn hole(path: &mut Toolpath, x: f64, y: f64, depth: f64) {
        path.push(wp(MoveMode::Rapid, x, y, 5.0));
        path.push(wp(MoveMode::Linear, x, y, depth));
        path.push(wp(MoveMode::Rapid, x, y, 5.0));
    }

    fn holes(coords: &[(f64, f64)]) -> Toolpath {
        let mut path = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0),
            wp(MoveMode::Rapid, 0.0, 0.0, 5.0),
        ];
        for &(x, y) in coords {
            hole(&mut path, x, y, -1.0);
        }
        path
    }

    #[test]
    fn test_orders_holes_nearest_first() {
        let mut path = holes(&[(30.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        optimize_route_grouping(&mut path, 0.5).unwrap();

        let plunges: Vec<f64> = path
            .iter()
            .filter(|w| w.z < 0.0)
            .map(|w| w.x)
            .collect();
        assert_eq!(plunges, vec![10.0, 20.0, 30.0]);

        let last = path[path.len() - 1];
        assert_eq!(last.z, 5.0);
        assert_eq!(last.mode(), MoveMode::Rapid);
    }

    #[test]
    fn test_travel_goes_through_safety_height() {
        let mut path = holes(&[(10.0, 0.0)]);
        optimize_route_grouping(&mut path, 0.5).unwrap();

        // origin, lift, travel, plunge, final lift
        assert_eq!(path.len(), 5);
        assert_eq!(path[1].vector(), Vector::new(0.0, 0.0, 5.0));
        assert_eq!(path[2].vector(), Vector::new(10.0, 0.0, 5.0));
        assert_eq!(path[2].mode(), MoveMode::Rapid);
        assert_eq!(path[3].vector(), Vector::new(10.0, 0.0, -1.0));
        assert_eq!(path[3].mode(), MoveMode::Linear);
        assert_eq!(path[3].state.feedrate, 100.0);
    }

    #[test]
    fn test_tie_prefers_higher_group() {
        let mut path = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0),
            wp(MoveMode::Rapid, 0.0, 0.0, 5.0),
        ];
        hole(&mut path, 10.0, 0.0, -3.0);
        hole(&mut path, -10.0, 0.0, -1.0);
        optimize_route_grouping(&mut path, 0.5).unwrap();

        let first_plunge = path.iter().find(|w| w.z < 0.0).unwrap();
        assert_eq!(first_plunge.x, -10.0);
    }

    #[test]
    fn test_short_hop_stays_down() {
        let mut path = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0),
            wp(MoveMode::Rapid, 0.0, 0.0, 5.0),
            wp(MoveMode::Rapid, 1.0, 0.0, 5.0),
            wp(MoveMode::Linear, 1.0, 0.0, -1.0),
            wp(MoveMode::Linear, 2.0, 0.0, -1.0),
            wp(MoveMode::Rapid, 2.0, 0.0, 5.0),
            wp(MoveMode::Rapid, 2.1, 0.0, 5.0),
            wp(MoveMode::Linear, 2.1, 0.0, -1.0),
            wp(MoveMode::Rapid, 2.1, 0.0, 5.0),
        ];
        optimize_route_grouping(&mut path, 0.5).unwrap();

        assert_eq!(path[4].vector(), Vector::new(2.0, 0.0, -1.0));
        // Sideways step at depth, then the group's own entry point
        assert_eq!(path[5].vector(), Vector::new(2.1, 0.0, -1.0));
        assert_eq!(path[5].mode(), MoveMode::Linear);
        assert_eq!(path[6].vector(), Vector::new(2.1, 0.0, -1.0));
    }

    #[test]
    fn test_rejects_complex_z_motion() {
        let mut path = holes(&[(10.0, 0.0)]);
        path.push(wp(MoveMode::Linear, 12.0, 0.0, -1.0));
        let original = path.clone();

        assert_eq!(
            optimize_route_grouping(&mut path, 0.5),
            Err(OptimizeError::ComplexZMotion { index: 5 })
        );
        assert_eq!(path, original);
    }

    #[test]
    fn test_rejects_multiple_feedrates() {
        let mut path = holes(&[(10.0, 0.0), (20.0, 0.0)]);
        path[6].state.feedrate = 50.0;
        assert_eq!(
            optimize_route_grouping(&mut path, 0.5),
            Err(OptimizeError::MultipleDrillFeedrates {
                first: 100.0,
                second: 50.0
            })
        );
    }

    #[test]
    fn test_rejects_rapid_in_stock() {
        let mut path = holes(&[(10.0, 0.0)]);
        path.insert(4, wp(MoveMode::Rapid, 11.0, 0.0, -1.0));
        assert_eq!(
            optimize_route_grouping(&mut path, 0.5),
            Err(OptimizeError::RapidInStock { index: 4 })
        );
    }

    #[test]
    fn test_rejects_unfinished_group() {
        let mut path = holes(&[(10.0, 0.0)]);
        path.pop();
        assert_eq!(
            optimize_route_grouping(&mut path, 0.5),
            Err(OptimizeError::IncompleteFinalGroup)
        );
    }

    #[test]
    fn test_rejects_missing_safety_height_and_feed() {
        let mut flat = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0),
            wp(MoveMode::Linear, 1.0, 0.0, 0.0),
        ];
        assert_eq!(
            optimize_route_grouping(&mut flat, 0.5),
            Err(OptimizeError::NoSafetyHeight)
        );

        let mut no_plunge = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0),
            wp(MoveMode::Rapid, 0.0, 0.0, 5.0),
        ];
        assert_eq!(
            optimize_route_grouping(&mut no_plunge, 0.5),
            Err(OptimizeError::NoDrillFeedrate)
        );
    }
}
