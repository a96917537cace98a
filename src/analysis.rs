//! Toolpath statistics: bounding box, feedrate inventory and runtime estimate.

use std::time::Duration;

use serde::Serialize;

use crate::machine::{MoveMode, Vector, Waypoint};

/// Tool change when the new tool was announced in advance.
pub const SUGGESTED_TOOL_CHANGE: Duration = Duration::from_secs(5);
/// Tool change without a prior suggestion.
pub const UNSUGGESTED_TOOL_CHANGE: Duration = Duration::from_secs(10);
/// Feedrate assumed when none is set (mm/min).
pub const DEFAULT_FEEDRATE: f64 = 300.0;
/// Rapid moves are estimated this many times faster than their feedrate.
pub const RAPID_FACTOR: f64 = 8.0;

/// Bounding box and distinct feedrates of a toolpath.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathInfo {
    pub min: Vector,
    pub max: Vector,
    /// Distinct feedrates in order of first use
    pub feedrates: Vec<f64>,
}

/// Scan the toolpath once for its extent and feedrates.
pub fn info(toolpath: &[Waypoint]) -> Option<PathInfo> {
    let first = toolpath.first()?.vector();
    let mut info = PathInfo {
        min: first,
        max: first,
        feedrates: Vec::new(),
    };

    for waypoint in toolpath {
        info.min.x = info.min.x.min(waypoint.x);
        info.min.y = info.min.y.min(waypoint.y);
        info.min.z = info.min.z.min(waypoint.z);
        info.max.x = info.max.x.max(waypoint.x);
        info.max.y = info.max.y.max(waypoint.y);
        info.max.z = info.max.z.max(waypoint.z);

        let feed = waypoint.state.feedrate;
        if !info.feedrates.contains(&feed) {
            info.feedrates.push(feed);
        }
    }

    Some(info)
}

/// Estimate how long the job takes to run.
pub fn estimate_runtime(toolpath: &[Waypoint]) -> Duration {
    let mut eta = Duration::ZERO;
    let mut last_tool: Option<u32> = None;
    let mut suggested_tool: Option<u32> = None;
    let mut last = Vector::default();

    for waypoint in toolpath {
        let state = &waypoint.state;
        if last_tool != Some(state.tool_index) {
            eta = eta.saturating_add(if suggested_tool == Some(state.tool_index) {
                SUGGESTED_TOOL_CHANGE
            } else {
                UNSUGGESTED_TOOL_CHANGE
            });
        }
        last_tool = Some(state.tool_index);
        suggested_tool = Some(state.next_tool_index);

        let position = waypoint.vector();
        let distance = position.diff(last).norm();
        last = position;

        let feed = if state.feedrate > 0.0 {
            state.feedrate
        } else {
            DEFAULT_FEEDRATE
        };

        let minutes = match state.mode {
            MoveMode::None | MoveMode::CwArc | MoveMode::CcwArc => continue,
            MoveMode::Dwell => {
                eta = eta.saturating_add(seconds(state.dwell_time.max(0.0)));
                continue;
            }
            MoveMode::Rapid => distance / (feed * RAPID_FACTOR),
            MoveMode::Linear => distance / feed,
        };
        eta = eta.saturating_add(seconds(minutes * 60.0));
    }

    eta
}

/// Durations too large to represent clamp to `Duration::MAX`.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::ModalState;

    fn wp(mode: MoveMode, feedrate: f64, x: f64, y: f64, z: f64) -> Waypoint {
        let state = ModalState {
            mode,
            feedrate,
            ..ModalState::default()
        };
        Waypoint::new(state, x, y, z)
    }

    #[test]
    fn test_info_bounds_and_feeds() {
        let path = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0, 0.0),
            wp(MoveMode::Rapid, 0.0, -5.0, 2.0, 10.0),
            wp(MoveMode::Linear, 300.0, 7.0, 3.0, -2.0),
            wp(MoveMode::Linear, 300.0, 1.0, -4.0, -1.0),
        ];
        let info = info(&path).unwrap();

        assert_eq!(info.min, Vector::new(-5.0, -4.0, -2.0));
        assert_eq!(info.max, Vector::new(7.0, 3.0, 10.0));
        assert_eq!(info.feedrates, vec![0.0, 300.0]);
    }

    #[test]
    fn test_info_empty() {
        assert_eq!(info(&[]), None);
    }

    #[test]
    fn test_runtime_linear_rapid_dwell() {
        let mut dwell = wp(MoveMode::Dwell, 600.0, 600.0, 0.0, 0.0);
        dwell.state.dwell_time = 2.5;
        let path = vec![
            wp(MoveMode::None, 0.0, 0.0, 0.0, 0.0),
            // 600 mm at 600 mm/min: one minute
            wp(MoveMode::Linear, 600.0, 600.0, 0.0, 0.0),
            dwell,
            // 480 mm rapid at 8 * 60 mm/min: one minute
            wp(MoveMode::Rapid, 60.0, 600.0, 480.0, 0.0),
        ];

        let eta = estimate_runtime(&path);
        let expected = UNSUGGESTED_TOOL_CHANGE.as_secs_f64() + 60.0 + 2.5 + 60.0;
        assert!((eta.as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_runtime_tool_changes() {
        let mut first = wp(MoveMode::None, 0.0, 0.0, 0.0, 0.0);
        first.state.next_tool_index = 2;
        let mut suggested = first;
        suggested.state.tool_index = 2;
        suggested.state.next_tool_index = 2;
        let mut surprise = suggested;
        surprise.state.tool_index = 5;

        let eta = estimate_runtime(&[first, suggested, surprise]);
        let expected = UNSUGGESTED_TOOL_CHANGE + SUGGESTED_TOOL_CHANGE + UNSUGGESTED_TOOL_CHANGE;
        assert_eq!(eta, expected);
    }

    #[test]
    fn test_runtime_saturates_on_huge_values() {
        let mut dwell = wp(MoveMode::Dwell, 0.0, 0.0, 0.0, 0.0);
        dwell.state.dwell_time = 1e20;
        assert_eq!(estimate_runtime(&[dwell]), Duration::MAX);

        let crawl = wp(MoveMode::Linear, 1e-21, 1000.0, 0.0, 0.0);
        assert_eq!(estimate_runtime(&[crawl, crawl, dwell]), Duration::MAX);
    }

    #[test]
    fn test_runtime_default_feed() {
        let path = vec![wp(MoveMode::Linear, 0.0, 300.0, 0.0, 0.0)];
        let eta = estimate_runtime(&path);
        let expected = UNSUGGESTED_TOOL_CHANGE.as_secs_f64() + 60.0;
        assert!((eta.as_secs_f64() - expected).abs() < 1e-6);
    }
}
