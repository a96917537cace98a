//! Drill-speed optimization
//!
//! Remembers how deep every (X,Y) location has already been drilled. A
//! later plunge at the same spot travels through the cleared depth at
//! rapid speed and only feeds through new material.

use std::collections::HashMap;

use crate::machine::{MoveMode, Toolpath};

/// Rewrite repeated plunges so already-cleared depth is traversed at rapid.
pub fn optimize_drill_speed(toolpath: &mut Toolpath) {
    let mut drilled: HashMap<(u64, u64), f64> = HashMap::new();
    let mut optimized = Toolpath::with_capacity(toolpath.len());
    let (mut last_x, mut last_y, mut last_z) = (0.0, 0.0, 0.0);
    let mut rewritten = 0usize;

    for &waypoint in toolpath.iter() {
        let is_plunge = waypoint.same_xy(last_x, last_y)
            && waypoint.z < last_z
            && waypoint.mode() == MoveMode::Linear;
        let start_z = last_z;
        (last_x, last_y, last_z) = (waypoint.x, waypoint.y, waypoint.z);

        if !is_plunge {
            optimized.push(waypoint);
            continue;
        }

        // Adding 0.0 folds -0.0 into 0.0 so both land on the same key
        let key = ((waypoint.x + 0.0).to_bits(), (waypoint.y + 0.0).to_bits());
        let previous = drilled.get(&key).copied();
        drilled
            .entry(key)
            .and_modify(|depth| *depth = depth.min(waypoint.z))
            .or_insert(waypoint.z);

        match previous {
            // Nothing below our start has been cleared here yet
            None => optimized.push(waypoint),
            Some(depth) if depth >= start_z => optimized.push(waypoint),
            Some(depth) if waypoint.z >= depth => {
                let mut fast = waypoint;
                fast.state.mode = MoveMode::Rapid;
                optimized.push(fast);
                rewritten += 1;
            }
            Some(depth) => {
                let mut fast = waypoint;
                fast.z = depth;
                fast.state.mode = MoveMode::Rapid;
                optimized.push(fast);
                optimized.push(waypoint);
                rewritten += 1;
            }
        }
    }

    log::debug!("drill speed: rewrote {} plunges", rewritten);
    *toolpath = optimized;
}
