//! Working planes for arc interpolation.
//!
//! Each plane is a permutation of the X/Y/Z axes into a local
//! (primary, secondary, depth) frame so the arc math is written once.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plane {
    /// G17
    #[default]
    XY,
    /// G18
    XZ,
    /// G19
    YZ,
}

impl Plane {
    /// Machine axis index (0 = X, 1 = Y, 2 = Z) for each local slot.
    pub const fn axes(self) -> [usize; 3] {
        match self {
            Plane::XY => [0, 1, 2],
            Plane::XZ => [2, 0, 1],
            Plane::YZ => [1, 2, 0],
        }
    }

    /// Machine coordinates to (primary, secondary, depth).
    pub fn to_local(self, xyz: [f64; 3]) -> [f64; 3] {
        let [a, b, c] = self.axes();
        [xyz[a], xyz[b], xyz[c]]
    }

    /// (primary, secondary, depth) back to machine coordinates.
    pub fn to_machine(self, local: [f64; 3]) -> [f64; 3] {
        let mut xyz = [0.0; 3];
        for (slot, axis) in self.axes().into_iter().enumerate() {
            xyz[axis] = local[slot];
        }
        xyz
    }
}
