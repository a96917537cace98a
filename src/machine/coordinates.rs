//! Work coordinate systems (G54..G59) and the one-shot G53 override.

use serde::{Deserialize, Serialize};

use super::state::Vector;
use crate::error::{MachineError, Result};

/// Number of selectable work frames.
pub const FRAME_COUNT: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    offsets: [Vector; FRAME_COUNT],
    /// Zero-based index of the active frame
    active: usize,
    override_active: bool,
}

impl CoordinateSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select frame `index` (1 = G54 ... 6 = G59).
    pub fn select(&mut self, index: usize) -> Result<()> {
        let slot = frame_slot(index)?;
        self.active = slot;
        Ok(())
    }

    /// Active frame number, 1-based.
    pub fn selected(&self) -> usize {
        self.active + 1
    }

    /// Set the offset of frame `index` (1-based).
    pub fn set_offset(&mut self, index: usize, offset: Vector) -> Result<()> {
        let slot = frame_slot(index)?;
        self.offsets[slot] = offset;
        Ok(())
    }

    /// Offset to apply to absolute coordinates. Machine coordinates
    /// (zero) while the override is active.
    pub fn active_offset(&self) -> Vector {
        if self.override_active {
            Vector::default()
        } else {
            self.offsets[self.active]
        }
    }

    pub fn enable_override(&mut self) {
        self.override_active = true;
    }

    pub fn disable_override(&mut self) {
        self.override_active = false;
    }

    pub fn override_active(&self) -> bool {
        self.override_active
    }
}

fn frame_slot(index: usize) -> Result<usize> {
    if (1..=FRAME_COUNT).contains(&index) {
        Ok(index - 1)
    } else {
        Err(MachineError::InvalidCoordinateSystem(index as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_and_offset() {
        let mut cs = CoordinateSystem::new();
        assert_eq!(cs.selected(), 1);

        cs.set_offset(2, Vector::new(10.0, 20.0, -5.0)).unwrap();
        assert_eq!(cs.active_offset(), Vector::default());

        cs.select(2).unwrap();
        assert_eq!(cs.active_offset(), Vector::new(10.0, 20.0, -5.0));
    }

    #[test]
    fn test_override_zeroes_offset() {
        let mut cs = CoordinateSystem::new();
        cs.set_offset(1, Vector::new(1.0, 1.0, 1.0)).unwrap();

        cs.enable_override();
        assert_eq!(cs.active_offset(), Vector::default());
        cs.disable_override();
        assert_eq!(cs.active_offset(), Vector::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_invalid_frame() {
        let mut cs = CoordinateSystem::new();
        assert!(cs.select(0).is_err());
        assert!(cs.select(7).is_err());
    }
}
