//! Block execution: applies the modal words of a block in a fixed order,
//! then runs its motion through the position interpreter.

use super::{MM_PER_INCH, Machine};
use super::plane::Plane;
use super::state::{MoveMode, Vector};
use crate::error::{MachineError, Result};
use crate::parser::ast::same_code;
use crate::parser::{Block, WordSource};

/// G codes that are accepted and have no effect on the toolpath.
const IGNORED_G: &[f64] = &[40.0, 49.0, 61.0, 64.0, 80.0, 94.0];
/// M codes that are accepted and have no effect on the toolpath.
const IGNORED_M: &[f64] = &[0.0, 1.0, 2.0, 30.0];

impl Machine {
    /// Run every block of a program, stopping at the first failure.
    pub fn run_program(&mut self, blocks: &[Block]) -> Result<()> {
        for (idx, block) in blocks.iter().enumerate() {
            self.run_block(block).map_err(|source| MachineError::AtBlock {
                block: idx + 1,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Apply one block.
    pub fn run_block(&mut self, block: &Block) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }

        let result = self.apply_block(block);
        // G53 only lasts for the block it appears in
        self.coordinate_system.disable_override();
        result
    }

    fn apply_block(&mut self, block: &Block) -> Result<()> {
        check_supported(block)?;

        // Units first so that F and G10 values in the same block are scaled
        if block.has_code('G', 20.0) {
            self.imperial = true;
        } else if block.has_code('G', 21.0) {
            self.imperial = false;
        }

        if let Some(feed) = block.word('F') {
            self.state.feedrate = if self.imperial { feed * MM_PER_INCH } else { feed };
        }
        if let Some(speed) = block.word('S') {
            self.state.spindle_speed = speed;
        }
        if let Some(tool) = block.word('T') {
            self.state.next_tool_index = tool.max(0.0) as u32;
        }
        if block.has_code('M', 6.0) {
            self.state.tool_index = self.state.next_tool_index;
        }

        for code in block.values('M') {
            match code as u32 {
                3 => {
                    self.state.spindle_enabled = true;
                    self.state.spindle_clockwise = true;
                }
                4 => {
                    self.state.spindle_enabled = true;
                    self.state.spindle_clockwise = false;
                }
                5 => self.state.spindle_enabled = false,
                7 => self.state.mist_coolant = true,
                8 => self.state.flood_coolant = true,
                9 => {
                    self.state.mist_coolant = false;
                    self.state.flood_coolant = false;
                }
                _ => {}
            }
        }

        if block.has_code('G', 17.0) {
            self.plane = Plane::XY;
        } else if block.has_code('G', 18.0) {
            self.plane = Plane::XZ;
        } else if block.has_code('G', 19.0) {
            self.plane = Plane::YZ;
        }

        if block.has_code('G', 53.0) {
            self.coordinate_system.enable_override();
        }
        if let Some(code) = block.values('G').find(|g| (54.0..=59.0).contains(g)) {
            self.coordinate_system.select(code as usize - 53)?;
        }

        // X/Y/Z of a G10 block are offsets, not a move
        let sets_offset = block.has_code('G', 10.0);
        if sets_offset {
            self.set_work_offset(block)?;
        }

        if block.has_code('G', 90.0) {
            self.absolute_move = true;
        } else if block.has_code('G', 91.0) {
            self.absolute_move = false;
        }
        if block.has_code('G', 90.1) {
            self.absolute_arc = true;
        } else if block.has_code('G', 91.1) {
            self.absolute_arc = false;
        }

        for code in block.values('G') {
            let mode = match code as u32 {
                _ if code.fract() != 0.0 => continue,
                0 => MoveMode::Rapid,
                1 => MoveMode::Linear,
                2 => MoveMode::CwArc,
                3 => MoveMode::CcwArc,
                _ => continue,
            };
            self.state.mode = mode;
        }

        if block.has_code('G', 4.0) {
            self.dwell(block.word_or('P', 0.0));
        }

        if sets_offset {
            return Ok(());
        }
        self.run_motion(block)
    }

    fn run_motion(&mut self, block: &Block) -> Result<()> {
        let has_axis = ['X', 'Y', 'Z'].iter().any(|&l| block.word(l).is_some());
        let has_center = ['I', 'J', 'K'].iter().any(|&l| block.word(l).is_some());

        match self.state.mode {
            MoveMode::Rapid | MoveMode::Linear if has_axis => {
                let resolved = self.resolve_position(block);
                let Vector { x, y, z } = resolved.end;
                self.move_to(x, y, z)
            }
            MoveMode::CwArc | MoveMode::CcwArc if has_axis || has_center => {
                let resolved = self.resolve_position(block);
                self.arc(resolved.end, resolved.center, block.word_or('P', 1.0))
            }
            MoveMode::None | MoveMode::Dwell if has_axis => Err(MachineError::NoMotionMode),
            _ => Ok(()),
        }
    }

    /// `G10 L2 Pn X.. Y.. Z..`: set the offset of frame n (P0 = active frame).
    fn set_work_offset(&mut self, block: &Block) -> Result<()> {
        match block.word('L') {
            Some(l) if same_code(l, 2.0) => {}
            Some(l) => return Err(MachineError::UnsupportedWord { letter: 'L', value: l }),
            None => {
                return Err(MachineError::UnsupportedWord {
                    letter: 'G',
                    value: 10.0,
                });
            }
        }

        let index = match block.word_or('P', 0.0) {
            p if p == 0.0 => self.coordinate_system.selected(),
            p if p.fract() == 0.0 && p > 0.0 => p as usize,
            p => return Err(MachineError::InvalidCoordinateSystem(p)),
        };
        let scale = if self.imperial { MM_PER_INCH } else { 1.0 };
        let offset = Vector::new(
            block.word_or('X', 0.0) * scale,
            block.word_or('Y', 0.0) * scale,
            block.word_or('Z', 0.0) * scale,
        );
        self.coordinate_system.set_offset(index, offset)
    }
}

fn check_supported(block: &Block) -> Result<()> {
    for word in &block.words {
        let supported = match word.letter {
            'G' => is_supported_g(word.value),
            'M' => is_supported_m(word.value),
            _ => true,
        };
        if !supported {
            return Err(MachineError::UnsupportedWord {
                letter: word.letter,
                value: word.value,
            });
        }
    }
    Ok(())
}

fn is_supported_g(code: f64) -> bool {
    const HANDLED: &[f64] = &[
        0.0, 1.0, 2.0, 3.0, 4.0, 10.0, 17.0, 18.0, 19.0, 20.0, 21.0, 53.0, 54.0, 55.0, 56.0,
        57.0, 58.0, 59.0, 90.0, 90.1, 91.0, 91.1,
    ];
    HANDLED.iter().chain(IGNORED_G).any(|&c| same_code(code, c))
}

fn is_supported_m(code: f64) -> bool {
    const HANDLED: &[f64] = &[3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    HANDLED.iter().chain(IGNORED_M).any(|&c| same_code(code, c))
}
