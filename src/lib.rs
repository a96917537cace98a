//! GCode Toolpath Compiler
//!
//! Interprets 3-axis CNC G-code into a flat list of waypoints and rewrites
//! that list to run faster without changing where the tool cuts.
//!
//! This library provides:
//! - GCode parsing into address-word blocks
//! - A machine interpreter (units, distance modes, work offsets, arcs)
//! - Optimizer passes and bulk toolpath transforms
//! - Toolpath statistics and runtime estimation
//! - Configuration management for the `gcode-opt` binary

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod machine;
pub mod optimize;
pub mod parser;
pub mod transform;

// Re-exports for clean public API
pub use analysis::{PathInfo, estimate_runtime, info};
pub use config::Config;
pub use error::{MachineError, OptimizeError, ParseError};
pub use machine::{Machine, ModalState, MoveMode, Toolpath, Vector, Waypoint};
pub use parser::{Block, parse_line, parse_program};
