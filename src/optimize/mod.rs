//! Toolpath Optimizer
//!
//! Independent passes that rewrite a finished toolpath without changing
//! the physical path of the tool. Every pass takes exclusive access to the
//! toolpath and either edits it in place or swaps in a rebuilt sequence.
//!
//! Passes are order sensitive: drill-speed detection must run before the
//! bogus-move and vector passes, which may merge the plunges it looks for.

pub mod bogus;
pub mod drill;
pub mod grouping;
pub mod lift;
pub mod vector;

pub use bogus::optimize_bogus_moves;
pub use drill::optimize_drill_speed;
pub use grouping::optimize_route_grouping;
pub use lift::optimize_lift_speed;
pub use vector::optimize_vector;
