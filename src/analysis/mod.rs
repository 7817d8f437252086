//! The two analysis passes share one linear sweep over the window.
//!
//! The branch pass walks the sweep to find reachable instruction starts and
//! label targets; the decode pass walks it again and asks the fidelity
//! classifier how each step must be emitted.

pub mod fidelity;
pub mod sweep;
pub mod targets;

pub use fidelity::{classify, straddles, will_assemble_identically, Emit};
pub use sweep::{Step, StepKind, Sweep};
pub use targets::{branch_target, find_branch_targets, label_name, Analysis, LabelTable};
