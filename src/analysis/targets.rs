//! Branch analysis pass
//!
//! Forward references need to know which targets get labels before the first
//! line is printed, and a target is only valid if the sweep actually starts
//! an instruction there. Both are known only after a complete sweep.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Window;
use crate::opcodes::{self, AddressingMode, Flow};
use crate::os::{self, OS_CALLS};
use crate::Address;

use super::sweep::{StepKind, Sweep};

/// Surviving branch and jump targets, numbered in ascending address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    indices: BTreeMap<Address, usize>,
}

impl LabelTable {
    /// Number the given target addresses from zero in ascending order.
    pub fn from_targets(targets: impl IntoIterator<Item = Address>) -> Self {
        let sorted: BTreeSet<Address> = targets.into_iter().collect();
        Self {
            indices: sorted.into_iter().enumerate().map(|(i, a)| (a, i)).collect(),
        }
    }

    pub fn index_of(&self, address: Address) -> Option<usize> {
        self.indices.get(&address).copied()
    }

    /// Label name for `address`, if it is a surviving target.
    pub fn name_of(&self, address: Address) -> Option<String> {
        self.index_of(address).map(label_name)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

pub fn label_name(index: usize) -> String {
    format!("label_{}", index)
}

/// Result of the branch analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Labels for targets that start a reachable instruction
    pub labels: LabelTable,
    /// Runtime address of every step the sweep visited
    pub reachable: BTreeSet<Address>,
    /// OS call addresses targeted by JMP/JSR
    pub used_os_calls: BTreeSet<Address>,
    /// Base addresses of OS vectors referenced by absolute operands
    pub used_os_vectors: BTreeSet<Address>,
}

/// Runtime target of the branch at `position`, or `None` if it would fall
/// below address zero.
pub fn branch_target(position: usize, bytes: &[u8], branch_adjust: Address) -> Option<Address> {
    let target = position as i64 + i64::from(opcodes::branch_displacement(bytes)) + i64::from(branch_adjust);
    Address::try_from(target).ok()
}

/// Sweep the window once, collecting reachable instruction starts, candidate
/// targets, and used OS addresses, then keep only reachable targets.
pub fn find_branch_targets(program: &[u8], window: &Window, code_positions: &[usize]) -> Analysis {
    let mut analysis = Analysis::default();
    let mut candidates = BTreeSet::new();

    for step in Sweep::new(program, window, code_positions) {
        analysis.reachable.insert(window.address_of(step.position));

        // Unknown bytes and cut instructions carry no flow information
        let StepKind::Whole(op) = step.kind else {
            continue;
        };

        match op.classify() {
            Flow::Branch => {
                if let Some(target) = branch_target(step.position, step.bytes, window.branch_adjust) {
                    candidates.insert(target);
                }
            }
            Flow::Jump => {
                // Indirect jump targets are unknown
                if op.is_absolute_jump() {
                    let target = Address::from(opcodes::operand_word(step.bytes));
                    candidates.insert(target);
                    if OS_CALLS.contains(target) {
                        analysis.used_os_calls.insert(target);
                    }
                }
            }
            Flow::Neither => {
                if op.mode == AddressingMode::Absolute {
                    let operand = Address::from(opcodes::operand_word(step.bytes));
                    if let Some(vector) = os::vector_ref(operand) {
                        analysis.used_os_vectors.insert(vector.symbol().address);
                    }
                }
            }
        }
    }

    // Targets computed from data bytes often land mid-instruction
    let total = candidates.len();
    candidates.retain(|target| analysis.reachable.contains(target));
    log::debug!(
        "Branch analysis: {} steps, {} of {} targets reachable",
        analysis.reachable.len(),
        candidates.len(),
        total
    );

    analysis.labels = LabelTable::from_targets(candidates);
    analysis
}
