//! Linear sweep over a disassembly window

use crate::config::Window;
use crate::opcodes::{self, Opcode};

use super::fidelity::straddles;

/// What the sweep found at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// The byte is not an opcode
    Unknown,
    /// An opcode cut short by a known code address or the end of the buffer
    Split(&'static Opcode),
    /// A complete instruction
    Whole(&'static Opcode),
}

/// One step of the sweep: the bytes starting at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    pub position: usize,
    pub bytes: &'a [u8],
    pub kind: StepKind,
}

/// Forward sweep from the window offset to its end.
///
/// Every step advances the cursor by at least one byte. A known code address
/// is never stepped over: an instruction that would cross it is cut at the
/// address, and the address is consumed when the cursor reaches it. The last
/// instruction may run past the window end but never past the buffer.
#[derive(Debug, Clone)]
pub struct Sweep<'a> {
    program: &'a [u8],
    cursor: usize,
    prev: usize,
    end: usize,
    code_positions: &'a [usize],
    next_code: usize,
}

impl<'a> Sweep<'a> {
    /// `code_positions` must be ascending buffer positions.
    pub fn new(program: &'a [u8], window: &Window, code_positions: &'a [usize]) -> Self {
        let next_code = code_positions.partition_point(|&p| p <= window.offset);
        Self {
            program,
            cursor: window.offset,
            prev: window.offset,
            end: window.end().min(program.len()),
            code_positions,
            next_code,
        }
    }

    /// The next known code position not yet consumed.
    pub fn pending_code_position(&self) -> Option<usize> {
        self.code_positions.get(self.next_code).copied()
    }

    fn snap_to_code_position(&mut self) {
        if let Some(code) = self.pending_code_position() {
            if self.prev < code && self.cursor >= code {
                self.cursor = code;
                self.next_code += 1;
            }
        }
        self.prev = self.cursor;
    }
}

impl<'a> Iterator for Sweep<'a> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Step<'a>> {
        if self.cursor >= self.end {
            return None;
        }
        self.snap_to_code_position();

        let position = self.cursor;
        let step = match opcodes::lookup(self.program[position]) {
            None => Step {
                position,
                bytes: &self.program[position..position + 1],
                kind: StepKind::Unknown,
            },
            Some(op) => {
                let mut limit = position + op.length as usize;
                let mut split = false;
                if let Some(code) = self.pending_code_position() {
                    if straddles(position, op.length as usize, code) {
                        limit = code;
                        split = true;
                    }
                }
                if limit > self.program.len() {
                    limit = self.program.len();
                    split = true;
                }
                Step {
                    position,
                    bytes: &self.program[position..limit],
                    kind: if split {
                        StepKind::Split(op)
                    } else {
                        StepKind::Whole(op)
                    },
                }
            }
        };

        log::trace!("sweep step at {:#06x}: {:?}", position, step.kind);
        self.cursor += step.bytes.len();
        Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DisassemblyOptions;

    fn sweep_kinds(program: &[u8], code_positions: &[usize]) -> Vec<(usize, usize, &'static str)> {
        let window = DisassemblyOptions::default().window(program.len()).unwrap();
        Sweep::new(program, &window, code_positions)
            .map(|step| {
                let kind = match step.kind {
                    StepKind::Unknown => "unknown",
                    StepKind::Split(_) => "split",
                    StepKind::Whole(_) => "whole",
                };
                (step.position, step.bytes.len(), kind)
            })
            .collect()
    }

    #[test]
    fn test_plain_sweep() {
        // LDA #&C8; unknown; STA &1234; RTS
        let program = [0xA9, 0xC8, 0x02, 0x8D, 0x34, 0x12, 0x60];
        assert_eq!(
            sweep_kinds(&program, &[]),
            vec![(0, 2, "whole"), (2, 1, "unknown"), (3, 3, "whole"), (6, 1, "whole")]
        );
    }

    #[test]
    fn test_known_code_address_splits_instruction() {
        // JSR &60A9 would swallow the LDA at position 1
        let program = [0x20, 0xA9, 0x60, 0xEA];
        assert_eq!(
            sweep_kinds(&program, &[1]),
            vec![(0, 1, "split"), (1, 2, "whole"), (3, 1, "whole")]
        );
    }

    #[test]
    fn test_consecutive_code_addresses() {
        let program = [0x8D, 0x8D, 0x8D, 0xEA, 0xEA, 0xEA];
        assert_eq!(
            sweep_kinds(&program, &[1, 2]),
            vec![(0, 1, "split"), (1, 1, "split"), (2, 3, "whole"), (5, 1, "whole")]
        );
    }

    #[test]
    fn test_instruction_ending_on_code_address_is_whole() {
        let program = [0xA9, 0x01, 0xEA];
        assert_eq!(
            sweep_kinds(&program, &[2]),
            vec![(0, 2, "whole"), (2, 1, "whole")]
        );
    }

    #[test]
    fn test_final_instruction_overruns_window() {
        let program = [0xEA, 0xAD, 0x00, 0x30];
        let window = DisassemblyOptions::default()
            .with_length(2)
            .window(program.len())
            .unwrap();
        let steps: Vec<_> = Sweep::new(&program, &window, &[]).collect();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].bytes, &[0xAD, 0x00, 0x30]);
        assert!(matches!(steps[1].kind, StepKind::Whole(_)));
    }

    #[test]
    fn test_buffer_end_truncates_instruction() {
        let program = [0xEA, 0x4C, 0x00];
        assert_eq!(
            sweep_kinds(&program, &[]),
            vec![(0, 1, "whole"), (1, 2, "split")]
        );
    }

    #[test]
    fn test_code_address_at_offset_is_ignored() {
        let program = [0xA9, 0x00, 0x60];
        let window = DisassemblyOptions::default().window(program.len()).unwrap();
        let sweep = Sweep::new(&program, &window, &[0, 2]);
        assert_eq!(sweep.pending_code_position(), Some(2));
        assert_eq!(sweep.count(), 2);
    }
}
