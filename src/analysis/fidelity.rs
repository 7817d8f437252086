//! Decides whether a step can be written as an instruction or must be
//! written as `EQUB` data for BeebAsm to reproduce the same bytes.

use crate::opcodes::{self, Opcode};

use super::sweep::{Step, StepKind};

/// How a step is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Decode as an instruction
    Code(&'static Opcode),
    /// Write the bytes verbatim, annotated with the mnemonic when undocumented
    Data { undocumented: Option<&'static str> },
}

/// Whether BeebAsm will assemble the instruction to the same bytes.
///
/// Given a 16-bit absolute operand below &100, e.g. `LDA &0012`, BeebAsm
/// picks the zero page encoding instead.
pub fn will_assemble_identically(op: &Opcode, bytes: &[u8]) -> bool {
    !(op.mode.is_absolute() && opcodes::operand_word(bytes) < 0x100)
}

/// Whether an instruction of `length` bytes at `cursor` runs past the next
/// known code position.
pub fn straddles(cursor: usize, length: usize, next_known: usize) -> bool {
    cursor + length > next_known
}

/// Classify one sweep step.
pub fn classify(step: &Step<'_>) -> Emit {
    match step.kind {
        StepKind::Unknown => Emit::Data { undocumented: None },
        StepKind::Split(op) => Emit::Data {
            undocumented: undocumented_mnemonic(op),
        },
        StepKind::Whole(op) => {
            if !op.is_documented() {
                Emit::Data {
                    undocumented: Some(op.mnemonic),
                }
            } else if !will_assemble_identically(op, step.bytes) {
                Emit::Data { undocumented: None }
            } else {
                Emit::Code(op)
            }
        }
    }
}

fn undocumented_mnemonic(op: &Opcode) -> Option<&'static str> {
    (!op.is_documented()).then_some(op.mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::lookup;
    use rstest::rstest;

    fn whole(bytes: &[u8]) -> Step<'_> {
        Step {
            position: 0,
            bytes,
            kind: StepKind::Whole(lookup(bytes[0]).unwrap()),
        }
    }

    #[rstest]
    #[case(&[0xAD, 0x12, 0x00], false)] // LDA &0012
    #[case(&[0xBD, 0xFF, 0x00], false)] // LDA &00FF,X
    #[case(&[0xB9, 0x00, 0x00], false)] // LDA &0000,Y
    #[case(&[0xAD, 0x00, 0x01], true)] // LDA &0100
    #[case(&[0xA5, 0x12], true)] // LDA &12
    #[case(&[0x6C, 0x12, 0x00], true)] // JMP (&0012)
    #[case(&[0xA9, 0x00], true)] // LDA #&00
    fn test_will_assemble_identically(#[case] bytes: &[u8], #[case] expected: bool) {
        let op = lookup(bytes[0]).unwrap();
        assert_eq!(will_assemble_identically(op, bytes), expected);
    }

    #[test]
    fn test_straddles() {
        assert!(straddles(0, 3, 1));
        assert!(straddles(0, 3, 2));
        assert!(!straddles(0, 3, 3));
        assert!(!straddles(5, 1, 9));
    }

    #[test]
    fn test_classify_zero_page_absolute_as_data() {
        let bytes = [0xAD, 0x12, 0x00];
        assert_eq!(classify(&whole(&bytes)), Emit::Data { undocumented: None });
    }

    #[test]
    fn test_classify_documented_as_code() {
        let bytes = [0xA9, 0xC8];
        assert_eq!(classify(&whole(&bytes)), Emit::Code(lookup(0xA9).unwrap()));
    }

    #[test]
    fn test_classify_undocumented() {
        let bytes = [0x4F, 0x00, 0x30];
        assert_eq!(
            classify(&whole(&bytes)),
            Emit::Data {
                undocumented: Some("SRE")
            }
        );

        let split = Step {
            position: 0,
            bytes: &bytes[..1],
            kind: StepKind::Split(lookup(0x4F).unwrap()),
        };
        assert_eq!(
            classify(&split),
            Emit::Data {
                undocumented: Some("SRE")
            }
        );
    }

    #[test]
    fn test_classify_split_and_unknown() {
        let bytes = [0x20, 0x00];
        let split = Step {
            position: 0,
            bytes: &bytes[..1],
            kind: StepKind::Split(lookup(0x20).unwrap()),
        };
        assert_eq!(classify(&split), Emit::Data { undocumented: None });

        let unknown = Step {
            position: 0,
            bytes: &[0x02],
            kind: StepKind::Unknown,
        };
        assert_eq!(classify(&unknown), Emit::Data { undocumented: None });
    }
}
