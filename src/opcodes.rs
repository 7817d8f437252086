//! # 6502 Opcode Table
//!
//! Static mapping from opcode byte to instruction descriptor. The table holds
//! the 151 documented NMOS 6502 opcodes plus the handful of undocumented ones
//! (ANC, SLO, SRE) that turn up in BBC Micro software. Every other byte value
//! is unknown and gets emitted as data.

use std::fmt;

/// How an instruction interprets its operand bytes.
///
/// Branches are tagged [`AddressingMode::Implicit`]; they are recognised by
/// [`Opcode::classify`] and rendered specially by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand (BRK, RTS) or a relative branch
    Implicit,
    /// Operates on the accumulator (ASL A)
    Accumulator,
    /// 8-bit constant (LDA #&10)
    Immediate,
    /// 16-bit address (LDA &1234)
    Absolute,
    /// 8-bit zero page address (LDA &12)
    ZeroPage,
    /// Zero page address plus X (LDA &12,X)
    ZeroPageX,
    /// Zero page address plus Y (LDX &12,Y)
    ZeroPageY,
    /// Address stored in memory, JMP only (JMP (&1234))
    Indirect,
    /// 16-bit address plus X (LDA &1234,X)
    AbsoluteX,
    /// 16-bit address plus Y (LDA &1234,Y)
    AbsoluteY,
    /// Zero page table indexed by X (LDA (&80,X))
    IndirectX,
    /// Zero page pointer then plus Y (LDA (&80),Y)
    IndirectY,
}

impl AddressingMode {
    /// True for the three modes that carry a full 16-bit data address.
    pub fn is_absolute(self) -> bool {
        matches!(
            self,
            AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY
        )
    }
}

/// Control-flow class of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Conditional relative branch
    Branch,
    /// JMP or JSR
    Jump,
    /// Everything else
    Neither,
}

/// One 6502 instruction descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// Opcode byte
    pub value: u8,
    /// Instruction mnemonic
    pub mnemonic: &'static str,
    /// Total size in bytes including the opcode (1-3)
    pub length: u8,
    /// Addressing mode
    pub mode: AddressingMode,
}

pub const JMP_ABSOLUTE: u8 = 0x4C;
pub const JMP_INDIRECT: u8 = 0x6C;
pub const JSR_ABSOLUTE: u8 = 0x20;

/// Undocumented mnemonics present in the table. BeebAsm rejects them.
pub const UNDOCUMENTED_MNEMONICS: [&str; 3] = ["ANC", "SLO", "SRE"];

const BRANCH_MNEMONICS: [&str; 8] = ["BPL", "BMI", "BVC", "BVS", "BCC", "BCS", "BNE", "BEQ"];
const JUMP_MNEMONICS: [&str; 2] = ["JMP", "JSR"];

impl Opcode {
    /// Whether the target assembler accepts this mnemonic.
    pub fn is_documented(&self) -> bool {
        !UNDOCUMENTED_MNEMONICS.contains(&self.mnemonic)
    }

    /// Branch, jump, or neither.
    pub fn classify(&self) -> Flow {
        if BRANCH_MNEMONICS.contains(&self.mnemonic) {
            Flow::Branch
        } else if JUMP_MNEMONICS.contains(&self.mnemonic) {
            Flow::Jump
        } else {
            Flow::Neither
        }
    }

    /// JMP or JSR with a 16-bit target written in the instruction.
    pub fn is_absolute_jump(&self) -> bool {
        self.value == JMP_ABSOLUTE || self.value == JSR_ABSOLUTE
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:02X}, {:?})", self.mnemonic, self.value, self.mode)
    }
}

/// Little-endian 16-bit operand of a 3-byte instruction.
pub fn operand_word(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[1], bytes[2]])
}

/// Signed displacement of a branch, biased by the 2-byte instruction length
/// so it is relative to the branch opcode itself.
pub fn branch_displacement(bytes: &[u8]) -> i32 {
    i32::from(bytes[1] as i8) + 2
}

const fn op(value: u8, mnemonic: &'static str, length: u8, mode: AddressingMode) -> Opcode {
    Opcode {
        value,
        mnemonic,
        length,
        mode,
    }
}

use AddressingMode::*;

/// Every opcode the disassembler knows, grouped by mnemonic.
pub const OPCODES: &[Opcode] = &[
    op(0x69, "ADC", 2, Immediate),
    op(0x65, "ADC", 2, ZeroPage),
    op(0x75, "ADC", 2, ZeroPageX),
    op(0x6D, "ADC", 3, Absolute),
    op(0x7D, "ADC", 3, AbsoluteX),
    op(0x79, "ADC", 3, AbsoluteY),
    op(0x61, "ADC", 2, IndirectX),
    op(0x71, "ADC", 2, IndirectY),
    op(0x0B, "ANC", 2, Immediate),
    op(0x2B, "ANC", 2, Immediate),
    op(0x29, "AND", 2, Immediate),
    op(0x25, "AND", 2, ZeroPage),
    op(0x35, "AND", 2, ZeroPageX),
    op(0x2D, "AND", 3, Absolute),
    op(0x3D, "AND", 3, AbsoluteX),
    op(0x39, "AND", 3, AbsoluteY),
    op(0x21, "AND", 2, IndirectX),
    op(0x31, "AND", 2, IndirectY),
    op(0x0A, "ASL", 1, Accumulator),
    op(0x06, "ASL", 2, ZeroPage),
    op(0x16, "ASL", 2, ZeroPageX),
    op(0x0E, "ASL", 3, Absolute),
    op(0x1E, "ASL", 3, AbsoluteX),
    op(0x24, "BIT", 2, ZeroPage),
    op(0x2C, "BIT", 3, Absolute),
    op(0x10, "BPL", 2, Implicit),
    op(0x30, "BMI", 2, Implicit),
    op(0x50, "BVC", 2, Implicit),
    op(0x70, "BVS", 2, Implicit),
    op(0x90, "BCC", 2, Implicit),
    op(0xB0, "BCS", 2, Implicit),
    op(0xD0, "BNE", 2, Implicit),
    op(0xF0, "BEQ", 2, Implicit),
    op(0x00, "BRK", 1, Implicit),
    op(0xC9, "CMP", 2, Immediate),
    op(0xC5, "CMP", 2, ZeroPage),
    op(0xD5, "CMP", 2, ZeroPageX),
    op(0xCD, "CMP", 3, Absolute),
    op(0xDD, "CMP", 3, AbsoluteX),
    op(0xD9, "CMP", 3, AbsoluteY),
    op(0xC1, "CMP", 2, IndirectX),
    op(0xD1, "CMP", 2, IndirectY),
    op(0xE0, "CPX", 2, Immediate),
    op(0xE4, "CPX", 2, ZeroPage),
    op(0xEC, "CPX", 3, Absolute),
    op(0xC0, "CPY", 2, Immediate),
    op(0xC4, "CPY", 2, ZeroPage),
    op(0xCC, "CPY", 3, Absolute),
    op(0xC6, "DEC", 2, ZeroPage),
    op(0xD6, "DEC", 2, ZeroPageX),
    op(0xCE, "DEC", 3, Absolute),
    op(0xDE, "DEC", 3, AbsoluteX),
    op(0x49, "EOR", 2, Immediate),
    op(0x45, "EOR", 2, ZeroPage),
    op(0x55, "EOR", 2, ZeroPageX),
    op(0x4D, "EOR", 3, Absolute),
    op(0x5D, "EOR", 3, AbsoluteX),
    op(0x59, "EOR", 3, AbsoluteY),
    op(0x41, "EOR", 2, IndirectX),
    op(0x51, "EOR", 2, IndirectY),
    op(0x18, "CLC", 1, Implicit),
    op(0x38, "SEC", 1, Implicit),
    op(0x58, "CLI", 1, Implicit),
    op(0x78, "SEI", 1, Implicit),
    op(0xB8, "CLV", 1, Implicit),
    op(0xD8, "CLD", 1, Implicit),
    op(0xF8, "SED", 1, Implicit),
    op(0xE6, "INC", 2, ZeroPage),
    op(0xF6, "INC", 2, ZeroPageX),
    op(0xEE, "INC", 3, Absolute),
    op(0xFE, "INC", 3, AbsoluteX),
    op(JMP_ABSOLUTE, "JMP", 3, Absolute),
    op(JMP_INDIRECT, "JMP", 3, Indirect),
    op(JSR_ABSOLUTE, "JSR", 3, Absolute),
    op(0xA9, "LDA", 2, Immediate),
    op(0xA5, "LDA", 2, ZeroPage),
    op(0xB5, "LDA", 2, ZeroPageX),
    op(0xAD, "LDA", 3, Absolute),
    op(0xBD, "LDA", 3, AbsoluteX),
    op(0xB9, "LDA", 3, AbsoluteY),
    op(0xA1, "LDA", 2, IndirectX),
    op(0xB1, "LDA", 2, IndirectY),
    op(0xA2, "LDX", 2, Immediate),
    op(0xA6, "LDX", 2, ZeroPage),
    op(0xB6, "LDX", 2, ZeroPageY),
    op(0xAE, "LDX", 3, Absolute),
    op(0xBE, "LDX", 3, AbsoluteY),
    op(0xA0, "LDY", 2, Immediate),
    op(0xA4, "LDY", 2, ZeroPage),
    op(0xB4, "LDY", 2, ZeroPageX),
    op(0xAC, "LDY", 3, Absolute),
    op(0xBC, "LDY", 3, AbsoluteX),
    op(0x4A, "LSR", 1, Accumulator),
    op(0x46, "LSR", 2, ZeroPage),
    op(0x56, "LSR", 2, ZeroPageX),
    op(0x4E, "LSR", 3, Absolute),
    op(0x5E, "LSR", 3, AbsoluteX),
    op(0xEA, "NOP", 1, Implicit),
    op(0x09, "ORA", 2, Immediate),
    op(0x05, "ORA", 2, ZeroPage),
    op(0x15, "ORA", 2, ZeroPageX),
    op(0x0D, "ORA", 3, Absolute),
    op(0x1D, "ORA", 3, AbsoluteX),
    op(0x19, "ORA", 3, AbsoluteY),
    op(0x01, "ORA", 2, IndirectX),
    op(0x11, "ORA", 2, IndirectY),
    op(0xAA, "TAX", 1, Implicit),
    op(0x8A, "TXA", 1, Implicit),
    op(0xCA, "DEX", 1, Implicit),
    op(0xE8, "INX", 1, Implicit),
    op(0xA8, "TAY", 1, Implicit),
    op(0x98, "TYA", 1, Implicit),
    op(0x88, "DEY", 1, Implicit),
    op(0xC8, "INY", 1, Implicit),
    op(0x2A, "ROL", 1, Accumulator),
    op(0x26, "ROL", 2, ZeroPage),
    op(0x36, "ROL", 2, ZeroPageX),
    op(0x2E, "ROL", 3, Absolute),
    op(0x3E, "ROL", 3, AbsoluteX),
    op(0x6A, "ROR", 1, Accumulator),
    op(0x66, "ROR", 2, ZeroPage),
    op(0x76, "ROR", 2, ZeroPageX),
    op(0x6E, "ROR", 3, Absolute),
    op(0x7E, "ROR", 3, AbsoluteX),
    op(0x40, "RTI", 1, Implicit),
    op(0x60, "RTS", 1, Implicit),
    op(0xE9, "SBC", 2, Immediate),
    op(0xE5, "SBC", 2, ZeroPage),
    op(0xF5, "SBC", 2, ZeroPageX),
    op(0xED, "SBC", 3, Absolute),
    op(0xFD, "SBC", 3, AbsoluteX),
    op(0xF9, "SBC", 3, AbsoluteY),
    op(0xE1, "SBC", 2, IndirectX),
    op(0xF1, "SBC", 2, IndirectY),
    op(0x47, "SRE", 2, ZeroPage),
    op(0x57, "SRE", 2, ZeroPageX),
    op(0x4F, "SRE", 3, Absolute),
    op(0x5F, "SRE", 3, AbsoluteX),
    op(0x5B, "SRE", 3, AbsoluteY),
    op(0x43, "SRE", 2, IndirectX),
    op(0x53, "SRE", 2, IndirectY),
    op(0x85, "STA", 2, ZeroPage),
    op(0x95, "STA", 2, ZeroPageX),
    op(0x8D, "STA", 3, Absolute),
    op(0x9D, "STA", 3, AbsoluteX),
    op(0x99, "STA", 3, AbsoluteY),
    op(0x81, "STA", 2, IndirectX),
    op(0x91, "STA", 2, IndirectY),
    op(0x9A, "TXS", 1, Implicit),
    op(0xBA, "TSX", 1, Implicit),
    op(0x48, "PHA", 1, Implicit),
    op(0x68, "PLA", 1, Implicit),
    op(0x08, "PHP", 1, Implicit),
    op(0x28, "PLP", 1, Implicit),
    op(0x07, "SLO", 2, ZeroPage),
    op(0x17, "SLO", 2, ZeroPageX),
    op(0x0F, "SLO", 3, Absolute),
    op(0x1F, "SLO", 3, AbsoluteX),
    op(0x1B, "SLO", 3, AbsoluteY),
    op(0x03, "SLO", 2, IndirectX),
    op(0x13, "SLO", 2, IndirectY),
    op(0x86, "STX", 2, ZeroPage),
    op(0x96, "STX", 2, ZeroPageY),
    op(0x8E, "STX", 3, Absolute),
    op(0x84, "STY", 2, ZeroPage),
    op(0x94, "STY", 2, ZeroPageX),
    op(0x8C, "STY", 3, Absolute),
];

static OPCODE_TABLE: [Option<Opcode>; 256] = build_table();

const fn build_table() -> [Option<Opcode>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < OPCODES.len() {
        table[OPCODES[i].value as usize] = Some(OPCODES[i]);
        i += 1;
    }
    table
}

/// Look up the descriptor for an opcode byte.
pub fn lookup(byte: u8) -> Option<&'static Opcode> {
    OPCODE_TABLE[byte as usize].as_ref()
}
