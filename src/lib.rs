//! Core IR, traits, and errors for the beeb_disasm 6502 disassembler.
//!
//! This library turns BBC Micro 6502 machine code into BeebAsm source that
//! reassembles to the original bytes. Disassembly runs in two passes over a
//! window of the program: the first discovers reachable instructions and
//! branch targets, the second decodes each step and streams listing lines
//! to a [`ListingSink`].
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::fs;
//! use beeb_disasm::{Disassembler, DisassemblyOptions};
//!
//! let program = fs::read("path/to/ELITE").unwrap();
//!
//! let options = DisassemblyOptions::default()
//!     .with_load_address(0x1900)
//!     .with_code_addresses(vec![0x1A00]);
//!
//! let mut disassembler = Disassembler::new(&program, options);
//! disassembler.write_text(std::io::stdout().lock()).unwrap();
//! ```
//!
//! Disk images are read with [`parser::DfsParser`]:
//!
//! ```rust,no_run
//! use beeb_disasm::{parser::DfsParser, DiskParser};
//!
//! let image = std::fs::read("games.ssd").unwrap();
//! let disk = DfsParser::new().parse(&image).unwrap();
//! for entry in &disk.files {
//!     println!("{} {:04X}", entry.qualified_name(), entry.length);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod decoder;
pub mod disassembler;
pub mod format;
pub mod opcodes;
pub mod os;
pub mod parser;

pub use config::{parse_number, DisassemblyOptions, Variable, Window};
pub use disassembler::{Disassembler, Phase};
pub use format::{ListingSink, OutputFormat};

/// A runtime address: an in-buffer position plus the load address.
pub type Address = u32;

/// One line of a disassembly listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A label placed before the instruction at `address`
    Label {
        /// Address the label names
        address: Address,
        /// Label name without the leading `.`
        name: String,
    },
    /// A decoded instruction
    Instruction {
        /// Runtime address of the opcode byte
        address: Address,
        /// Instruction mnemonic (e.g., "LDA", "JSR")
        mnemonic: &'static str,
        /// Rendered operand text, empty for implicit instructions
        operand: String,
        /// Raw bytes of the instruction
        bytes: Vec<u8>,
    },
    /// Bytes emitted verbatim with `EQUB`
    Data {
        /// Runtime address of the first byte
        address: Address,
        /// The bytes
        bytes: Vec<u8>,
        /// Mnemonic of the undocumented instruction these bytes encode
        undocumented: Option<&'static str>,
    },
}

impl Line {
    /// Runtime address this line refers to.
    pub fn address(&self) -> Address {
        match self {
            Line::Label { address, .. }
            | Line::Instruction { address, .. }
            | Line::Data { address, .. } => *address,
        }
    }

    /// Bytes covered by this line (empty for labels).
    pub fn bytes(&self) -> &[u8] {
        match self {
            Line::Label { .. } => &[],
            Line::Instruction { bytes, .. } | Line::Data { bytes, .. } => bytes,
        }
    }
}

/// A named address from one of the OS registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol name as written in the listing
    pub name: &'static str,
    /// Address the symbol stands for
    pub address: Address,
}

/// Definitions emitted once before any listing line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// OS entry points referenced by JMP/JSR, ascending by address
    pub os_calls: Vec<Symbol>,
    /// OS vectors referenced by absolute operands, ascending by address
    pub os_vectors: Vec<Symbol>,
    /// User variables in definition order
    pub variables: Vec<Variable>,
    /// Load address; zero means no `CODE%` definition
    pub load_address: Address,
    /// Address of the first listed byte; zero with no load address means no `ORG`
    pub origin: Address,
}

/// Parser trait: turn raw disk image bytes into a catalog.
pub trait DiskParser: Send + Sync {
    /// Parse a disk image
    ///
    /// # Arguments
    /// * `data` - The whole disk image
    ///
    /// # Returns
    /// Result containing the DiskImage if the catalog could be read
    fn parse(&self, data: &[u8]) -> Result<parser::DiskImage, DisassemblyError>;
}

/// Error type for disassembly operations
#[derive(Debug, thiserror::Error)]
pub enum DisassemblyError {
    /// Failed to parse a disk image
    #[error("Failed to parse disk image: {0}")]
    ParsingError(String),

    /// The requested window does not fit the program
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// A malformed number or variable definition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The decode pass stepped onto an address the analysis pass never visited
    #[error("Decode pass reached &{0:04X}, which the branch analysis never visited")]
    PassDesync(Address),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
