//! Output format module implementation

mod json;

pub use self::json::*;

use std::fmt::{self, Write as _};
use std::io::Write;
use std::str::FromStr;

use clap::ValueEnum;

use crate::{DisassemblyError, Header, Line};

/// Column where the `\` comment marker starts.
pub const COMMENT_COLUMN: usize = 24;

/// Column where the printable rendering of the bytes starts.
pub const PRINTABLE_COLUMN: usize = 44;

const BANNER_RULE_WIDTH: usize = 78;

/// Supported output formats for disassembly listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// BeebAsm source (default)
    #[default]
    Text,
    /// JSON format (one document)
    Json,
    /// JSON Lines format (one JSON object per line)
    #[value(name = "jsonl")]
    JsonLines,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonLines => write!(f, "jsonl"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "beebasm" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "jsonlines" => Ok(OutputFormat::JsonLines),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Get all available output formats
    pub fn available_formats() -> &'static [Self] {
        &[OutputFormat::Text, OutputFormat::Json, OutputFormat::JsonLines]
    }

    /// Get a sink writing this format to `out`
    pub fn sink<'w, W: Write + 'w>(&self, out: W) -> Box<dyn ListingSink + 'w> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter::new(out)),
            OutputFormat::Json => Box::new(JsonFormatter::new(out)),
            OutputFormat::JsonLines => Box::new(JsonLinesFormatter::new(out)),
        }
    }
}

/// Receives a listing as it is produced: the header once, then every line.
pub trait ListingSink {
    /// Called once before any line
    fn header(&mut self, header: &Header) -> Result<(), DisassemblyError>;

    /// Called for each label, instruction, and data line in address order
    fn line(&mut self, line: &Line) -> Result<(), DisassemblyError>;

    /// Called after the last line
    fn finish(&mut self) -> Result<(), DisassemblyError> {
        Ok(())
    }
}

/// Writes BeebAsm source
pub struct TextFormatter<W: Write> {
    out: W,
}

impl<W: Write> TextFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ListingSink for TextFormatter<W> {
    fn header(&mut self, header: &Header) -> Result<(), DisassemblyError> {
        self.out.write_all(render_header(header).as_bytes())?;
        Ok(())
    }

    fn line(&mut self, line: &Line) -> Result<(), DisassemblyError> {
        writeln!(self.out, "{}", render_line(line))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DisassemblyError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Render the definitions block that precedes the code.
pub fn render_header(header: &Header) -> String {
    let rule = format!("\\ {}", "*".repeat(BANNER_RULE_WIDTH));
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    out.push_str("\\\n");
    let _ = writeln!(
        out,
        "\\ This disassembly was produced by {}",
        env!("CARGO_PKG_NAME")
    );
    out.push_str("\\\n");
    let _ = writeln!(out, "{}", rule);
    out.push('\n');

    if !header.os_calls.is_empty() {
        out.push_str("\\ OS Call Addresses\n");
        for symbol in &header.os_calls {
            let _ = writeln!(out, "{:<6} = &{:X}", symbol.name, symbol.address);
        }
        out.push('\n');
    }

    if !header.os_vectors.is_empty() {
        out.push_str("\\ OS Vector Addresses\n");
        for symbol in &header.os_vectors {
            let _ = writeln!(out, "{:<5} = &{:X}", symbol.name, symbol.address);
        }
        out.push('\n');
    }

    if !header.variables.is_empty() {
        out.push_str("\\ Variables\n");
        for var in &header.variables {
            let _ = writeln!(out, "{}", var);
        }
        out.push('\n');
    }

    if header.load_address != 0 {
        let _ = writeln!(out, "CODE% = &{:X}", header.load_address);
        out.push('\n');
        match header.origin.wrapping_sub(header.load_address) {
            0 => out.push_str("ORG CODE%\n"),
            skipped => {
                let _ = writeln!(out, "ORG CODE%+&{:X}", skipped);
            }
        }
        out.push('\n');
    } else if header.origin != 0 {
        let _ = writeln!(out, "ORG &{:X}", header.origin);
        out.push('\n');
    }

    out
}

/// Render one listing line without the trailing newline.
pub fn render_line(line: &Line) -> String {
    match line {
        Line::Label { name, .. } => format!(".{}", name),
        Line::Instruction {
            address,
            mnemonic,
            operand,
            bytes,
        } => {
            // [mnemonic operand]      \ [address] [bytes]   [printable]
            //                         ^ col 24              ^ col 44
            let mut out = format!(" {} {}", mnemonic, operand);
            pad_to(&mut out, COMMENT_COLUMN);
            let _ = write!(out, "\\ &{:04X}", address);
            for b in bytes {
                let _ = write!(out, " {:02X}", b);
            }
            append_printable(&mut out, bytes);
            out
        }
        Line::Data {
            address,
            bytes,
            undocumented,
        } => {
            // EQUB &xx,&xx            \ [address] UD [mnemonic]   [printable]
            let equb: Vec<String> = bytes.iter().map(|b| format!("&{:02X}", b)).collect();
            let mut out = format!(" EQUB {}", equb.join(","));
            pad_to(&mut out, COMMENT_COLUMN);
            let _ = write!(out, "\\ &{:04X} ", address);
            if let Some(mnemonic) = undocumented {
                let _ = write!(out, "UD {}", mnemonic);
            }
            append_printable(&mut out, bytes);
            out
        }
    }
}

/// Pad with spaces up to `column`, always adding at least one.
fn pad_to(out: &mut String, column: usize) {
    let n = column.saturating_sub(out.len()).max(1);
    out.extend(std::iter::repeat(' ').take(n));
}

fn append_printable(out: &mut String, bytes: &[u8]) {
    pad_to(out, PRINTABLE_COLUMN);
    out.extend(bytes.iter().map(|&b| printable(b)));
}

/// The byte as a printable ASCII character, or `.`.
pub fn printable(b: u8) -> char {
    if (32..=126).contains(&b) {
        b as char
    } else {
        '.'
    }
}
