//! JSON and JSON Lines output formatters

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::ListingSink;
use crate::{DisassemblyError, Header, Line};

/// Serializable named address for JSON output
#[derive(Serialize, Deserialize)]
struct SymbolJson {
    name: String,
    address: String,
}

/// Serializable header for JSON output
#[derive(Serialize, Deserialize)]
struct HeaderJson {
    os_calls: Vec<SymbolJson>,
    os_vectors: Vec<SymbolJson>,
    variables: Vec<SymbolJson>,
    /// Omitted when there is no load address
    #[serde(skip_serializing_if = "Option::is_none")]
    load_address: Option<String>,
    /// Address of the first listed byte
    origin: String,
}

/// Serializable listing line for JSON output
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LineJson {
    Label {
        address: String,
        name: String,
    },
    Instruction {
        address: String,
        mnemonic: String,
        operand: String,
        /// Bytes of the instruction as hex string
        bytes: String,
    },
    Data {
        address: String,
        bytes: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        undocumented: Option<String>,
    },
}

/// Serializable listing for JSON output
#[derive(Serialize, Deserialize)]
struct ListingJson {
    header: HeaderJson,
    lines: Vec<LineJson>,
}

fn hex_address(address: crate::Address) -> String {
    format!("&{:04X}", address)
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn header_to_json(header: &Header) -> HeaderJson {
    let symbol = |name: &str, address| SymbolJson {
        name: name.to_string(),
        address: hex_address(address),
    };
    HeaderJson {
        os_calls: header.os_calls.iter().map(|s| symbol(s.name, s.address)).collect(),
        os_vectors: header.os_vectors.iter().map(|s| symbol(s.name, s.address)).collect(),
        variables: header.variables.iter().map(|v| symbol(&v.name, v.value)).collect(),
        load_address: (header.load_address != 0).then(|| hex_address(header.load_address)),
        origin: hex_address(header.origin),
    }
}

fn line_to_json(line: &Line) -> LineJson {
    match line {
        Line::Label { address, name } => LineJson::Label {
            address: hex_address(*address),
            name: name.clone(),
        },
        Line::Instruction {
            address,
            mnemonic,
            operand,
            bytes,
        } => LineJson::Instruction {
            address: hex_address(*address),
            mnemonic: mnemonic.to_string(),
            operand: operand.clone(),
            bytes: hex_bytes(bytes),
        },
        Line::Data {
            address,
            bytes,
            undocumented,
        } => LineJson::Data {
            address: hex_address(*address),
            bytes: hex_bytes(bytes),
            undocumented: undocumented.map(str::to_string),
        },
    }
}

/// Collects the listing and writes one pretty-printed JSON document when
/// finished.
pub struct JsonFormatter<W: Write> {
    out: W,
    header: Option<HeaderJson>,
    lines: Vec<LineJson>,
}

impl<W: Write> JsonFormatter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header: None,
            lines: Vec::new(),
        }
    }
}

impl<W: Write> ListingSink for JsonFormatter<W> {
    fn header(&mut self, header: &Header) -> Result<(), DisassemblyError> {
        self.header = Some(header_to_json(header));
        self.lines.clear();
        Ok(())
    }

    fn line(&mut self, line: &Line) -> Result<(), DisassemblyError> {
        self.lines.push(line_to_json(line));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DisassemblyError> {
        let listing = ListingJson {
            header: self
                .header
                .take()
                .unwrap_or_else(|| header_to_json(&Header::default())),
            lines: std::mem::take(&mut self.lines),
        };
        serde_json::to_writer_pretty(&mut self.out, &listing)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes one JSON object per line as the listing is produced.
pub struct JsonLinesFormatter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ListingSink for JsonLinesFormatter<W> {
    fn header(&mut self, header: &Header) -> Result<(), DisassemblyError> {
        let value = serde_json::json!({
            "type": "header",
            "header": header_to_json(header),
        });
        serde_json::to_writer(&mut self.out, &value)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn line(&mut self, line: &Line) -> Result<(), DisassemblyError> {
        serde_json::to_writer(&mut self.out, &line_to_json(line))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DisassemblyError> {
        self.out.flush()?;
        Ok(())
    }
}
