//! Two-pass disassembly driver

use std::fmt;
use std::io::Write;
use std::time::Instant;

use crate::analysis::{classify, find_branch_targets, label_name, Analysis, Emit, Sweep};
use crate::decoder::{decode, DecodeContext};
use crate::format::{ListingSink, TextFormatter};
use crate::os::{OS_CALLS, OS_VECTORS};
use crate::{DisassemblyError, DisassemblyOptions, Header, Line, Window};

/// Where a disassembly run has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Initializing,
    AnalyzingBranches,
    EmittingHeader,
    Decoding,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initializing",
            Phase::AnalyzingBranches => "analyzing branches",
            Phase::EmittingHeader => "emitting header",
            Phase::Decoding => "decoding",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Disassembles one program buffer.
///
/// Analysis state lives on the instance and is rebuilt on every run, so
/// running twice produces identical output.
#[derive(Debug)]
pub struct Disassembler<'a> {
    program: &'a [u8],
    options: DisassemblyOptions,
    analysis: Analysis,
    phase: Phase,
}

impl<'a> Disassembler<'a> {
    pub fn new(program: &'a [u8], options: DisassemblyOptions) -> Self {
        Self {
            program,
            options,
            analysis: Analysis::default(),
            phase: Phase::Initializing,
        }
    }

    /// Result of the most recent branch analysis pass.
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("Disassembler phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Run both passes, streaming the header and every line into `sink`.
    pub fn disassemble(&mut self, sink: &mut dyn ListingSink) -> Result<(), DisassemblyError> {
        let start_time = Instant::now();
        self.phase = Phase::Initializing;
        self.analysis = Analysis::default();

        let window = self.options.window(self.program.len())?;
        let code_positions = self.options.code_positions(&window);

        self.enter(Phase::AnalyzingBranches);
        self.analysis = find_branch_targets(self.program, &window, &code_positions);

        self.enter(Phase::EmittingHeader);
        sink.header(&self.header(&window))?;

        self.enter(Phase::Decoding);
        let ctx = DecodeContext {
            branch_adjust: window.branch_adjust,
            labels: &self.analysis.labels,
            variables: &self.options.variables,
        };
        let mut emitted = 0usize;
        for step in Sweep::new(self.program, &window, &code_positions) {
            let address = window.address_of(step.position);
            if !self.analysis.reachable.contains(&address) {
                return Err(DisassemblyError::PassDesync(address));
            }

            if let Some(index) = self.analysis.labels.index_of(address) {
                sink.line(&Line::Label {
                    address,
                    name: label_name(index),
                })?;
            }

            let line = match classify(&step) {
                Emit::Code(op) => Line::Instruction {
                    address,
                    mnemonic: op.mnemonic,
                    operand: decode(op, step.bytes, step.position, &ctx),
                    bytes: step.bytes.to_vec(),
                },
                Emit::Data { undocumented } => Line::Data {
                    address,
                    bytes: step.bytes.to_vec(),
                    undocumented,
                },
            };
            sink.line(&line)?;
            emitted += 1;
        }
        sink.finish()?;

        self.enter(Phase::Done);
        log::debug!(
            "Disassembled {} bytes into {} lines and {} labels in {:?}",
            window.length,
            emitted,
            self.analysis.labels.len(),
            start_time.elapsed()
        );
        Ok(())
    }

    /// Write BeebAsm source to `out`.
    pub fn write_text<W: Write>(&mut self, out: W) -> Result<(), DisassemblyError> {
        let mut sink = TextFormatter::new(out);
        self.disassemble(&mut sink)
    }

    /// BeebAsm source as a string.
    pub fn disassemble_to_string(&mut self) -> Result<String, DisassemblyError> {
        let mut buf = Vec::new();
        self.write_text(&mut buf)?;
        // Every byte written is ASCII
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// The header and listing lines as values.
    pub fn lines(&mut self) -> Result<(Header, Vec<Line>), DisassemblyError> {
        let mut collector = Collector::default();
        self.disassemble(&mut collector)?;
        Ok((collector.header, collector.lines))
    }

    fn header(&self, window: &Window) -> Header {
        Header {
            os_calls: self
                .analysis
                .used_os_calls
                .iter()
                .filter_map(|&a| OS_CALLS.symbol(a))
                .collect(),
            os_vectors: self
                .analysis
                .used_os_vectors
                .iter()
                .filter_map(|&a| OS_VECTORS.symbol(a))
                .collect(),
            variables: self.options.variables.clone(),
            load_address: self.options.load_address,
            origin: window.address_of(window.offset),
        }
    }
}

#[derive(Default)]
struct Collector {
    header: Header,
    lines: Vec<Line>,
}

impl ListingSink for Collector {
    fn header(&mut self, header: &Header) -> Result<(), DisassemblyError> {
        self.header = header.clone();
        Ok(())
    }

    fn line(&mut self, line: &Line) -> Result<(), DisassemblyError> {
        self.lines.push(line.clone());
        Ok(())
    }
}
