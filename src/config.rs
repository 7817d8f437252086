//! Disassembly configuration: the window, load address, known code
//! addresses, and user variables.

use std::fmt;
use std::str::FromStr;

use crate::{Address, DisassemblyError};

/// Options controlling one disassembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisassemblyOptions {
    /// Position in the program where disassembly starts
    pub offset: usize,

    /// Number of bytes to disassemble; `None` runs to the end of the program
    pub length: Option<usize>,

    /// Added to buffer positions to form runtime addresses. A non-zero value
    /// also emits a `CODE%`/`ORG` directive in the header.
    pub load_address: Address,

    /// Runtime addresses that must always start an instruction
    pub code_addresses: Vec<Address>,

    /// Names substituted for matching absolute operands
    pub variables: Vec<Variable>,
}

impl DisassemblyOptions {
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_load_address(mut self, load_address: Address) -> Self {
        self.load_address = load_address;
        self
    }

    pub fn with_code_addresses(mut self, code_addresses: Vec<Address>) -> Self {
        self.code_addresses = code_addresses;
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Resolve the window against a program of `program_len` bytes.
    pub fn window(&self, program_len: usize) -> Result<Window, DisassemblyError> {
        if self.offset > program_len {
            return Err(DisassemblyError::InvalidWindow(format!(
                "offset {} is past the end of a {} byte program",
                self.offset, program_len
            )));
        }

        let length = self.length.unwrap_or(program_len - self.offset);
        let end = self.offset.checked_add(length).filter(|&end| end <= program_len);
        match end {
            Some(_) => Ok(Window {
                offset: self.offset,
                length,
                branch_adjust: self.load_address,
            }),
            None => Err(DisassemblyError::InvalidWindow(format!(
                "{} bytes from offset {} overruns a {} byte program",
                length, self.offset, program_len
            ))),
        }
    }

    /// Known code addresses converted to buffer positions, sorted and
    /// de-duplicated. Addresses at or before the window start are dropped.
    pub fn code_positions(&self, window: &Window) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .code_addresses
            .iter()
            .filter_map(|&address| match address.checked_sub(window.branch_adjust) {
                Some(position) if position as usize > window.offset => Some(position as usize),
                Some(position) if position as usize == window.offset => None,
                _ => {
                    log::warn!(
                        "Ignoring code address &{:04X}: before the start of the window at &{:04X}",
                        address,
                        window.address_of(window.offset)
                    );
                    None
                }
            })
            .collect();

        positions.sort_unstable();
        positions.dedup();
        positions
    }
}

/// The resolved byte range to disassemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub length: usize,
    pub branch_adjust: Address,
}

impl Window {
    /// One past the last position the sweep starts an instruction from.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Runtime address of a buffer position.
    pub fn address_of(&self, position: usize) -> Address {
        (position as Address).wrapping_add(self.branch_adjust)
    }
}

/// A user-defined symbol substituted for matching absolute operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: Address,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Address) -> Result<Self, DisassemblyError> {
        let name = name.into();
        if !is_symbol_name(&name) {
            return Err(DisassemblyError::InvalidArgument(format!(
                "invalid variable name {:?}",
                name
            )));
        }
        Ok(Self { name, value })
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = &{:X}", self.name, self.value)
    }
}

impl FromStr for Variable {
    type Err = DisassemblyError;

    /// Parse a `NAME=VALUE` definition.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.split_once('=').ok_or_else(|| {
            DisassemblyError::InvalidArgument(format!("invalid variable definition {:?}", s))
        })?;
        Variable::new(name.trim(), parse_number(value)?)
    }
}

fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Parse an address or length. Accepts decimal and `0x`, `&`, `$`, `0o`,
/// `0b` prefixed forms.
pub fn parse_number(text: &str) -> Result<Address, DisassemblyError> {
    let s = text.trim();
    let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix('&').or_else(|| s.strip_prefix('$')) {
        (rest, 16)
    } else if let Some(rest) = s.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = s.strip_prefix("0b") {
        (rest, 2)
    } else {
        (s, 10)
    };

    if digits.starts_with(['+', '-']) {
        return Err(DisassemblyError::InvalidArgument(format!(
            "non numeric value {:?}",
            text
        )));
    }
    Address::from_str_radix(digits, radix)
        .map_err(|e| DisassemblyError::InvalidArgument(format!("non numeric value {:?}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1900", 1900)]
    #[case("0x1900", 0x1900)]
    #[case("0X1a00", 0x1A00)]
    #[case("&FFEE", 0xFFEE)]
    #[case("$70", 0x70)]
    #[case("0o17", 0o17)]
    #[case("0b101", 0b101)]
    #[case(" 42 ", 42)]
    fn test_parse_number(#[case] text: &str, #[case] expected: Address) {
        assert_eq!(parse_number(text).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("0x")]
    #[case("-1")]
    #[case("&+12")]
    #[case("12AB")]
    #[case("ten")]
    fn test_parse_number_rejects(#[case] text: &str) {
        assert!(matches!(
            parse_number(text),
            Err(DisassemblyError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_variable_from_str() {
        let var: Variable = "screen=&3000".parse().unwrap();
        assert_eq!(var, Variable { name: "screen".into(), value: 0x3000 });
        assert_eq!(var.to_string(), "screen = &3000");

        let var: Variable = " lives = 7".parse().unwrap();
        assert_eq!(var.name, "lives");
        assert_eq!(var.value, 7);

        assert!("noequals".parse::<Variable>().is_err());
        assert!("1abc=3".parse::<Variable>().is_err());
        assert!("name=zz".parse::<Variable>().is_err());
        assert!("=3".parse::<Variable>().is_err());
    }

    #[test]
    fn test_window_defaults_to_rest_of_program() {
        let window = DisassemblyOptions::default().with_offset(4).window(10).unwrap();
        assert_eq!(window.offset, 4);
        assert_eq!(window.length, 6);
        assert_eq!(window.end(), 10);
    }

    #[test]
    fn test_window_rejects_overrun() {
        let options = DisassemblyOptions::default().with_offset(11);
        assert!(matches!(options.window(10), Err(DisassemblyError::InvalidWindow(_))));

        let options = DisassemblyOptions::default().with_offset(4).with_length(7);
        assert!(matches!(options.window(10), Err(DisassemblyError::InvalidWindow(_))));

        let options = DisassemblyOptions::default().with_offset(10);
        assert_eq!(options.window(10).unwrap().length, 0);
    }

    #[test]
    fn test_address_of_applies_load_address() {
        let window = DisassemblyOptions::default()
            .with_load_address(0x1900)
            .window(0x100)
            .unwrap();
        assert_eq!(window.address_of(0), 0x1900);
        assert_eq!(window.address_of(0x42), 0x1942);
    }

    #[test]
    fn test_code_positions_sorted_and_filtered() {
        let options = DisassemblyOptions::default()
            .with_offset(2)
            .with_load_address(0x1900)
            .with_code_addresses(vec![0x1910, 0x1905, 0x1910, 0x1800, 0x1901, 0x1902]);
        let window = options.window(0x20).unwrap();
        assert_eq!(options.code_positions(&window), vec![5, 0x10]);
    }
}
