//! Operand rendering for BeebAsm syntax.

use crate::analysis::{branch_target, LabelTable};
use crate::config::Variable;
use crate::opcodes::{self, AddressingMode, Flow, Opcode};
use crate::os::{self, VectorRef, OS_CALLS};
use crate::Address;

/// Read-only state the decoder consults.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Added to buffer positions to form runtime addresses
    pub branch_adjust: Address,
    /// Labels from the branch analysis pass
    pub labels: &'a LabelTable,
    /// User variables, earlier definitions win
    pub variables: &'a [Variable],
}

/// Render the operand of a complete instruction starting at buffer
/// `position`. Returns an empty string for implicit instructions.
///
/// `bytes` must hold the whole instruction (`op.length` bytes).
pub fn decode(op: &Opcode, bytes: &[u8], position: usize, ctx: &DecodeContext<'_>) -> String {
    if op.is_absolute_jump() {
        return jump_target(bytes, ctx);
    }
    if op.classify() == Flow::Branch {
        return relative_branch(bytes, position, ctx);
    }

    use AddressingMode::*;
    match op.mode {
        Implicit => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#&{:02X}", bytes[1]),
        Absolute => absolute_operand(opcodes::operand_word(bytes), ctx),
        ZeroPage => format!("&{:02X}", bytes[1]),
        ZeroPageX => format!("&{:02X},X", bytes[1]),
        ZeroPageY => format!("&{:02X},Y", bytes[1]),
        Indirect => format!("(&{:04X})", opcodes::operand_word(bytes)),
        AbsoluteX => format!("&{:04X},X", opcodes::operand_word(bytes)),
        AbsoluteY => format!("&{:04X},Y", opcodes::operand_word(bytes)),
        IndirectX => format!("(&{:02X},X)", bytes[1]),
        IndirectY => format!("(&{:02X}),Y", bytes[1]),
    }
}

/// JMP/JSR target: OS call name, label, or the bare address.
fn jump_target(bytes: &[u8], ctx: &DecodeContext<'_>) -> String {
    let target = Address::from(opcodes::operand_word(bytes));
    if let Some(name) = OS_CALLS.name(target) {
        return name.to_string();
    }
    ctx.labels
        .name_of(target)
        .unwrap_or_else(|| format!("&{:04X}", target))
}

/// Branch operand: a label, or an expression relative to `P%`.
///
/// BeebAsm reads a bare literal as the absolute target, so an unlabelled
/// branch is written as `P%+n`, which assembles to the same displacement.
fn relative_branch(bytes: &[u8], position: usize, ctx: &DecodeContext<'_>) -> String {
    let label = branch_target(position, bytes, ctx.branch_adjust).and_then(|t| ctx.labels.name_of(t));
    match label {
        Some(name) => name,
        None => format!("P%{:+}", opcodes::branch_displacement(bytes)),
    }
}

/// Absolute data operand: variable, vector, vector high byte, or hex.
fn absolute_operand(value: u16, ctx: &DecodeContext<'_>) -> String {
    let value = Address::from(value);
    if let Some(var) = ctx.variables.iter().find(|v| v.value == value) {
        return var.name.clone();
    }
    match os::vector_ref(value) {
        Some(VectorRef::Low(symbol)) => symbol.name.to_string(),
        Some(VectorRef::High(symbol)) => format!("{}+1", symbol.name),
        None => format!("&{:04X}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcodes::lookup;
    use rstest::rstest;

    fn render(bytes: &[u8]) -> String {
        let labels = LabelTable::default();
        let ctx = DecodeContext {
            branch_adjust: 0,
            labels: &labels,
            variables: &[],
        };
        decode(lookup(bytes[0]).unwrap(), bytes, 0, &ctx)
    }

    #[rstest]
    #[case(&[0xA9, 0xC8], "#&C8")]
    #[case(&[0xA5, 0x70], "&70")]
    #[case(&[0xB5, 0x70], "&70,X")]
    #[case(&[0xB6, 0x70], "&70,Y")]
    #[case(&[0x8D, 0x00, 0x30], "&3000")]
    #[case(&[0xBD, 0x34, 0x12], "&1234,X")]
    #[case(&[0xB9, 0x34, 0x12], "&1234,Y")]
    #[case(&[0x6C, 0x34, 0x12], "(&1234)")]
    #[case(&[0xA1, 0x80], "(&80,X)")]
    #[case(&[0xB1, 0x80], "(&80),Y")]
    #[case(&[0x0A], "A")]
    #[case(&[0x60], "")]
    fn test_fixed_templates(#[case] bytes: &[u8], #[case] expected: &str) {
        assert_eq!(render(bytes), expected);
    }

    #[test]
    fn test_jump_to_os_call() {
        assert_eq!(render(&[0x4C, 0xF7, 0xFF]), "OSCLI");
        assert_eq!(render(&[0x20, 0xEE, 0xFF]), "OSWRCH");
        assert_eq!(render(&[0x20, 0x00, 0x30]), "&3000");
    }

    #[test]
    fn test_jump_to_label() {
        let labels = LabelTable::from_targets([0x1900, 0x1A00]);
        let ctx = DecodeContext {
            branch_adjust: 0x1900,
            labels: &labels,
            variables: &[],
        };
        let op = lookup(0x20).unwrap();
        assert_eq!(decode(op, &[0x20, 0x00, 0x1A], 4, &ctx), "label_1");
    }

    #[test]
    fn test_branch_rendering() {
        let labels = LabelTable::from_targets([0x1900]);
        let ctx = DecodeContext {
            branch_adjust: 0x1900,
            labels: &labels,
            variables: &[],
        };
        let bne = lookup(0xD0).unwrap();
        // back to &1900 from position 2
        assert_eq!(decode(bne, &[0xD0, 0xFC], 2, &ctx), "label_0");
        // unlabelled targets keep the displacement
        assert_eq!(decode(bne, &[0xD0, 0x0A], 2, &ctx), "P%+12");
        assert_eq!(decode(bne, &[0xD0, 0xA7], 2, &ctx), "P%-87");
        assert_eq!(decode(bne, &[0xD0, 0xFE], 2, &ctx), "P%+0");
    }

    #[test]
    fn test_absolute_substitution_order() {
        let labels = LabelTable::default();
        let variables = vec![
            Variable::new("wrvec", 0x20E).unwrap(),
            Variable::new("screen", 0x3000).unwrap(),
            Variable::new("shadow", 0x3000).unwrap(),
        ];
        let ctx = DecodeContext {
            branch_adjust: 0,
            labels: &labels,
            variables: &variables,
        };
        let sta = lookup(0x8D).unwrap();
        assert_eq!(decode(sta, &[0x8D, 0x00, 0x30], 0, &ctx), "screen");
        assert_eq!(decode(sta, &[0x8D, 0x0E, 0x02], 0, &ctx), "wrvec");
        assert_eq!(decode(sta, &[0x8D, 0x0F, 0x02], 0, &ctx), "WRCHV+1");
        assert_eq!(decode(sta, &[0x8D, 0x00, 0x02], 0, &ctx), "USERV");
        assert_eq!(decode(sta, &[0x8D, 0x01, 0x40], 0, &ctx), "&4001");

        // indexed absolute operands are never substituted
        let sta_x = lookup(0x9D).unwrap();
        assert_eq!(decode(sta_x, &[0x9D, 0x00, 0x30], 0, &ctx), "&3000,X");
    }
}
