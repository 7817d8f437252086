//! BBC Micro OS entry points and vectors.

use crate::{Address, Symbol};

/// A static, address-sorted name table.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    entries: &'static [(Address, &'static str)],
}

impl Registry {
    const fn new(entries: &'static [(Address, &'static str)]) -> Self {
        Self { entries }
    }

    /// Name registered at exactly `address`.
    pub fn name(&self, address: Address) -> Option<&'static str> {
        self.entries
            .binary_search_by_key(&address, |&(a, _)| a)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.name(address).is_some()
    }

    /// Symbol for `address`, if registered.
    pub fn symbol(&self, address: Address) -> Option<Symbol> {
        self.name(address).map(|name| Symbol { name, address })
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.entries
            .iter()
            .map(|&(address, name)| Symbol { name, address })
    }
}

/// MOS entry points in the &FFxx jump block.
pub static OS_CALLS: Registry = Registry::new(&[
    (0xFFB9, "OSRDRM"),
    (0xFFBF, "OSEVEN"),
    (0xFFC2, "GSINIT"),
    (0xFFC5, "GSREAD"),
    (0xFFC8, "NVRDCH"), // non-vectored OSRDCH
    (0xFFCB, "NVWRCH"), // non-vectored OSWRCH
    (0xFFCE, "OSFIND"),
    (0xFFE0, "OSRDCH"),
    (0xFFE3, "OSASCI"),
    (0xFFE7, "OSNEWL"),
    (0xFFEE, "OSWRCH"),
    (0xFFF1, "OSWORD"),
    (0xFFF4, "OSBYTE"),
    (0xFFF7, "OSCLI"),
]);

/// Two-byte indirection vectors in page 2.
pub static OS_VECTORS: Registry = Registry::new(&[
    (0x200, "USERV"),
    (0x202, "BRKV"),
    (0x204, "IRQ1V"),
    (0x206, "IRQ2V"),
    (0x208, "CLIV"),
    (0x20A, "BYTEV"),
    (0x20C, "WORDV"),
    (0x20E, "WRCHV"),
    (0x210, "RDCHV"),
    (0x212, "FILEV"),
    (0x214, "ARGV"),
    (0x216, "BGETV"),
    (0x218, "BPUTV"),
    (0x21A, "GBPBV"),
    (0x21C, "FINDV"),
    (0x21E, "FSCV"),
    (0x220, "EVENTV"),
    (0x222, "UPTV"),
    (0x224, "NETV"),
    (0x226, "VDUV"),
    (0x228, "KEYV"),
    (0x22A, "INSV"),
    (0x22C, "REMV"),
    (0x22E, "CNPV"),
    (0x230, "IND1V"), // not in the Advanced User Guide
    (0x232, "IND2V"),
    (0x234, "IND3V"),
]);

/// How an absolute operand relates to a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorRef {
    /// The operand is the vector's low byte
    Low(Symbol),
    /// The operand is the vector's high byte, one past its name
    High(Symbol),
}

impl VectorRef {
    pub fn symbol(&self) -> Symbol {
        match self {
            VectorRef::Low(symbol) | VectorRef::High(symbol) => *symbol,
        }
    }
}

/// Resolve an operand against the vector table, trying the exact address
/// first and then the address with the low bit cleared.
pub fn vector_ref(address: Address) -> Option<VectorRef> {
    if let Some(symbol) = OS_VECTORS.symbol(address) {
        return Some(VectorRef::Low(symbol));
    }
    OS_VECTORS.symbol(address & !1).map(VectorRef::High)
}
