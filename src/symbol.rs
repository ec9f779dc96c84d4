//! Label bookkeeping shared by both assembler passes.

use std::fmt;

/// The only symbol kind this language has. Kept as an enum (rather than
/// collapsing straight to a label-only table) so a future symbol kind
/// (constants, for instance) slots in without reshaping the table's API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPayload {
    pub program_counter: u64,
    pub is_defined: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub payload: LabelPayload,
}

#[derive(Debug)]
pub struct DuplicateSymbol {
    pub name: String,
}

impl fmt::Display for DuplicateSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label '{}' defined more than once", self.name)
    }
}

impl std::error::Error for DuplicateSymbol {}

/// Unordered association from `(kind, name)` to a symbol. Label counts in
/// a single translation unit are small, so linear search is fine here.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { symbols: Vec::new() }
    }

    pub fn find(&self, kind: SymbolKind, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.kind == kind && s.name == name)
    }

    pub fn find_mut(&mut self, kind: SymbolKind, name: &str) -> Option<&mut Symbol> {
        self.symbols
            .iter_mut()
            .find(|s| s.kind == kind && s.name == name)
    }

    pub fn push(&mut self, symbol: Symbol) -> Result<(), DuplicateSymbol> {
        if self.find(symbol.kind, &symbol.name).is_some() {
            return Err(DuplicateSymbol { name: symbol.name });
        }
        self.symbols.push(symbol);
        Ok(())
    }
}
