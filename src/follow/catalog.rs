//! Contract metadata cache and symbol-prefix helpers.

use crate::follow::types::ContractData;
use std::collections::HashMap;

/// Alphabetic product prefix of a symbol: everything before the first
/// digit. `"rb2410"` yields `"rb"`, `"IF2403"` yields `"IF"`.
#[must_use]
pub fn product_prefix(symbol: &str) -> &str {
    let end = symbol
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(symbol.len());
    &symbol[..end]
}

/// Cache of contract metadata, populated one contract at a time from
/// gateway lookups.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    contracts: HashMap<String, ContractData>,
}

impl SymbolCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for `vt_symbol`, if cached.
    #[must_use]
    pub fn get(&self, vt_symbol: &str) -> Option<&ContractData> {
        self.contracts.get(vt_symbol)
    }

    /// Whether metadata for `vt_symbol` is cached.
    #[must_use]
    pub fn contains(&self, vt_symbol: &str) -> bool {
        self.contracts.contains_key(vt_symbol)
    }

    /// Cache one contract.
    pub fn insert(&mut self, contract: ContractData) {
        self.contracts.insert(contract.vt_symbol(), contract);
    }
}
