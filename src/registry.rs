use std::collections::HashMap;

use crate::logging::{log, obj, v_str, Level};

/// A tradable contract admitted by the quote-asset filter.
///
/// Immutable once created; the registry only accumulates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub symbol: String,
    pub base: String,
    pub quote: String,
}

pub struct InstrumentRegistry {
    instruments: HashMap<String, Instrument>,
    quote: String,
    suffix: String,
}

impl InstrumentRegistry {
    pub fn new(quote_asset: &str) -> Self {
        Self {
            instruments: HashMap::new(),
            quote: quote_asset.to_string(),
            suffix: format!("_{}", quote_asset),
        }
    }

    /// Admit a raw exchange symbol. Returns the instrument when the symbol is
    /// quoted in the configured asset, `None` otherwise. Re-registering an
    /// existing symbol is a lookup, not a second insert.
    pub fn register(&mut self, symbol: &str) -> Option<&Instrument> {
        let base = symbol.strip_suffix(&self.suffix)?;
        if base.is_empty() {
            return None;
        }
        if !self.instruments.contains_key(symbol) {
            log(
                Level::Debug,
                "instrument_added",
                obj(&[("symbol", v_str(symbol)), ("base", v_str(base))]),
            );
            self.instruments.insert(
                symbol.to_string(),
                Instrument {
                    symbol: symbol.to_string(),
                    base: base.to_string(),
                    quote: self.quote.clone(),
                },
            );
        }
        self.instruments.get(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}
