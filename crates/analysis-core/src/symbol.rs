use serde::Serialize;

use crate::AnalysisError;

/// Listing venue inferred from the ticker suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub exchange: &'static str,
    pub market: &'static str,
}

impl SymbolInfo {
    pub fn from_symbol(symbol: &str) -> Result<Self, AnalysisError> {
        let symbol = normalize_symbol(symbol)?;
        let (exchange, market) = if symbol.ends_with(".TW") {
            ("TWSE", "Taiwan")
        } else if symbol.ends_with(".HK") {
            ("HKEX", "Hong Kong")
        } else if symbol.ends_with(".T") {
            ("TSE", "Tokyo")
        } else if symbol.ends_with("-USD") {
            ("Crypto", "Global")
        } else if symbol.contains('.') {
            ("International", "Global")
        } else {
            ("NYSE/NASDAQ", "US")
        };
        Ok(Self { symbol, exchange, market })
    }
}

/// Trim and uppercase a ticker, rejecting anything outside `[A-Z0-9.-]{1,10}`.
pub fn normalize_symbol(symbol: &str) -> Result<String, AnalysisError> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AnalysisError::invalid("symbol must not be empty"));
    }
    if symbol.len() > 10 {
        return Err(AnalysisError::invalid(format!("symbol {} is longer than 10 characters", symbol)));
    }
    if !symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-') {
        return Err(AnalysisError::invalid(format!("symbol {} contains illegal characters", symbol)));
    }
    Ok(symbol)
}
