//! Address file loading with column detection.

use anyhow::{Context, Result};
use std::path::Path;

/// Header fragments that mark the address column.
const ADDRESS_HEADERS: &[&str] = &["address", "indirizzo"];

/// Load the ordered address list from a file. `.txt` files are read one
/// address per line; anything else is parsed as CSV, taking the first
/// column whose header looks like an address column (first column as
/// fallback).
pub fn read_addresses(path: &Path) -> Result<Vec<String>> {
    let is_plain = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_plain {
        read_plain(path)
    } else {
        read_csv(path)
    }
}

fn read_plain(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let column = detect_address_column(&headers);

    let mut addresses = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(value) = row.get(column) {
            let value = value.trim();
            if !value.is_empty() {
                addresses.push(value.to_string());
            }
        }
    }

    Ok(addresses)
}

fn detect_address_column(headers: &csv::StringRecord) -> usize {
    headers
        .iter()
        .position(|header| {
            let header = header.to_lowercase();
            ADDRESS_HEADERS.iter().any(|key| header.contains(key))
        })
        .unwrap_or(0)
}
