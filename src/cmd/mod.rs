pub mod holdings;
pub mod report;
pub mod schema;
pub mod validate;
pub mod years;

use cgt_ie::core::{read_lots_csv, read_lots_json, Lot};
use cgt_ie::tax::CgtRules;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read lots from a JSON or CSV file (by extension), or JSON from stdin with "-"
pub fn read_lots(path: &Path) -> anyhow::Result<Vec<Lot>> {
    let lots = if path.as_os_str() == "-" {
        read_from_stdin()?
    } else {
        read_from_file(path)?
    };
    log::debug!("Read {} lots from {}", lots.len(), path.display());
    Ok(lots)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn read_from_file(path: &Path) -> anyhow::Result<Vec<Lot>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    if is_csv(path) {
        Ok(read_lots_csv(reader)?)
    } else {
        Ok(read_lots_json(reader)?)
    }
}

fn read_from_stdin() -> anyhow::Result<Vec<Lot>> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    Ok(read_lots_json(io::Cursor::new(buffer))?)
}

/// Default rules with any command-line overrides applied
pub fn rules_for(exemption: Option<Decimal>, rate: Option<Decimal>) -> anyhow::Result<CgtRules> {
    let mut rules = CgtRules::default();
    if let Some(exemption) = exemption {
        if exemption < Decimal::ZERO {
            anyhow::bail!("exemption must not be negative: {}", exemption);
        }
        rules = rules.with_exemption(exemption);
    }
    if let Some(rate) = rate {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            anyhow::bail!("rate must be between 0 and 1: {}", rate);
        }
        rules = rules.with_rate(rate);
    }
    Ok(rules)
}

pub fn parse_non_negative(s: &str) -> Result<Decimal, String> {
    let value: Decimal = s.parse().map_err(|e| format!("invalid amount '{}': {}", s, e))?;
    if value < Decimal::ZERO {
        return Err(format!("amount must not be negative: {}", s));
    }
    Ok(value)
}
