//! Text and CSV input to validated datasets
//!
//! Tokens are separated by commas and whitespace. A token is accepted when it
//! is a positive integer, or a decimal with a zero fractional part (`3.0`).
//! Under [`ParsePolicy::Strict`] the first bad token rejects the input; under
//! [`ParsePolicy::Lenient`] bad tokens are skipped with a warning.

use crate::config::ParsePolicy;
use crate::dataset::Dataset;
use crate::error::{EngineError, InputError, Result};
use log::{debug, warn};
use std::io::BufRead;

/// Parse comma/whitespace separated values.
pub fn parse_values(text: &str, policy: ParsePolicy) -> Result<Dataset> {
    let mut values = Vec::new();
    for token in tokens(text) {
        accept(token, policy, &mut values)?;
    }
    Dataset::new(values)
}

/// Parse every cell of every row of a CSV document.
///
/// A first row made up only of non-numeric cells is taken as a header and
/// skipped.
pub fn parse_csv<R: BufRead>(reader: R, policy: ParsePolicy) -> Result<Dataset> {
    let mut values = Vec::new();
    let mut first_row = true;
    for line in reader.lines() {
        let line = line?;
        let cells: Vec<&str> = tokens(&line).collect();
        if cells.is_empty() {
            continue;
        }
        if std::mem::take(&mut first_row) && cells.iter().all(|cell| !looks_numeric(cell)) {
            debug!("skipping csv header: {}", line.trim());
            continue;
        }
        for cell in cells {
            accept(cell, policy, &mut values)?;
        }
    }
    Dataset::new(values)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim_matches('"'))
        .filter(|t| !t.is_empty())
}

fn accept(token: &str, policy: ParsePolicy, values: &mut Vec<u64>) -> Result<()> {
    match (parse_token(token), policy) {
        (Ok(value), _) => values.push(value),
        (Err(e), ParsePolicy::Strict) => return Err(e),
        (Err(e), ParsePolicy::Lenient) => warn!("skipping {:?}: {}", token, e),
    }
    Ok(())
}

fn looks_numeric(cell: &str) -> bool {
    cell.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}

/// Parse one token as a positive integer.
///
/// The text is read digit by digit: an optional sign, decimal digits and an
/// optional fraction made only of zeros. Exponents, `inf` and `nan` are not
/// integers.
pub fn parse_token(token: &str) -> Result<u64> {
    let token = token.trim();
    let not_integer = || EngineError::from(InputError::NotAnInteger(token.to_string()));
    let non_positive = || EngineError::from(InputError::NonPositive(token.to_string()));

    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let (whole, fraction) = match body.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (body, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_integer());
    }
    if !fraction.bytes().all(|b| b == b'0') {
        return Err(not_integer());
    }

    let digits = whole.trim_start_matches('0');
    if digits.is_empty() || negative {
        return Err(non_positive());
    }
    digits.parse::<u64>().map_err(|_| EngineError::EncodingOverflow {
        value: token.to_string(),
        limit: u64::MAX.to_string(),
    })
}
