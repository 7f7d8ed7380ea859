//! Account number generation.
//!
//! An account number is the tenant's prefix followed by a 16-digit
//! zero-padded sequence, e.g. `SHOP0000000000000042`. The sequence comes from
//! a per-tenant counter that the store increments in the same transaction
//! that inserts the wallet.

use crate::account::error::AccountError;

/// Width of the numeric suffix.
pub const SEQUENCE_WIDTH: usize = 16;

/// Largest sequence that fits the suffix.
pub const MAX_SEQUENCE: i64 = 9_999_999_999_999_999;

const MAX_PREFIX_LEN: usize = 8;

/// Normalizes a tenant prefix: whitespace removed, uppercased, ASCII letters and digits only.
pub fn normalize_prefix(raw: &str) -> Result<String, AccountError> {
    let prefix: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if prefix.is_empty()
        || prefix.len() > MAX_PREFIX_LEN
        || !prefix.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AccountError::InvalidPrefix(raw.to_string()));
    }
    Ok(prefix)
}

/// Returns the sequence following `last`.
pub fn next_sequence(prefix: &str, last: i64) -> Result<i64, AccountError> {
    match last.checked_add(1) {
        Some(next) if next > 0 && next <= MAX_SEQUENCE => Ok(next),
        _ => Err(AccountError::SequenceExhausted(prefix.to_string())),
    }
}

/// Formats an account number.
#[must_use]
pub fn format_account_no(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:0width$}", width = SEQUENCE_WIDTH)
}

/// Extracts the sequence from an account number issued under `prefix`.
#[must_use]
pub fn parse_sequence(prefix: &str, account_no: &str) -> Option<i64> {
    let digits = account_no.strip_prefix(prefix)?;
    if digits.len() != SEQUENCE_WIDTH || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
