//! Correlation codes and per-entry identifiers.
//!
//! Every ledger entry carries a globally unique `uuid` and `txn_id`. Paired
//! entries additionally share a UTR. Generation is behind [`IdSource`] so the
//! store's collision loop can be driven deterministically.

use uuid::Uuid;

/// Attempts made by the store before giving up on a unique identifier pair.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

const TXN_ID_BYTES: usize = 20;
const UTR_BYTES: usize = 20;

/// Identifiers assigned to one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryIdentifiers {
    /// Globally unique entry UUID.
    pub uuid: Uuid,
    /// Globally unique transaction id.
    pub txn_id: String,
}

/// Source of fresh identifiers.
pub trait IdSource: Send + Sync {
    /// Produces a candidate `(uuid, txn_id)` pair.
    fn entry_identifiers(&self) -> EntryIdentifiers;

    /// Produces a new correlation code.
    fn utr(&self) -> String;
}

/// Identifier source backed by the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn entry_identifiers(&self) -> EntryIdentifiers {
        let bytes: [u8; TXN_ID_BYTES] = rand::random();
        EntryIdentifiers {
            uuid: Uuid::new_v4(),
            txn_id: hex::encode(bytes),
        }
    }

    fn utr(&self) -> String {
        let bytes: [u8; UTR_BYTES] = rand::random();
        hex::encode_upper(bytes)
    }
}

/// Returns true if `utr` looks like a correlation code this system could have issued.
#[must_use]
pub fn is_well_formed_utr(utr: &str) -> bool {
    !utr.is_empty() && utr.len() <= 64 && utr.chars().all(|c| c.is_ascii_alphanumeric())
}
