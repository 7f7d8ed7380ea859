//! Workflow service for ledger entry state transitions.
//!
//! The engine asks this service whether a step is allowed before it writes
//! anything, so every precondition failure happens before any entry exists.

use crate::ledger::{EntrySnapshot, EntryStatus, EntryType, LedgerService};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::Decision;

/// Stateless service for entry status transitions and workflow preconditions.
pub struct WorkflowService;

impl WorkflowService {
    /// Check if a status transition is valid.
    ///
    /// Only `Pending` entries move, and only to a terminal status.
    #[must_use]
    pub fn is_valid_transition(from: EntryStatus, to: EntryStatus) -> bool {
        from == EntryStatus::Pending && to.is_terminal()
    }

    /// Validates a transition.
    ///
    /// # Returns
    /// * `Ok(to)` if the transition is valid
    /// * `Err(WorkflowError::Conflict)` if the entry was already processed
    pub fn transition(from: EntryStatus, to: EntryStatus) -> Result<EntryStatus, WorkflowError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(WorkflowError::Conflict(format!(
                "Transaction already processed ({from} cannot become {to})"
            )))
        }
    }

    /// Parses a reviewer's decision.
    ///
    /// # Returns
    /// * `Err(WorkflowError::InvalidState)` unless the input is APPROVED or REJECTED
    pub fn parse_decision(raw: &str) -> Result<Decision, WorkflowError> {
        Decision::parse(raw).ok_or_else(|| {
            WorkflowError::InvalidState(format!("Status must be APPROVED or REJECTED, got {raw:?}"))
        })
    }

    /// Validates a review of a pending request entry.
    ///
    /// # Arguments
    /// * `entry` - The request entry being reviewed
    /// * `expected` - The entry type the review applies to
    /// * `decision` - The reviewer's decision
    ///
    /// # Returns
    /// * `Ok(status)` the request entry moves to
    /// * `Err(WorkflowError::InvalidState)` if the entry has the wrong type
    /// * `Err(WorkflowError::Conflict)` if the entry is no longer pending
    pub fn review(
        entry: &EntrySnapshot,
        expected: EntryType,
        decision: Decision,
    ) -> Result<EntryStatus, WorkflowError> {
        if entry.entry_type != expected {
            return Err(WorkflowError::InvalidState(format!(
                "Entry {} is {}, expected {expected}",
                entry.utr, entry.entry_type
            )));
        }
        let target = match decision {
            Decision::Approved => EntryStatus::Approved,
            Decision::Rejected => EntryStatus::Rejected,
        };
        Self::transition(entry.status, target)
    }

    /// Checks that a payment may be refunded.
    ///
    /// # Returns
    /// * `Err(WorkflowError::InvalidState)` if the entry is not a completed payment
    /// * `Err(WorkflowError::Conflict)` if it was already refunded
    pub fn ensure_refundable(original: &EntrySnapshot) -> Result<(), WorkflowError> {
        if original.entry_type != EntryType::Debit {
            return Err(WorkflowError::InvalidState(format!(
                "Only payments can be refunded, {} is {}",
                original.utr, original.entry_type
            )));
        }
        if original.settled {
            return Err(WorkflowError::Conflict(format!(
                "Transaction {} already refunded",
                original.utr
            )));
        }
        if !original.status.is_completed() {
            return Err(WorkflowError::InvalidState(format!(
                "Transaction {} is {}, not completed",
                original.utr, original.status
            )));
        }
        Ok(())
    }

    /// Checks the original DEBIT/CREDIT pair of an administrative refund.
    pub fn ensure_direct_refund(
        debit: &EntrySnapshot,
        credit: &EntrySnapshot,
    ) -> Result<(), WorkflowError> {
        LedgerService::verify_pair(debit, credit)?;
        Self::ensure_refundable(debit)?;
        if credit.settled {
            return Err(WorkflowError::Conflict(format!(
                "Transaction {} already refunded",
                credit.utr
            )));
        }
        if credit.status != EntryStatus::Success {
            return Err(WorkflowError::InvalidState(format!(
                "Credit for {} is {}, not completed",
                credit.utr, credit.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerloop_shared::types::WalletId;
    use rust_decimal_macros::dec;

    fn entry(entry_type: EntryType, status: EntryStatus) -> EntrySnapshot {
        EntrySnapshot {
            wallet_id: WalletId::new(),
            entry_type,
            status,
            amount: dec!(200.00),
            currency: "INR".to_string(),
            utr: "UTR1".to_string(),
            settled: false,
        }
    }

    #[test]
    fn test_pending_moves_to_terminal() {
        for to in [
            EntryStatus::Success,
            EntryStatus::Failure,
            EntryStatus::Approved,
            EntryStatus::Rejected,
        ] {
            assert!(WorkflowService::is_valid_transition(EntryStatus::Pending, to));
        }
        assert!(!WorkflowService::is_valid_transition(
            EntryStatus::Pending,
            EntryStatus::Pending
        ));
    }

    #[test]
    fn test_terminal_never_moves() {
        assert!(matches!(
            WorkflowService::transition(EntryStatus::Approved, EntryStatus::Rejected),
            Err(WorkflowError::Conflict(_))
        ));
        assert!(matches!(
            WorkflowService::transition(EntryStatus::Failure, EntryStatus::Pending),
            Err(WorkflowError::Conflict(_))
        ));
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(
            WorkflowService::parse_decision("approved").unwrap(),
            Decision::Approved
        );
        assert!(matches!(
            WorkflowService::parse_decision("PENDING"),
            Err(WorkflowError::InvalidState(_))
        ));
    }

    #[test]
    fn test_review_pending_request() {
        let debit = entry(EntryType::Debit, EntryStatus::Pending);
        assert_eq!(
            WorkflowService::review(&debit, EntryType::Debit, Decision::Approved).unwrap(),
            EntryStatus::Approved
        );
        assert_eq!(
            WorkflowService::review(&debit, EntryType::Debit, Decision::Rejected).unwrap(),
            EntryStatus::Rejected
        );
    }

    #[test]
    fn test_review_processed_request_conflicts() {
        let debit = entry(EntryType::Debit, EntryStatus::Approved);
        assert!(matches!(
            WorkflowService::review(&debit, EntryType::Debit, Decision::Approved),
            Err(WorkflowError::Conflict(_))
        ));
    }

    #[test]
    fn test_review_wrong_type() {
        let debit = entry(EntryType::Debit, EntryStatus::Pending);
        assert!(matches!(
            WorkflowService::review(&debit, EntryType::WithdrawDebit, Decision::Approved),
            Err(WorkflowError::InvalidState(_))
        ));
    }

    #[test]
    fn test_ensure_refundable() {
        assert!(WorkflowService::ensure_refundable(&entry(EntryType::Debit, EntryStatus::Success)).is_ok());
        assert!(WorkflowService::ensure_refundable(&entry(EntryType::Debit, EntryStatus::Approved)).is_ok());

        let mut settled = entry(EntryType::Debit, EntryStatus::Success);
        settled.settled = true;
        assert!(matches!(
            WorkflowService::ensure_refundable(&settled),
            Err(WorkflowError::Conflict(_))
        ));

        assert!(matches!(
            WorkflowService::ensure_refundable(&entry(EntryType::Debit, EntryStatus::Pending)),
            Err(WorkflowError::InvalidState(_))
        ));
        assert!(matches!(
            WorkflowService::ensure_refundable(&entry(EntryType::Credit, EntryStatus::Success)),
            Err(WorkflowError::InvalidState(_))
        ));
    }

    #[test]
    fn test_ensure_direct_refund() {
        let debit = entry(EntryType::Debit, EntryStatus::Success);
        let credit = entry(EntryType::Credit, EntryStatus::Success);
        assert!(WorkflowService::ensure_direct_refund(&debit, &credit).is_ok());

        let mut short = credit.clone();
        short.amount = dec!(199.99);
        assert!(matches!(
            WorkflowService::ensure_direct_refund(&debit, &short),
            Err(WorkflowError::InvalidState(_))
        ));

        let mut settled = credit;
        settled.settled = true;
        assert!(matches!(
            WorkflowService::ensure_direct_refund(&debit, &settled),
            Err(WorkflowError::Conflict(_))
        ));
    }
}
