//! Workflow domain types for wallet money movement.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reviewer's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// Accept the request and move the money.
    Approved,
    /// Decline the request.
    Rejected,
}

impl Decision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The money-movement flows the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Bank transfer credited to a regular wallet.
    Deposit,
    /// Regular wallet pays the master wallet immediately.
    PayToMaster,
    /// Regular wallet asks to pay the master wallet.
    PaymentRequest,
    /// Master tenant reviews a payment request.
    PaymentReview,
    /// Regular wallet asks for a payment to be refunded.
    RefundRequest,
    /// Master tenant reviews a refund request.
    RefundReview,
    /// Administrative refund without a request.
    DirectRefund,
    /// Regular wallet asks to withdraw to a bank account.
    WithdrawalRequest,
    /// Master tenant reviews a withdrawal.
    WithdrawalReview,
}

impl WorkflowKind {
    /// Returns the string representation of the flow.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::PayToMaster => "pay_to_master",
            Self::PaymentRequest => "payment_request",
            Self::PaymentReview => "payment_review",
            Self::RefundRequest => "refund_request",
            Self::RefundReview => "refund_review",
            Self::DirectRefund => "direct_refund",
            Self::WithdrawalRequest => "withdrawal_request",
            Self::WithdrawalReview => "withdrawal_review",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a flow stands once a call returns successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Money has moved and the flow is finished.
    Completed,
    /// A request was recorded and waits for review.
    AwaitingApproval,
    /// The reviewer declined the request.
    Rejected,
}

impl From<Decision> for WorkflowStage {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Self::Completed,
            Decision::Rejected => Self::Rejected,
        }
    }
}
