//! Wallet workflow management.
//!
//! This module implements the entry status state machine and the
//! preconditions of the deposit, payment, refund and withdrawal flows.
//!
//! # Modules
//!
//! - `types` - Decisions, flow kinds and stages
//! - `error` - The workflow error taxonomy
//! - `service` - State transition and precondition logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::WorkflowService;
pub use types::{Decision, WorkflowKind, WorkflowStage};
