//! Core wallet ledger logic for Ledgerloop.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and state machines live here.
//!
//! # Modules
//!
//! - `ledger` - Entry types, transfer planning, identifiers and balance rules
//! - `account` - Wallet roles, preconditions and account numbering
//! - `workflow` - Entry state machine and workflow preconditions
//! - `bank` - Bank account details for deposits and withdrawals
//! - `access` - Collaborator interfaces (tenants, users, access checks, encryption)

pub mod access;
pub mod account;
pub mod bank;
pub mod ledger;
pub mod workflow;
