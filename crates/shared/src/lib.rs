//! Shared types and configuration for Ledgerloop.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with fixed two-digit precision
//! - Typed IDs for type-safe entity references
//! - Configuration management
//! - Field-level encryption for bank account numbers

pub mod config;
pub mod crypto;
pub mod types;

pub use config::AppConfig;
pub use crypto::{AesGcmCipher, CipherError};
