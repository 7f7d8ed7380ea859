//! Bank account details attached to deposits and withdrawals.

use serde::{Deserialize, Serialize};

use crate::workflow::WorkflowError;

/// Destination or source bank account for an external transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Bank name.
    pub bank_name: String,
    /// Branch routing code.
    pub ifsc: String,
    /// Account holder's name.
    pub account_holder_name: String,
    /// Plain account number; encrypted before it is stored.
    pub account_no: String,
    /// External bank transfer reference, when the transfer already happened.
    pub utr_no: Option<String>,
}

impl BankDetails {
    /// Validates and normalizes the details.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` if a field is blank or the IFSC is malformed.
    pub fn normalized(&self) -> Result<Self, WorkflowError> {
        let bank_name = required("bank_name", &self.bank_name)?;
        let account_holder_name = required("account_holder_name", &self.account_holder_name)?;
        let account_no = required("account_no", &self.account_no)?;
        let ifsc = required("ifsc", &self.ifsc)?.to_uppercase();

        if ifsc.len() != 11 || !ifsc.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WorkflowError::Validation(format!("Invalid IFSC code: {ifsc}")));
        }

        let utr_no = match &self.utr_no {
            Some(raw) if !raw.trim().is_empty() => Some(normalize_bank_utr(raw)?),
            _ => None,
        };

        Ok(Self {
            bank_name,
            ifsc,
            account_holder_name,
            account_no,
            utr_no,
        })
    }
}

/// Normalizes an external bank reference.
///
/// # Errors
///
/// Returns `WorkflowError::Validation` if the reference is blank.
pub fn normalize_bank_utr(raw: &str) -> Result<String, WorkflowError> {
    let utr = raw.trim().to_uppercase();
    if utr.is_empty() {
        return Err(WorkflowError::Validation("utr_no is required".to_string()));
    }
    Ok(utr)
}

/// Masks all but the last four characters of an account number.
#[must_use]
pub fn mask_account_no(account_no: &str) -> String {
    let chars: Vec<char> = account_no.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "X".repeat(hidden))
}

fn required(field: &str, value: &str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
