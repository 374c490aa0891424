use serde::{Deserialize, Serialize};
use validator::Validate;

use super::receipt::Receipt;

/// Completed transaction delivered by the store connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub transaction_id: String,
    pub product_id: String,
    pub transaction_receipt: Option<Receipt>,
}

impl Purchase {
    /// Receipt to validate, if the store attached a non-empty one
    pub fn receipt(&self) -> Option<&Receipt> {
        self.transaction_receipt
            .as_ref()
            .filter(|receipt| !receipt.is_empty())
    }
}

/// Asynchronous purchase error reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseFailure {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

impl PurchaseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Purchase request emitted by the display surface
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[validate(length(min = 1, max = 255))]
    pub product_id: String,
}
