use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Apple `verifyReceipt` status codes the workflow reacts to
pub mod status {
    pub const VALID: i32 = 0;
    pub const SERVER_UNAVAILABLE: i32 = 21005;
    /// Sandbox receipt sent to the production endpoint
    pub const SANDBOX_RECEIPT: i32 = 21007;
    /// Production receipt sent to the sandbox endpoint
    pub const PRODUCTION_RECEIPT: i32 = 21008;

    /// Statuses Apple documents as transient
    pub fn is_retryable(status: i32) -> bool {
        status == SERVER_UNAVAILABLE || (21100..=21199).contains(&status)
    }
}

/// Opaque proof-of-purchase token, base64 as Apple expects it
#[derive(Clone, PartialEq, Eq)]
pub struct Receipt(String);

impl Receipt {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Wrap raw receipt bytes as read from the app bundle
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short SHA-256 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }
}

impl std::fmt::Debug for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Receipt({})", self.fingerprint())
    }
}

/// Body posted to the `verifyReceipt` endpoint
#[derive(Serialize)]
pub struct VerifyReceiptRequest<'a> {
    #[serde(rename = "receipt-data")]
    pub receipt_data: &'a str,
    pub password: &'a str,
    #[serde(rename = "exclude-old-transactions")]
    pub exclude_old_transactions: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyReceiptResponse {
    pub status: i32,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub latest_receipt_info: Option<LatestReceiptInfo>,
}

/// Apple sends an array; a bare object is accepted as well
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LatestReceiptInfo {
    Many(Vec<ReceiptTransaction>),
    One(ReceiptTransaction),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptTransaction {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub original_transaction_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub expires_date_ms: Option<i64>,
}

/// Interpretation of a validation response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Active { expires_at_ms: i64 },
    NoSubscriptionInfo,
    Rejected { status: i32 },
}

impl LatestReceiptInfo {
    /// Latest expiration across all renewals in the response
    pub fn latest_expiration_ms(&self) -> Option<i64> {
        match self {
            LatestReceiptInfo::One(transaction) => transaction.expires_date_ms,
            LatestReceiptInfo::Many(transactions) => transactions
                .iter()
                .filter_map(|t| t.expires_date_ms)
                .max(),
        }
    }
}

impl VerifyReceiptResponse {
    pub fn outcome(&self) -> ValidationOutcome {
        if self.status != status::VALID {
            return ValidationOutcome::Rejected {
                status: self.status,
            };
        }

        match self
            .latest_receipt_info
            .as_ref()
            .and_then(LatestReceiptInfo::latest_expiration_ms)
        {
            Some(expires_at_ms) => ValidationOutcome::Active { expires_at_ms },
            None => ValidationOutcome::NoSubscriptionInfo,
        }
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(i64),
        Text(String),
    }

    match Option::<Millis>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Millis::Number(ms)) => Ok(Some(ms)),
        Some(Millis::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid millisecond timestamp {:?}: {}", text, e))),
    }
}
