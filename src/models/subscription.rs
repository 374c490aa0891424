use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use crate::error::{IapError, Result};

/// Derived subscription state shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
    pub expiration_date: Option<String>,
}

impl SubscriptionStatus {
    pub fn active_until(expires_at_ms: i64) -> Result<Self> {
        Ok(Self {
            is_subscribed: true,
            expiration_date: Some(iso_timestamp_ms(expires_at_ms)?),
        })
    }
}

/// Format epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn iso_timestamp_ms(epoch_ms: i64) -> Result<String> {
    let timestamp = OffsetDateTime::from_unix_timestamp_nanos(epoch_ms as i128 * 1_000_000)
        .map_err(|e| IapError::Validation(format!("Expiration out of range: {}", e)))?;
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    timestamp
        .format(format)
        .map_err(|e| IapError::Internal(e.into()))
}

/// Subscription status response for the display surface
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub success: bool,
    pub data: Option<SubscriptionStatus>,
}
