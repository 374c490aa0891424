use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{AppleEnvironment, IAPConfig},
    error::{IapError, Result},
    models::receipt::{status, Receipt, VerifyReceiptRequest, VerifyReceiptResponse},
};

/// Remote receipt validation endpoint
#[async_trait]
pub trait ReceiptValidator: Send + Sync {
    async fn validate(&self, receipt: &Receipt) -> Result<VerifyReceiptResponse>;
}

/// Client for Apple's `verifyReceipt` endpoint
pub struct AppleReceiptValidator {
    config: IAPConfig,
    http_client: reqwest::Client,
}

impl AppleReceiptValidator {
    pub fn new(config: &IAPConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| IapError::Internal(e.into()))?;

        Ok(Self {
            config: config.clone(),
            http_client,
        })
    }

    /// POST the receipt, retrying transient failures with linear backoff
    async fn post_with_retry(&self, url: &str, receipt: &Receipt) -> Result<VerifyReceiptResponse> {
        let request_body = VerifyReceiptRequest {
            receipt_data: receipt.as_str(),
            password: &self.config.apple_shared_secret,
            exclude_old_transactions: self.config.exclude_old_transactions,
        };

        let mut last_err = None;

        for retry in 0..=u32::from(self.config.retry_attempts) {
            if retry > 0 {
                let backoff = self.config.retry_backoff_ms.saturating_mul(u64::from(retry));
                tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
            }
            let attempts = retry + 1;

            let response = match self.http_client.post(url).json(&request_body).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "verifyReceipt request failed");
                    last_err = Some(format!("Failed to reach validation endpoint: {}", e));
                    continue;
                }
            };

            let http_status = response.status();
            if http_status.is_server_error() || http_status == StatusCode::TOO_MANY_REQUESTS {
                warn!(attempt = attempts, status = http_status.as_u16(), "verifyReceipt unavailable");
                last_err = Some(format!("Validation endpoint returned {}", http_status.as_u16()));
                continue;
            }
            if !http_status.is_success() {
                return Err(IapError::Validation(format!(
                    "Validation endpoint returned {}",
                    http_status.as_u16()
                )));
            }

            let parsed: VerifyReceiptResponse = response
                .json()
                .await
                .map_err(|e| IapError::Validation(format!("Invalid response format: {}", e)))?;

            if status::is_retryable(parsed.status) {
                warn!(attempt = attempts, status = parsed.status, "verifyReceipt reported a transient status");
                last_err = Some(format!("Transient receipt status: {}", parsed.status));
                continue;
            }

            return Ok(parsed);
        }

        Err(IapError::Validation(
            last_err.unwrap_or_else(|| "Receipt validation failed".to_string()),
        ))
    }
}

#[async_trait]
impl ReceiptValidator for AppleReceiptValidator {
    #[instrument(skip(self, receipt), fields(receipt = %receipt.fingerprint()))]
    async fn validate(&self, receipt: &Receipt) -> Result<VerifyReceiptResponse> {
        let response = self
            .post_with_retry(self.config.primary_url(), receipt)
            .await?;

        // Apple answers with a redirect status when the receipt belongs to
        // the other environment
        let redirect = match (self.config.apple_environment, response.status) {
            (AppleEnvironment::Production, status::SANDBOX_RECEIPT) => {
                Some(self.config.sandbox_url())
            }
            (AppleEnvironment::Sandbox, status::PRODUCTION_RECEIPT) => {
                Some(self.config.production_url())
            }
            _ => None,
        };

        let response = match redirect {
            Some(url) => {
                debug!(status = response.status, url, "Retrying receipt in the other environment");
                self.post_with_retry(url, receipt).await?
            }
            None => response,
        };

        info!(
            status = response.status,
            environment = ?response.environment,
            "Receipt validation response received"
        );
        Ok(response)
    }
}
