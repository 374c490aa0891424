use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    error::Result,
    models::{
        receipt::{Receipt, ValidationOutcome},
        subscription::SubscriptionStatus,
    },
    services::{
        receipt_service::ReceiptValidator,
        status_store::{Generation, StatusStore},
    },
};

/// Validates receipts and records the derived subscription status.
///
/// Only an accepted receipt with an expiration ever touches the status
/// store. Rejections, missing renewal info and transport errors leave the
/// previous status in place.
pub struct ValidationService {
    validator: Arc<dyn ReceiptValidator>,
    status: Arc<StatusStore>,
}

impl ValidationService {
    pub fn new(validator: Arc<dyn ReceiptValidator>, status: Arc<StatusStore>) -> Self {
        Self { validator, status }
    }

    #[instrument(skip(self, receipt), fields(receipt = %receipt.fingerprint()))]
    pub async fn validate_and_record(
        &self,
        receipt: &Receipt,
        generation: Generation,
    ) -> Result<ValidationOutcome> {
        let response = self.validator.validate(receipt).await?;
        let outcome = response.outcome();

        match outcome {
            ValidationOutcome::Active { expires_at_ms } => {
                let status = SubscriptionStatus::active_until(expires_at_ms)?;
                if self.status.write(generation, status.clone()) {
                    info!(
                        expiration_date = ?status.expiration_date,
                        "Subscription status updated"
                    );
                }
            }
            ValidationOutcome::NoSubscriptionInfo => {
                info!("Receipt is valid but carries no subscription info; status unchanged");
            }
            ValidationOutcome::Rejected { status } => {
                warn!(status, "Receipt rejected by validation endpoint; status unchanged");
            }
        }

        Ok(outcome)
    }
}
