use crate::{
    config::Config,
    services::{AppleReceiptValidator, NotificationLog, StoreConnection, SubscriptionSession},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SubscriptionSession>,
    pub notifications: Arc<NotificationLog>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Start a session against the given store, validating with Apple
    pub async fn new(config: Config, store: Arc<dyn StoreConnection>) -> crate::Result<Self> {
        let validator = Arc::new(AppleReceiptValidator::new(&config.iap)?);
        let notifications = Arc::new(NotificationLog::default());

        let session =
            SubscriptionSession::start(store, validator, notifications.clone(), &config.catalog)
                .await;

        Ok(Self {
            session: Arc::new(session),
            notifications,
            config: Arc::new(config),
        })
    }
}
