use std::sync::Arc;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    models::{
        common::Notification,
        purchase::{Purchase, PurchaseFailure},
    },
    services::{
        notification_service::Notifier,
        status_store::{Generation, StatusStore},
        store_connection::StoreConnection,
        validation_service::ValidationService,
    },
};

pub const PURCHASE_SUCCESS_TITLE: &str = "Purchase Successful";
pub const PURCHASE_SUCCESS_MESSAGE: &str = "Thank you for your purchase.";
pub const PURCHASE_FAILED_TITLE: &str = "Purchase Failed";

/// Reacts to purchase completions and failures for one session
pub struct PurchaseListener {
    store: Arc<dyn StoreConnection>,
    validation: Arc<ValidationService>,
    status: Arc<StatusStore>,
    notifier: Arc<dyn Notifier>,
    generation: Generation,
}

impl PurchaseListener {
    pub fn new(
        store: Arc<dyn StoreConnection>,
        validation: Arc<ValidationService>,
        status: Arc<StatusStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let generation = status.current_generation();
        Self {
            store,
            validation,
            status,
            notifier,
            generation,
        }
    }

    /// Subscribe to both store channels and start listening.
    ///
    /// Subscriptions are taken before this returns, so no event emitted
    /// afterwards is missed. Dropping the handle deregisters the listener.
    pub fn spawn(self) -> ListenerHandle {
        let updates = self.store.subscribe_purchase_updates();
        let errors = self.store.subscribe_purchase_errors();
        let listener = Arc::new(self);
        let task = tokio::spawn(listener.run(updates, errors));
        info!("Purchase listener registered");
        ListenerHandle { task: Some(task) }
    }

    async fn run(
        self: Arc<Self>,
        mut updates: broadcast::Receiver<Purchase>,
        mut errors: broadcast::Receiver<PurchaseFailure>,
    ) {
        let mut updates_open = true;
        let mut errors_open = true;

        while updates_open || errors_open {
            tokio::select! {
                received = updates.recv(), if updates_open => match received {
                    Ok(purchase) => {
                        // Each purchase is handled on its own task; validations may interleave
                        let listener = Arc::clone(&self);
                        tokio::spawn(async move { listener.handle_purchase(purchase).await });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Purchase listener lagged behind the store; events were skipped");
                    }
                    Err(RecvError::Closed) => updates_open = false,
                },
                received = errors.recv(), if errors_open => match received {
                    Ok(failure) => self.handle_failure(failure),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Purchase error listener lagged behind the store");
                    }
                    Err(RecvError::Closed) => errors_open = false,
                },
            }
        }

        debug!("Store channels closed; purchase listener exiting");
    }

    /// Finalize, validate and confirm a completed purchase.
    ///
    /// Finalize and validation fail independently; neither error stops the
    /// other step.
    #[instrument(skip(self, purchase), fields(transaction_id = %purchase.transaction_id, product_id = %purchase.product_id))]
    pub async fn handle_purchase(&self, purchase: Purchase) {
        let Some(receipt) = purchase.receipt().cloned() else {
            info!("Purchase completed without a receipt; nothing to validate");
            return;
        };

        match self.store.finalize(&purchase).await {
            Ok(()) => debug!("Transaction finalized"),
            Err(e) => error!(error = %e, "Failed to finalize transaction"),
        }

        if let Err(e) = self
            .validation
            .validate_and_record(&receipt, self.generation)
            .await
        {
            error!(error = %e, "Receipt validation failed");
        }

        if self.status.is_current(self.generation) {
            self.notifier.notify(Notification::success(
                PURCHASE_SUCCESS_TITLE,
                PURCHASE_SUCCESS_MESSAGE,
            ));
        }
    }

    pub fn handle_failure(&self, failure: PurchaseFailure) {
        warn!(code = ?failure.code, message = %failure.message, "Purchase failed");
        self.notifier
            .notify(Notification::failure(PURCHASE_FAILED_TITLE, failure.message));
    }
}

/// Owned registration of a [`PurchaseListener`]
pub struct ListenerHandle {
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Deregister the listener. In-flight purchase handling keeps running.
    pub fn remove(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Purchase listener deregistered");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
