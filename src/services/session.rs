use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::{
    config::CatalogConfig,
    error::{IapError, Result},
    models::{product::Product, subscription::SubscriptionStatus},
    services::{
        catalog_service::CatalogService,
        notification_service::Notifier,
        purchase_listener::{ListenerHandle, PurchaseListener},
        purchase_service::PurchaseService,
        receipt_service::ReceiptValidator,
        status_store::{Generation, StatusStore},
        store_connection::StoreConnection,
        validation_service::ValidationService,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loaded,
    Closed,
}

/// Purchase workflow for one screen lifetime.
///
/// Owns the purchase listener registration; [`SubscriptionSession::teardown`]
/// (or dropping the session) releases it.
pub struct SubscriptionSession {
    store: Arc<dyn StoreConnection>,
    catalog_service: CatalogService,
    purchase_service: PurchaseService,
    validation: Arc<ValidationService>,
    status: Arc<StatusStore>,
    products: RwLock<Vec<Product>>,
    phase: RwLock<SessionPhase>,
    listener: Mutex<Option<ListenerHandle>>,
    generation: Generation,
}

impl SubscriptionSession {
    /// Register the listener, load the catalog and restore the status from
    /// the device receipt. None of these steps fail the session.
    #[instrument(skip_all)]
    pub async fn start(
        store: Arc<dyn StoreConnection>,
        validator: Arc<dyn ReceiptValidator>,
        notifier: Arc<dyn Notifier>,
        catalog: &CatalogConfig,
    ) -> Self {
        let status = Arc::new(StatusStore::new());
        let validation = Arc::new(ValidationService::new(validator, status.clone()));

        let listener = PurchaseListener::new(
            store.clone(),
            validation.clone(),
            status.clone(),
            notifier,
        )
        .spawn();

        let session = Self {
            catalog_service: CatalogService::new(store.clone(), catalog),
            purchase_service: PurchaseService::new(store.clone()),
            store,
            validation,
            generation: status.current_generation(),
            status,
            products: RwLock::new(Vec::new()),
            phase: RwLock::new(SessionPhase::Uninitialized),
            listener: Mutex::new(Some(listener)),
        };

        let products = session.catalog_service.load().await;
        *write_lock(&session.products) = products;
        *write_lock(&session.phase) = SessionPhase::Loaded;

        session.restore_status().await;
        info!("Subscription session started");
        session
    }

    pub fn phase(&self) -> SessionPhase {
        *read_lock(&self.phase)
    }

    pub fn products(&self) -> Vec<Product> {
        read_lock(&self.products).clone()
    }

    pub fn status(&self) -> Option<SubscriptionStatus> {
        self.status.get()
    }

    pub fn watch_status(&self) -> watch::Receiver<Option<SubscriptionStatus>> {
        self.status.subscribe()
    }

    /// Reload the catalog from the store, keeping the session open
    pub async fn reload_products(&self) -> Result<Vec<Product>> {
        self.ensure_open()?;
        let products = self.catalog_service.load().await;
        *write_lock(&self.products) = products.clone();
        Ok(products)
    }

    /// Start a purchase for a loaded product; completion is asynchronous
    pub async fn request_purchase(&self, product_id: &str) -> Result<()> {
        self.ensure_open()?;
        let catalog = self.products();
        self.purchase_service.request(product_id, &catalog).await
    }

    /// Deregister the listener, invalidate pending status writes and close
    /// the store connection. Safe to call more than once.
    pub async fn teardown(&self) {
        {
            let mut phase = write_lock(&self.phase);
            if *phase == SessionPhase::Closed {
                return;
            }
            *phase = SessionPhase::Closed;
        }

        if let Some(listener) = lock(&self.listener).take() {
            listener.remove();
        }
        self.status.invalidate();

        if let Err(e) = self.store.close().await {
            warn!(error = %e, "Failed to close store connection");
        }
        info!("Subscription session torn down");
    }

    pub fn is_listening(&self) -> bool {
        lock(&self.listener)
            .as_ref()
            .is_some_and(ListenerHandle::is_active)
    }

    async fn restore_status(&self) {
        let receipt = match self.store.current_receipt().await {
            Ok(Some(receipt)) if !receipt.is_empty() => receipt,
            Ok(_) => {
                info!("No device receipt to restore subscription status from");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read device receipt");
                return;
            }
        };

        if let Err(e) = self
            .validation
            .validate_and_record(&receipt, self.generation)
            .await
        {
            warn!(error = %e, "Failed to restore subscription status");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match self.phase() {
            SessionPhase::Closed => Err(IapError::SessionClosed),
            _ => Ok(()),
        }
    }
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        self.status.invalidate();
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
