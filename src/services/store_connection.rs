use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{
    error::Result,
    models::{
        product::Product,
        purchase::{Purchase, PurchaseFailure},
        receipt::Receipt,
    },
};

/// Platform purchase service (StoreKit binding or similar).
///
/// Implementations own the transaction queue. Purchase completions and
/// failures are delivered on broadcast channels in the order the platform
/// emits them; every subscriber sees every event sent after it subscribed.
///
/// A subscriber that falls behind by more than the channel capacity loses the
/// oldest events and is only told how many it missed. Implementations must
/// either size their channels for the worst-case burst of transactions, or
/// re-deliver every transaction that has not been finalized (as the platform
/// queue does on the next launch).
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Open the session with the platform service.
    async fn open(&self) -> Result<()>;

    /// Fetch metadata for the given subscription identifiers.
    async fn list_products(&self, product_ids: &[String]) -> Result<Vec<Product>>;

    /// Ask the platform to start a subscription purchase. Completion arrives
    /// later on [`StoreConnection::subscribe_purchase_updates`].
    async fn request_purchase(&self, product_id: &str) -> Result<()>;

    /// Acknowledge a transaction so the platform stops re-delivering it.
    /// Finalizing an already finalized transaction must be a no-op.
    async fn finalize(&self, purchase: &Purchase) -> Result<()>;

    fn subscribe_purchase_updates(&self) -> broadcast::Receiver<Purchase>;

    fn subscribe_purchase_errors(&self) -> broadcast::Receiver<PurchaseFailure>;

    /// App receipt currently stored on the device, if any.
    async fn current_receipt(&self) -> Result<Option<Receipt>> {
        Ok(None)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
