use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    error::{IapError, Result},
    models::product::Product,
    services::store_connection::StoreConnection,
};

pub struct PurchaseService {
    store: Arc<dyn StoreConnection>,
}

impl PurchaseService {
    pub fn new(store: Arc<dyn StoreConnection>) -> Self {
        Self { store }
    }

    /// Fire a purchase request for a catalog product.
    ///
    /// The outcome is delivered to the purchase listener; this only reports
    /// whether the store accepted the request.
    #[instrument(skip(self, catalog))]
    pub async fn request(&self, product_id: &str, catalog: &[Product]) -> Result<()> {
        if !catalog.iter().any(|p| p.product_id == product_id) {
            warn!("Purchase requested for a product outside the loaded catalog");
            return Err(IapError::UnknownProduct(product_id.to_string()));
        }

        match self.store.request_purchase(product_id).await {
            Ok(()) => {
                info!("Purchase request sent to store");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Store rejected purchase request");
                Err(match e {
                    IapError::PurchaseRequest(_) => e,
                    other => IapError::PurchaseRequest(other.to_string()),
                })
            }
        }
    }
}
