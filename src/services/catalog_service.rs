use std::{collections::HashSet, sync::Arc};

use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::{
    config::CatalogConfig,
    error::{IapError, Result},
    models::product::Product,
    services::store_connection::StoreConnection,
};

pub struct CatalogService {
    store: Arc<dyn StoreConnection>,
    product_ids: Vec<String>,
    opened: OnceCell<()>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn StoreConnection>, config: &CatalogConfig) -> Self {
        Self {
            store,
            product_ids: config.product_ids.clone(),
            opened: OnceCell::new(),
        }
    }

    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }

    /// Open the store connection at most once; a failed attempt may be retried
    pub async fn ensure_open(&self) -> Result<()> {
        self.opened
            .get_or_try_init(|| async {
                self.store.open().await?;
                info!("Store connection opened");
                Ok::<(), IapError>(())
            })
            .await
            .map(|_| ())
    }

    /// Load the catalog. Failures are logged and yield an empty catalog.
    #[instrument(skip(self), fields(requested = self.product_ids.len()))]
    pub async fn load(&self) -> Vec<Product> {
        match self.fetch().await {
            Ok(products) => {
                info!(count = products.len(), "Loaded subscription catalog");
                products
            }
            Err(e) => {
                warn!(error = %e, "Failed to load subscription catalog");
                Vec::new()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Product>> {
        self.ensure_open().await?;
        let products = self.store.list_products(&self.product_ids).await?;
        Ok(self.retain_requested(products))
    }

    /// Keep store order but drop anything not requested, and duplicates
    fn retain_requested(&self, products: Vec<Product>) -> Vec<Product> {
        let requested: HashSet<&str> = self.product_ids.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();

        products
            .into_iter()
            .filter(|product| {
                if !requested.contains(product.product_id.as_str()) {
                    warn!(
                        product_id = %product.product_id,
                        "Store returned a product that was not requested; dropping it"
                    );
                    return false;
                }
                seen.insert(product.product_id.clone())
            })
            .collect()
    }
}
