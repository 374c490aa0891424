use serde::{Deserialize, Serialize};

/// Purchasable subscription definition as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,
    pub title: String,
    pub description: String,
    pub localized_price: String,
}

/// Products response for the display surface
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsResponse {
    pub success: bool,
    pub data: Vec<Product>,
}
