use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub category: String,
    pub current_price: f64,
    pub recommended_price: f64,
    /// Percentage; 0-100 is expected but not enforced.
    #[serde(default)]
    pub margin: f64,
    /// Probability in [0, 1].
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub inventory_level: u64,
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub competitor_avg_price: Option<f64>,
}

/// A proposed `old_price -> new_price` transition awaiting approval upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: i64,
    pub product_name: String,
    #[serde(default)]
    pub sku: String,
    pub old_price: f64,
    pub new_price: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub margin_after_change: f64,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
}

fn default_requires_approval() -> bool {
    true
}

/// Body of `GET {base}/products`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET {base}/price-changes/pending`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingChangesResponse {
    #[serde(default)]
    pub pending_changes: Vec<PendingChange>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}
