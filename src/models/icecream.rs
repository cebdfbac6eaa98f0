use serde::{Deserialize, Serialize};

/// An ice-cream product record, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IceCream {
    pub name: String,
    #[serde(default)]
    pub image_open: String,
    #[serde(default)]
    pub image_closed: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sourcing_values: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergy_info: String,
    #[serde(default)]
    pub dietary_certification: String,
    #[serde(default)]
    pub product_id: String,
}
