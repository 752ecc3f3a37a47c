//! Catalog product shape
//!
//! Products arrive with each request from the catalog provider and are
//! never mutated by the engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Shop-scoped catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub description: String,
    /// Catalog providers send prices as numbers or numeric strings
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub inventory: Option<i64>,
}

fn default_available() -> bool {
    true
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
        Missing(Option<()>),
    }

    match RawPrice::deserialize(deserializer)? {
        RawPrice::Number(n) => Ok(n),
        RawPrice::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid price: {}", s)))
        }
        RawPrice::Missing(_) => Ok(0.0),
    }
}

impl Product {
    /// Create a product with the required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        let title = title.into();
        let handle = title
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        Self {
            id: id.into(),
            title,
            handle,
            description: String::new(),
            price,
            image_url: None,
            available: true,
            inventory: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_inventory(mut self, inventory: i64) -> Self {
        self.inventory = Some(inventory);
        self.available = inventory > 0;
        self
    }

    /// Whether the product can currently be bought
    pub fn in_stock(&self) -> bool {
        self.available && self.inventory.map_or(true, |n| n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_number_and_string() {
        let p: Product = serde_json::from_str(r#"{"id":"1","title":"Hat","price":19.5}"#).unwrap();
        assert_eq!(p.price, 19.5);

        let p: Product =
            serde_json::from_str(r#"{"id":"2","title":"Scarf","price":"$24.00"}"#).unwrap();
        assert_eq!(p.price, 24.0);

        let p: Product = serde_json::from_str(r#"{"id":"3","title":"Sock"}"#).unwrap();
        assert_eq!(p.price, 0.0);
        assert!(p.available);
    }

    #[test]
    fn test_invalid_price_string_is_rejected() {
        let result: Result<Product, _> =
            serde_json::from_str(r#"{"id":"1","title":"Hat","price":"free"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_and_stock() {
        let p = Product::new("9", "Red Wrap Dress", 79.0).with_inventory(0);
        assert_eq!(p.handle, "red-wrap-dress");
        assert!(!p.in_stock());
    }
}
