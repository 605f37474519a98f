use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use shared::domain::ProductInfo;

lazy_static! {
    static ref ASIN_PATTERN: Regex = Regex::new(r"/([A-Z0-9]{10})(?:[/?]|$)").unwrap();
}

const PRODUCT_QUERY: &str = r#"
query amazonProduct($asin: String!) {
  amazonProduct(input: { asin: $asin }) {
    title
    mainImageUrl
    rating
    price {
      display
    }
  }
}
"#;

/// Pulls the ten character product identifier out of an Amazon product link.
pub fn extract_asin(link: &str) -> Option<&str> {
    ASIN_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn lookup(&self, asin: &str) -> Result<ProductInfo>;
}

/// Used when no Canopy API key is configured.
pub struct MissingProductCatalog;

#[async_trait]
impl ProductCatalog for MissingProductCatalog {
    async fn lookup(&self, _asin: &str) -> Result<ProductInfo> {
        Err(anyhow!("product catalog is not configured"))
    }
}

pub struct CanopyCatalog {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl CanopyCatalog {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ProductData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductData {
    amazon_product: Option<AmazonProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmazonProduct {
    title: String,
    main_image_url: String,
    rating: Option<f64>,
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    display: Option<String>,
}

#[async_trait]
impl ProductCatalog for CanopyCatalog {
    async fn lookup(&self, asin: &str) -> Result<ProductInfo> {
        let response = self
            .http
            .post(&self.api_url)
            .header("API-KEY", &self.api_key)
            .json(&json!({
                "query": PRODUCT_QUERY,
                "variables": { "asin": asin },
            }))
            .send()
            .await
            .context("failed to reach product catalog")?;

        let status = response.status();
        if !status.is_success() {
            bail!("product catalog responded with status {status}");
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .context("failed to decode product catalog response")?;

        if let Some(first) = body.errors.first() {
            bail!("product catalog error: {}", first.message);
        }

        let product = body
            .data
            .and_then(|data| data.amazon_product)
            .ok_or_else(|| anyhow!("product {asin} not found"))?;

        Ok(ProductInfo {
            name: product.title,
            image: product.main_image_url,
            rating: product.rating,
            price: product.price.and_then(|price| price.display),
        })
    }
}

#[cfg(test)]
#[path = "tests/product_info_tests.rs"]
mod tests;
