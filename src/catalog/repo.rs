use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Product as listed in the storefront's static catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: u64,        // whole pesos
    pub category: String,  // slug, e.g. "anillos"
    pub metal: String,     // slug, e.g. "oro-blanco"
    pub stock: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Read-only product list, in document order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let products: Vec<Product> =
            serde_json::from_str(raw).context("parse product catalog")?;
        Ok(Self::new(products))
    }

    /// A missing file yields an empty catalog; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "product catalog not found; serving an empty catalog");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", path.display()));
            }
        };
        let catalog = Self::from_json(&raw).with_context(|| format!("load {}", path.display()))?;
        if catalog.is_empty() {
            warn!(path = %path.display(), "product catalog has no products");
        }
        info!(path = %path.display(), products = catalog.len(), "product catalog loaded");
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
