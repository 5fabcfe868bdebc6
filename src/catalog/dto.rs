use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::repo::Product;
use super::services::{
    category_label, format_price, metal_label, stock_detail_label, stock_label, ProductFilter,
};

/// Query string of the listing: `?categories=anillos,aros&metals=oro`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub metals: Option<String>,
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        Self {
            categories: split_list(q.categories.as_deref()),
            metals: split_list(q.metals.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductCard {
    pub id: u64,
    pub name: String,
    pub image: String,
    pub price: u64,
    pub price_label: String,
    pub stock: i64,
    pub stock_label: String,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            image: p.image.clone(),
            price: p.price,
            price_label: format_price(p.price),
            stock: p.stock,
            stock_label: stock_label(p.stock),
            out_of_stock: !p.in_stock(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: u64,
    pub price_label: String,
    pub category: String,
    pub category_label: String,
    pub metal: String,
    pub metal_label: String,
    pub stock: i64,
    pub stock_label: String,
    pub out_of_stock: bool,
}

impl From<&Product> for ProductDetails {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            image: p.image.clone(),
            price: p.price,
            price_label: format_price(p.price),
            category: p.category.clone(),
            category_label: category_label(&p.category).to_string(),
            metal: p.metal.clone(),
            metal_label: metal_label(&p.metal).to_string(),
            stock: p.stock,
            stock_label: stock_detail_label(p.stock),
            out_of_stock: !p.in_stock(),
        }
    }
}
