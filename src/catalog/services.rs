use std::collections::BTreeSet;

use super::repo::{Catalog, Product};

/// Active sidebar filters. An empty set places no constraint on that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub categories: BTreeSet<String>,
    pub metals: BTreeSet<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        (self.categories.is_empty() || self.categories.contains(&product.category))
            && (self.metals.is_empty() || self.metals.contains(&product.metal))
    }
}

impl Catalog {
    pub fn filter<'a>(&'a self, filter: &'a ProductFilter) -> impl Iterator<Item = &'a Product> + 'a {
        self.products().iter().filter(move |p| filter.matches(p))
    }
}

/// `1234567` -> `"$1.234.567"` (es-CL grouping).
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

pub fn category_label(slug: &str) -> &str {
    match slug {
        "anillos" => "Anillos",
        "aros" => "Aros",
        "pulseras" => "Pulseras",
        "collares" => "Collares",
        other => other,
    }
}

pub fn metal_label(slug: &str) -> &str {
    match slug {
        "platino" => "Platino",
        "oro-blanco" => "Oro Blanco",
        "oro" => "Oro",
        "plata" => "Plata",
        "cobre" => "Cobre",
        "bronze" => "Bronze",
        other => other,
    }
}

/// Short label used on listing cards.
pub fn stock_label(stock: i64) -> String {
    if stock > 0 {
        format!("Stock: {}", stock)
    } else {
        "Out of stock".to_string()
    }
}

/// Longer label used on the detail page.
pub fn stock_detail_label(stock: i64) -> String {
    if stock > 0 {
        format!("{} units available", stock)
    } else {
        "Out of stock".to_string()
    }
}
