//! # Catalog
//!
//! Canned purchasable items for each shopping domain.

use serde::{Deserialize, Serialize};

use crate::query::QueryType;

/// A purchasable item on a shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub price: f64,
    pub store: String,
    pub category: String,
    /// Hardware summary, only set for tech products
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<String>,
}

impl ShoppingItem {
    pub fn new(
        name: &str,
        quantity: u32,
        unit: &str,
        price: f64,
        store: &str,
        category: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            price,
            store: store.to_string(),
            category: category.to_string(),
            specs: None,
        }
    }

    pub fn with_specs(mut self, specs: &str) -> Self {
        self.specs = Some(specs.to_string());
        self
    }

    /// Line total (quantity * unit price)
    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

pub fn grocery_items() -> Vec<ShoppingItem> {
    vec![
        ShoppingItem::new("Organic Spinach", 2, "bag", 3.99, "Whole Foods", "produce"),
        ShoppingItem::new("Oat Milk", 2, "carton", 4.49, "Trader Joe's", "dairy"),
        ShoppingItem::new("Organic Tofu", 3, "pack", 2.99, "Sprouts", "protein"),
        ShoppingItem::new("Quinoa", 1, "bag", 6.99, "Amazon Fresh", "grains"),
    ]
}

pub fn laptop_items() -> Vec<ShoppingItem> {
    vec![
        ShoppingItem::new("MacBook Pro 14", 1, "unit", 1999.99, "Apple", "laptop")
            .with_specs("M3 Pro, 32GB RAM, 1TB SSD"),
        ShoppingItem::new("Dell XPS 15", 1, "unit", 1699.99, "Dell", "laptop")
            .with_specs("Intel i9, 32GB RAM, 1TB SSD"),
        ShoppingItem::new("Lenovo ThinkPad X1", 1, "unit", 1599.99, "Lenovo", "laptop")
            .with_specs("Intel i7, 16GB RAM, 512GB SSD"),
    ]
}

pub fn smartphone_items() -> Vec<ShoppingItem> {
    vec![
        ShoppingItem::new("Samsung Galaxy S24 Ultra", 1, "unit", 1299.99, "Samsung", "smartphone"),
        ShoppingItem::new("iPhone 15 Pro", 1, "unit", 1099.99, "Apple", "smartphone"),
        ShoppingItem::new("Google Pixel 8 Pro", 1, "unit", 999.99, "Google", "smartphone"),
    ]
}

pub fn travel_items() -> Vec<ShoppingItem> {
    vec![
        ShoppingItem::new("Marriott Hotel - New York", 1, "night", 299.99, "Booking.com", "hotel"),
        ShoppingItem::new("Hilton Hotel - New York", 1, "night", 279.99, "Hotels.com", "hotel"),
        ShoppingItem::new("JFK to LAX Flight", 1, "round-trip", 399.99, "Expedia", "flight"),
    ]
}

pub fn finance_items() -> Vec<ShoppingItem> {
    vec![
        ShoppingItem::new("Vanguard S&P 500 ETF (VOO)", 10, "share", 452.78, "Vanguard", "etf"),
        ShoppingItem::new(
            "Vanguard Total Stock Market ETF (VTI)",
            10,
            "share",
            244.37,
            "Vanguard",
            "etf",
        ),
        ShoppingItem::new("iShares Core S&P 500 ETF (IVV)", 5, "share", 459.50, "iShares", "etf"),
    ]
}

/// Items for a domain. Tech splits on whether the query mentions a laptop.
pub fn items_for(kind: QueryType, query: &str) -> Vec<ShoppingItem> {
    match kind {
        QueryType::Grocery => grocery_items(),
        QueryType::Tech if query.to_lowercase().contains("laptop") => laptop_items(),
        QueryType::Tech => smartphone_items(),
        QueryType::Travel => travel_items(),
        QueryType::Finance => finance_items(),
    }
}

pub fn total_cost(items: &[ShoppingItem]) -> f64 {
    items.iter().map(ShoppingItem::subtotal).sum()
}
