//! # Query Routing
//!
//! Keyword-based classification of free-text queries into shopping domains,
//! plus the per-domain site lists the simulated browser walks through.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

const TECH_TERMS: &[&str] = &[
    "laptop",
    "computer",
    "phone",
    "smartphone",
    "tablet",
    "gadget",
    "electronics",
    "tech",
    "device",
    "hardware",
    "software",
    "gaming",
    "camera",
    "headphone",
    "speaker",
    "tv",
    "television",
    "monitor",
];

const TRAVEL_TERMS: &[&str] = &[
    "travel",
    "vacation",
    "hotel",
    "flight",
    "trip",
    "booking",
    "destination",
    "resort",
    "airbnb",
    "airline",
    "tour",
    "cruise",
];

const FINANCE_TERMS: &[&str] = &[
    "invest",
    "finance",
    "stock",
    "etf",
    "fund",
    "roth",
    "ira",
    "portfolio",
    "dividend",
    "retirement",
    "bond",
    "crypto",
];

/// Shopping domain a query is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Grocery,
    Tech,
    Travel,
    Finance,
}

impl QueryType {
    /// All domains, in classification priority order (grocery is the fallback)
    pub fn all() -> [QueryType; 4] {
        [
            QueryType::Tech,
            QueryType::Travel,
            QueryType::Finance,
            QueryType::Grocery,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Grocery => "grocery",
            QueryType::Tech => "tech",
            QueryType::Travel => "travel",
            QueryType::Finance => "finance",
        }
    }

    /// Keywords that route a query to this domain. Grocery has none.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            QueryType::Grocery => &[],
            QueryType::Tech => TECH_TERMS,
            QueryType::Travel => TRAVEL_TERMS,
            QueryType::Finance => FINANCE_TERMS,
        }
    }

    /// Infer the domain from an item category (used when only a list is known)
    pub fn from_category(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "laptop" | "computer" | "phone" | "smartphone" | "tablet" | "electronics" => {
                QueryType::Tech
            }
            "hotel" | "flight" | "resort" | "airbnb" => QueryType::Travel,
            "etf" | "stock" | "fund" | "bond" | "crypto" => QueryType::Finance,
            _ => QueryType::Grocery,
        }
    }

    /// Sites the simulated browser visits while researching this domain
    pub fn research_sites(&self) -> &'static [&'static str] {
        match self {
            QueryType::Grocery => &["Walmart", "Target", "Kroger", "Whole Foods", "Amazon Fresh"],
            QueryType::Tech => &["BestBuy", "Amazon", "Newegg", "MicroCenter", "B&H"],
            QueryType::Travel => &["Expedia", "Booking.com", "Kayak", "Airbnb", "Hotels.com"],
            QueryType::Finance => &[
                "Vanguard",
                "Fidelity",
                "Charles Schwab",
                "Robinhood",
                "E*TRADE",
            ],
        }
    }

    /// What the browser agent says it is doing on each research site
    pub fn research_purpose(&self) -> &'static str {
        match self {
            QueryType::Grocery => "find the best deals",
            QueryType::Tech => "research tech products",
            QueryType::Travel => "research travel options",
            QueryType::Finance => "research investment options",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a query by keyword substring match: tech, then travel, then
/// finance; anything else is grocery.
pub fn classify(query: &str) -> QueryType {
    let query = query.to_lowercase();
    for kind in [QueryType::Tech, QueryType::Travel, QueryType::Finance] {
        if kind.keywords().iter().any(|term| query.contains(term)) {
            return kind;
        }
    }
    QueryType::Grocery
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]").expect("static regex is valid"))
}

/// Build the fake search URL the browser agent "navigates" to.
///
/// `Booking.com` becomes `www.bookingcom.com`, query words are joined by `+`.
pub fn search_url(site: &str, query: &str) -> String {
    let slug = non_alphanumeric().replace_all(&site.to_lowercase(), "").into_owned();
    let terms = query
        .split_whitespace()
        .map(|word| urlencoding::encode(word).into_owned())
        .collect::<Vec<_>>()
        .join("+");
    format!("https://www.{}.com/search?q={}", slug, terms)
}
