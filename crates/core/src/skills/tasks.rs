//! # Task Definitions
//!
//! Prompt builders for each crew task. The prompts are rendered from user
//! preferences so the agents at least see what the user asked for.

use serde::{Deserialize, Serialize};

use super::agent_definitions::AgentRole;
use crate::catalog::ShoppingItem;

/// Item the user already has at home
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryPreferences {
    #[serde(default)]
    pub current_items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietaryPreferences {
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetPreferences {
    #[serde(default)]
    pub max_budget: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePreferences {
    #[serde(default)]
    pub preferred: Vec<String>,
}

/// Everything the user told us, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary: Option<DietaryPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stores: Option<StorePreferences>,
}

impl UserPreferences {
    pub fn from_query(query: impl Into<String>) -> Self {
        Self {
            user_query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Overlay `other` on top of `self`; sections present in `other` win.
    pub fn merge(&mut self, other: UserPreferences) {
        if other.user_query.is_some() {
            self.user_query = other.user_query;
        }
        if other.inventory.is_some() {
            self.inventory = other.inventory;
        }
        if other.dietary.is_some() {
            self.dietary = other.dietary;
        }
        if other.budget.is_some() {
            self.budget = other.budget;
        }
        if other.stores.is_some() {
            self.stores = other.stores;
        }
    }

    fn query_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.user_query.as_deref().unwrap_or(fallback)
    }
}

/// A unit of work assigned to one agent role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub agent: AgentRole,
    pub description: String,
    pub expected_output: String,
}

impl Task {
    fn new(agent: AgentRole, description: String, expected_output: &str) -> Self {
        Self {
            agent,
            description,
            expected_output: expected_output.to_string(),
        }
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}

fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

/// Renders task prompts
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFactory;

impl TaskFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn inventory_analysis_task(&self, prefs: &UserPreferences) -> Task {
        let inventory = prefs
            .inventory
            .as_ref()
            .map(|inv| {
                inv.current_items
                    .iter()
                    .map(|item| {
                        format!(
                            "- {}: {} {}",
                            item.name.as_deref().unwrap_or("Unknown"),
                            format_quantity(item.quantity.unwrap_or(0.0)),
                            item.unit.as_deref().unwrap_or("")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        let inventory = if inventory.is_empty() {
            "No inventory data provided.".to_string()
        } else {
            inventory
        };

        let description = format!(
            "Analyze the current inventory and determine what items need to be purchased.\n\
             Consider standard household items that might be running low based on typical usage patterns.\n\
             Consider the user's query: \"{}\"\n\n\
             Current inventory:\n{}\n\n\
             Your final answer should be a list of items that need to be purchased, with quantities.",
            prefs.query_or("Generate a shopping list"),
            inventory
        );
        Task::new(
            AgentRole::Inventory,
            description,
            "A list of items that need to be purchased with quantities",
        )
    }

    pub fn dietary_filtering_task(&self, prefs: &UserPreferences) -> Task {
        let dietary = prefs.dietary.clone().unwrap_or_default();
        let description = format!(
            "Filter food items based on dietary preferences and restrictions.\n\
             Consider the user's query: \"{}\"\n\n\
             Dietary restrictions: {}\n\
             Dietary preferences: {}\n\n\
             Your final answer should be a list of items that meet the dietary criteria.",
            prefs.query_or("Filter items based on dietary preferences"),
            join_or(&dietary.restrictions, "None"),
            join_or(&dietary.preferences, "None")
        );
        Task::new(
            AgentRole::Dietary,
            description,
            "A list of items that meet the dietary criteria",
        )
    }

    pub fn budget_optimization_task(&self, prefs: &UserPreferences) -> Task {
        let max_budget = prefs
            .budget
            .as_ref()
            .and_then(|b| b.max_budget)
            .filter(|b| *b != 0.0)
            .map(|b| b.to_string())
            .unwrap_or_else(|| "Not specified".to_string());
        let description = format!(
            "Optimize the shopping list based on budget constraints.\n\
             Consider the user's query: \"{}\"\n\n\
             Maximum budget: ${}\n\n\
             Your final answer should be an optimized shopping list that stays within budget.",
            prefs.query_or("Optimize shopping list based on budget"),
            max_budget
        );
        Task::new(
            AgentRole::Budget,
            description,
            "An optimized shopping list within budget constraints",
        )
    }

    pub fn price_comparison_task(&self, prefs: &UserPreferences) -> Task {
        let preferred = prefs
            .stores
            .as_ref()
            .map(|s| join_or(&s.preferred, "All stores"))
            .unwrap_or_else(|| "All stores".to_string());
        let description = format!(
            "Compare prices for items across different stores.\n\
             Consider the user's query: \"{}\"\n\n\
             Preferred stores: {}\n\n\
             Your final answer should be a list of items with the best price and store information.",
            prefs.query_or("Compare prices across stores"),
            preferred
        );
        Task::new(
            AgentRole::PriceComparison,
            description,
            "A list of items with optimal prices and store information",
        )
    }

    /// Checkout walkthrough. Items are grouped by store in first-seen order.
    pub fn shopping_execution_task(&self, prefs: &UserPreferences, list: &[ShoppingItem]) -> Task {
        let mut stores: Vec<(&str, Vec<&ShoppingItem>)> = Vec::new();
        for item in list {
            match stores.iter_mut().find(|(store, _)| *store == item.store) {
                Some((_, items)) => items.push(item),
                None => stores.push((item.store.as_str(), vec![item])),
            }
        }

        let by_store = stores
            .iter()
            .map(|(store, items)| {
                let lines = items
                    .iter()
                    .map(|i| format!("  - {}: {} {}", i.name, i.quantity, i.unit))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{}:\n{}\n\n", store, lines)
            })
            .collect::<String>();
        let by_store = if by_store.is_empty() {
            "No items provided.".to_string()
        } else {
            by_store
        };

        let description = format!(
            "Execute the shopping process by visiting each store's website and adding items to the cart.\n\
             Simulate the checkout process but stop before finalizing payment.\n\
             Consider the user's query: \"{}\"\n\n\
             Shopping list by store:\n{}\n\n\
             Your final answer should be a detailed report of the shopping process, including any issues encountered.",
            prefs.query_or("Execute shopping process"),
            by_store
        );
        Task::new(
            AgentRole::Browser,
            description,
            "A detailed report of the shopping process",
        )
    }

    pub fn tech_product_research_task(&self, user_query: &str) -> Task {
        let description = format!(
            "Research and recommend tech products based on the user's query.\n\
             User query: \"{}\"\n\n\
             1. Identify the specific tech product category the user is interested in.\n\
             2. Research the top products in this category considering factors like:\n\
             \x20  - Feature specifications\n\
             \x20  - Price range\n\
             \x20  - User reviews\n\
             \x20  - Availability\n\
             3. Compare the products across different retailers.\n\
             4. Recommend the best options with justification.\n\n\
             Your final answer should be a detailed comparison of the best tech products\n\
             that match the user's query, with specific recommendations.",
            user_query
        );
        Task::new(
            AgentRole::Tech,
            description,
            "A detailed comparison of tech products with recommendations",
        )
    }

    pub fn travel_planning_task(&self, user_query: &str) -> Task {
        let description = format!(
            "Research and plan a travel itinerary based on the user's query.\n\
             User query: \"{}\"\n\n\
             1. Identify the specific travel needs (destination, dates, budget, preferences).\n\
             2. Research the best options for:\n\
             \x20  - Flights or transportation\n\
             \x20  - Accommodations\n\
             \x20  - Activities and attractions\n\
             3. Compare options across different booking platforms.\n\
             4. Create an optimal itinerary with pricing details.\n\n\
             Your final answer should be a detailed travel plan that matches\n\
             the user's query, with specific recommendations and pricing.",
            user_query
        );
        Task::new(
            AgentRole::Travel,
            description,
            "A detailed travel plan with recommendations and pricing",
        )
    }

    pub fn financial_advisory_task(&self, user_query: &str) -> Task {
        let description = format!(
            "Research and provide financial recommendations based on the user's query.\n\
             User query: \"{}\"\n\n\
             1. Identify the specific financial needs or goals.\n\
             2. Research appropriate investment options or financial strategies.\n\
             3. Compare options across different financial institutions.\n\
             4. Create a recommended financial plan with justification.\n\n\
             Your final answer should be detailed financial recommendations\n\
             that match the user's query, with specific investment suggestions\n\
             and expected outcomes.",
            user_query
        );
        Task::new(
            AgentRole::Finance,
            description,
            "Detailed financial recommendations with specific investment suggestions",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::grocery_items;

    #[test]
    fn test_inventory_task_renders_items() {
        let prefs = UserPreferences {
            user_query: Some("restock the pantry".into()),
            inventory: Some(InventoryPreferences {
                current_items: vec![
                    InventoryItem {
                        name: Some("Rice".into()),
                        quantity: Some(2.0),
                        unit: Some("kg".into()),
                    },
                    InventoryItem::default(),
                ],
            }),
            ..Default::default()
        };
        let task = TaskFactory::new().inventory_analysis_task(&prefs);
        assert_eq!(task.agent, AgentRole::Inventory);
        assert!(task.description.contains("\"restock the pantry\""));
        assert!(task.description.contains("- Rice: 2 kg"));
        assert!(task.description.contains("- Unknown: 0 "));
    }

    #[test]
    fn test_defaults_when_preferences_missing() {
        let prefs = UserPreferences::default();
        let tasks = TaskFactory::new();

        let inv = tasks.inventory_analysis_task(&prefs);
        assert!(inv.description.contains("No inventory data provided."));
        assert!(inv.description.contains("\"Generate a shopping list\""));

        let diet = tasks.dietary_filtering_task(&prefs);
        assert!(diet.description.contains("Dietary restrictions: None"));

        let budget = tasks.budget_optimization_task(&prefs);
        assert!(budget.description.contains("Maximum budget: $Not specified"));

        let price = tasks.price_comparison_task(&prefs);
        assert!(price.description.contains("Preferred stores: All stores"));

        let exec = tasks.shopping_execution_task(&prefs, &[]);
        assert!(exec.description.contains("No items provided."));
    }

    #[test]
    fn test_shopping_execution_groups_by_store() {
        let mut list = grocery_items();
        list.push(ShoppingItem::new("Kale", 1, "bunch", 2.49, "Whole Foods", "produce"));

        let task = TaskFactory::new().shopping_execution_task(&UserPreferences::default(), &list);
        assert_eq!(task.agent, AgentRole::Browser);
        assert!(task
            .description
            .contains("Whole Foods:\n  - Organic Spinach: 2 bag\n  - Kale: 1 bunch"));
        let whole_foods = task.description.find("Whole Foods:").unwrap();
        let sprouts = task.description.find("Sprouts:").unwrap();
        assert!(whole_foods < sprouts);
    }

    #[test]
    fn test_merge_overlays_present_sections() {
        let mut prefs = UserPreferences::from_query("old");
        prefs.budget = Some(BudgetPreferences {
            max_budget: Some(50.0),
        });

        prefs.merge(UserPreferences {
            user_query: Some("new".into()),
            ..Default::default()
        });
        assert_eq!(prefs.user_query.as_deref(), Some("new"));
        assert_eq!(prefs.budget.unwrap().max_budget, Some(50.0));
    }

    #[test]
    fn test_domain_tasks_embed_query() {
        let tasks = TaskFactory::new();
        assert!(tasks
            .tech_product_research_task("4k monitor")
            .description
            .contains("User query: \"4k monitor\""));
        assert_eq!(tasks.travel_planning_task("x").agent, AgentRole::Travel);
        assert_eq!(tasks.financial_advisory_task("x").agent, AgentRole::Finance);
    }
}
