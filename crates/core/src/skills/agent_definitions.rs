//! # Agent Definitions
//!
//! The specialist agents the shopping crews are assembled from.
//! Every agent shares one chat model handle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::models::{ChatModel, MockChatModel, ModelConfig};

/// Specialist role an agent plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Inventory,
    Dietary,
    Budget,
    PriceComparison,
    Browser,
    Tech,
    Travel,
    Finance,
}

impl AgentRole {
    pub fn all() -> [AgentRole; 8] {
        [
            AgentRole::Inventory,
            AgentRole::Dietary,
            AgentRole::Budget,
            AgentRole::PriceComparison,
            AgentRole::Browser,
            AgentRole::Tech,
            AgentRole::Travel,
            AgentRole::Finance,
        ]
    }

    /// Key used on the status board and over the wire
    pub fn key(&self) -> &'static str {
        match self {
            AgentRole::Inventory => "inventory",
            AgentRole::Dietary => "dietary",
            AgentRole::Budget => "budget",
            AgentRole::PriceComparison => "price_comparison",
            AgentRole::Browser => "browser",
            AgentRole::Tech => "tech",
            AgentRole::Travel => "travel",
            AgentRole::Finance => "finance",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AgentRole::Inventory => "Inventory Manager",
            AgentRole::Dietary => "Dietary Specialist",
            AgentRole::Budget => "Budget Optimizer",
            AgentRole::PriceComparison => "Price Comparison Expert",
            AgentRole::Browser => "Shopping Browser",
            AgentRole::Tech => "Tech Product Specialist",
            AgentRole::Travel => "Travel Planner",
            AgentRole::Finance => "Financial Advisor",
        }
    }

    pub fn goal(&self) -> &'static str {
        match self {
            AgentRole::Inventory => {
                "Track and manage household inventory to determine what items need to be purchased"
            }
            AgentRole::Dietary => {
                "Ensure all food items meet the user's dietary preferences and restrictions"
            }
            AgentRole::Budget => {
                "Optimize shopping lists to stay within budget while maximizing value"
            }
            AgentRole::PriceComparison => "Find the best prices for items across different stores",
            AgentRole::Browser => "Navigate online stores to find and purchase items",
            AgentRole::Tech => {
                "Research and recommend the best tech products based on user requirements"
            }
            AgentRole::Travel => {
                "Research and plan optimal travel itineraries based on user preferences"
            }
            AgentRole::Finance => "Provide investment and financial planning recommendations",
        }
    }

    pub fn backstory(&self) -> &'static str {
        match self {
            AgentRole::Inventory => {
                "You are an expert inventory manager with years of experience \
                 in grocery and household item management. You have a keen eye for detail \
                 and can efficiently track what items are running low and need to be restocked."
            }
            AgentRole::Dietary => {
                "You are a certified nutritionist and dietary specialist with \
                 extensive knowledge of various diets, allergies, and food restrictions. \
                 You help people find food items that match their specific dietary needs \
                 while ensuring nutritional balance."
            }
            AgentRole::Budget => {
                "You are a financial advisor specialized in household budgeting. \
                 You have helped thousands of families optimize their grocery spending \
                 to get the most value while staying within their budget constraints."
            }
            AgentRole::PriceComparison => {
                "You are a savvy shopper with an encyclopedic knowledge of \
                 pricing across different grocery stores and online retailers. You can \
                 quickly identify where to get the best deals for any product."
            }
            AgentRole::Browser => {
                "You are an expert in online shopping and web navigation. \
                 You can efficiently browse online stores, find specific items, \
                 compare options, and complete the checkout process."
            }
            AgentRole::Tech => {
                "You are a technology expert with deep knowledge of computers, \
                 laptops, smartphones, and other electronic devices. You stay up-to-date with \
                 the latest product releases and can provide detailed comparisons and recommendations."
            }
            AgentRole::Travel => {
                "You are an experienced travel agent who has planned trips \
                 for clients all over the world. You have extensive knowledge of destinations, \
                 accommodations, transportation options, and can create personalized travel plans."
            }
            AgentRole::Finance => {
                "You are a certified financial advisor with expertise in \
                 investments, retirement planning, and personal finance. You help clients \
                 make informed decisions about their financial future."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An agent bound to a chat model
#[derive(Clone)]
pub struct Agent {
    pub role: AgentRole,
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub verbose: bool,
    pub model: Arc<dyn ChatModel>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("title", &self.title)
            .field("model", &self.model.model_name())
            .finish()
    }
}

/// Builds agents that share a single model
#[derive(Clone)]
pub struct AgentFactory {
    model: Arc<dyn ChatModel>,
}

impl AgentFactory {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_model(Arc::new(MockChatModel::new(config)))
    }

    /// Use an arbitrary chat model (tests, alternate backends)
    pub fn with_model(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn agent(&self, role: AgentRole) -> Agent {
        Agent {
            role,
            title: role.title(),
            goal: role.goal(),
            backstory: role.backstory(),
            verbose: true,
            model: Arc::clone(&self.model),
        }
    }

    pub fn inventory_agent(&self) -> Agent {
        self.agent(AgentRole::Inventory)
    }

    pub fn dietary_agent(&self) -> Agent {
        self.agent(AgentRole::Dietary)
    }

    pub fn budget_agent(&self) -> Agent {
        self.agent(AgentRole::Budget)
    }

    pub fn price_comparison_agent(&self) -> Agent {
        self.agent(AgentRole::PriceComparison)
    }

    pub fn browser_agent(&self) -> Agent {
        self.agent(AgentRole::Browser)
    }

    pub fn tech_product_agent(&self) -> Agent {
        self.agent(AgentRole::Tech)
    }

    pub fn travel_agent(&self) -> Agent {
        self.agent(AgentRole::Travel)
    }

    pub fn finance_agent(&self) -> Agent {
        self.agent(AgentRole::Finance)
    }
}
