//! # Omnicart Skills
//!
//! Agents, tasks, and the crew runner that strings them together.
//!
//! ```text
//! Crew
//!   ├── Agents (role, goal, backstory, shared ChatModel)
//!   └── Tasks  (prompt rendered from UserPreferences)
//! ```

pub mod agent_definitions;
pub mod crew;
pub mod tasks;

pub use agent_definitions::{Agent, AgentFactory, AgentRole};
pub use crew::{Crew, CrewOutput, CrewProgress, TaskOutput};
pub use tasks::{
    BudgetPreferences, DietaryPreferences, InventoryItem, InventoryPreferences, StorePreferences,
    Task, TaskFactory, UserPreferences,
};
