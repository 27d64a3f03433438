//! # Omnicart Core
//!
//! The "Brain" of Omnicart - query routing, the mock agent crews, and the
//! session state the server exposes.
//!
//! ## Architecture
//!
//! - `query` - Keyword routing into grocery, tech, travel, and finance
//! - `catalog` - Canned shopping lists per domain
//! - `models` - Model configuration and the mock chat model
//! - `skills/` - Agent roles, task prompts, and the sequential crew runner
//! - `swarm/` - Executor, controller, and the event-streaming session
//!
//! ## Usage
//!
//! ```rust,ignore
//! use omnicart_core::swarm::{Session, SessionConfig};
//!
//! let session = Session::new(SessionConfig::default());
//! session.start_controller().await?;
//! session.run("find me a budget laptop").await?;
//! println!("{:?}", session.shopping_list().await);
//! ```

pub mod catalog;
pub mod models;
pub mod query;
pub mod skills;
pub mod swarm;
