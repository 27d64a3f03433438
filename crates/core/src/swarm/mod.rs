//! # Swarm Orchestration
//!
//! Runs the shopping agents for a query and reports what they do.
//!
//! ## Run Flow
//!
//! ```text
//! Query → Classify → Domain Crew → Shopping List → Browser Execution → Completed
//! ```
//!
//! With crew mode off (or before the controller is ready) a scripted
//! simulation plays the same flow with canned log lines.

pub mod board;
pub mod controller;
pub mod events;
pub mod executor;
pub mod pipeline;
pub mod session;
mod simulation;

pub use board::{AgentState, AgentStatusBoard};
pub use controller::{
    ControllerError, ControllerStatus, ControllerTask, QueryOutcome, ShoppingController,
};
pub use events::{AssistantEvent, BrowserActivity, LogEntry, LogLevel};
pub use executor::{
    ExecutionReport, ExecutorOutput, ExecutorProgress, ReportStatus, ShoppingExecutor, Tally,
};
pub use pipeline::CurrentTask;
pub use session::{AgentStatusSnapshot, Session, SessionConfig, SessionError, StatusSnapshot};
