//! # HTTP API
//!
//! JSON endpoints for driving the assistant plus the push channels.

pub mod agent;
pub mod stream;

use omnicart_core::swarm::Session;
use std::sync::Arc;

/// Application state
pub struct AppState {
    pub session: Session,
}

pub type SharedState = Arc<AppState>;
