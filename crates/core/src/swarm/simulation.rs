//! Scripted run used when crew mode is off or no controller is available.

use super::board::AgentState;
use super::events::LogEntry;
use super::session::Session;
use crate::catalog;
use crate::query::{classify, search_url, QueryType};
use crate::skills::AgentRole;

/// Lines each grocery-pipeline agent announces, in pipeline order
const GROCERY_STEPS: [(AgentRole, &str); 4] = [
    (
        AgentRole::Inventory,
        "[MOCK] Inventory Agent: Analyzing current household inventory",
    ),
    (
        AgentRole::Dietary,
        "[MOCK] Dietary Agent: Filtering items based on dietary preferences",
    ),
    (
        AgentRole::Budget,
        "[MOCK] Budget Agent: Optimizing shopping list based on budget constraints",
    ),
    (
        AgentRole::PriceComparison,
        "[MOCK] Price Comparison Agent: Finding the best prices across stores",
    ),
];

fn domain_agent(kind: QueryType) -> Option<AgentRole> {
    match kind {
        QueryType::Grocery => None,
        QueryType::Tech => Some(AgentRole::Tech),
        QueryType::Travel => Some(AgentRole::Travel),
        QueryType::Finance => Some(AgentRole::Finance),
    }
}

/// Play the mock pipeline for `query`, returning early if the session is
/// stopped between steps.
pub(crate) async fn run(session: &Session, query: &str) {
    session
        .log(LogEntry::info(format!("[MOCK] Processing query: {}", query)))
        .await;

    let kind = classify(query);
    tracing::debug!(query_type = %kind, "Running scripted simulation");
    session
        .log(LogEntry::info(format!("[MOCK] Detected query type: {}", kind)))
        .await;

    match domain_agent(kind) {
        None => {
            let mut previous = None;
            for (role, line) in GROCERY_STEPS {
                session
                    .update_board(|board| {
                        if let Some(prev) = previous {
                            board.set(prev, AgentState::Idle);
                        }
                        board.set(role, AgentState::Active);
                    })
                    .await;
                if !session.step().await {
                    return;
                }
                session.log(LogEntry::info(line)).await;
                previous = Some(role);
            }
            session
                .update_board(|board| {
                    board.set(AgentRole::PriceComparison, AgentState::Idle);
                    board.set(AgentRole::Browser, AgentState::Active);
                })
                .await;
        }
        Some(role) => {
            session
                .update_board(|board| board.set(role, AgentState::Active))
                .await;
            session
                .update_board(|board| board.set(AgentRole::Browser, AgentState::Active))
                .await;
        }
    }

    for site in kind.research_sites() {
        if session.is_stopped() {
            return;
        }
        session
            .log(LogEntry::info(format!(
                "[MOCK] Browser Agent: Visiting {} to {}",
                site,
                kind.research_purpose()
            )))
            .await;
        session.navigate(search_url(site, query)).await;
        if !session.step().await {
            return;
        }
    }

    session
        .set_shopping_list(catalog::items_for(kind, query))
        .await;
    session
        .log(LogEntry::success(format!(
            "[MOCK] Successfully processed query: {}",
            query
        )))
        .await;
}
