//! # Assistant Session
//!
//! Shared state behind the HTTP surface: the status board, run log, current
//! task, and last shopping list. Every change is also broadcast as an
//! [`AssistantEvent`] so push clients can follow along.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;

use super::board::{AgentState, AgentStatusBoard};
use super::controller::{ControllerError, ShoppingController};
use super::events::{AssistantEvent, BrowserActivity, LogEntry};
use super::executor::{ExecutorProgress, ShoppingExecutor, DEFAULT_SITE_DELAY};
use super::pipeline::CurrentTask;
use super::simulation;
use crate::catalog::ShoppingItem;
use crate::models::ModelConfig;
use crate::skills::UserPreferences;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A run is already in progress")]
    Busy,
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between scripted simulation steps
    pub step_delay: Duration,
    /// Pause between simulated site visits in crew mode
    pub site_delay: Duration,
    pub use_crew: bool,
    pub model: ModelConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_secs(1),
            site_delay: DEFAULT_SITE_DELAY,
            use_crew: true,
            model: ModelConfig::default(),
        }
    }
}

/// `GET /api/status` body
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub current_task: String,
    pub agent_status: AgentStatusBoard,
}

/// `GET /api/agent/status` body
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusSnapshot {
    pub is_running: bool,
    pub current_task: String,
    pub agent_status: AgentStatusBoard,
}

#[derive(Default)]
struct SessionState {
    board: AgentStatusBoard,
    logs: Vec<LogEntry>,
    task: CurrentTask,
    shopping_list: Vec<ShoppingItem>,
    /// Set from `begin` until `execute` returns, including after a stop
    in_flight: bool,
}

struct Inner {
    config: SessionConfig,
    state: RwLock<SessionState>,
    events: broadcast::Sender<AssistantEvent>,
    use_crew: AtomicBool,
    controller: RwLock<Option<Arc<ShoppingController>>>,
    stop_requested: AtomicBool,
}

/// Cheap to clone; all clones share the same state
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let use_crew = AtomicBool::new(config.use_crew);
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(SessionState::default()),
                events,
                use_crew,
                controller: RwLock::new(None),
                stop_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssistantEvent> {
        self.inner.events.subscribe()
    }

    pub fn uses_crew(&self) -> bool {
        self.inner.use_crew.load(Ordering::SeqCst)
    }

    /// Create and start the shopping controller if there isn't one yet
    pub async fn start_controller(&self) -> Result<(), SessionError> {
        let mut slot = self.inner.controller.write().await;
        if slot.is_some() {
            return Ok(());
        }
        let executor = ShoppingExecutor::new(self.inner.config.model.clone())
            .with_site_delay(self.inner.config.site_delay);
        let controller = ShoppingController::with_executor(executor);
        controller.start().await?;
        *slot = Some(Arc::new(controller));
        tracing::info!("Shopping controller ready");
        Ok(())
    }

    /// Flip crew mode. Enabling it without a controller starts one in the
    /// background.
    pub fn toggle_crew(&self, enabled: bool) -> bool {
        self.inner.use_crew.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "Crew mode toggled");
        if enabled {
            let session = self.clone();
            tokio::spawn(async move {
                if let Err(e) = session.start_controller().await {
                    tracing::warn!("Failed to start controller: {}", e);
                }
            });
        }
        enabled
    }

    /// Begin a run in the background.
    ///
    /// Returns [`SessionError::Busy`] while another run is in flight, even
    /// if that run was already asked to stop.
    pub async fn start_run(&self, query: String) -> Result<JoinHandle<()>, SessionError> {
        self.begin(&query).await?;
        let session = self.clone();
        Ok(tokio::spawn(async move { session.execute(&query).await }))
    }

    /// Run to completion on the current task
    pub async fn run(&self, query: &str) -> Result<(), SessionError> {
        self.begin(query).await?;
        self.execute(query).await;
        Ok(())
    }

    pub async fn stop(&self) {
        tracing::info!("Stop requested");
        self.inner.stop_requested.store(true, Ordering::SeqCst);
        let task = {
            let mut state = self.inner.state.write().await;
            state.task = CurrentTask::Stopped;
            state.task.to_string()
        };
        let controller = self.inner.controller.read().await.clone();
        if let Some(controller) = controller {
            controller.stop().await;
        }
        self.emit(AssistantEvent::CurrentTask(task));
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stop_requested.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> StatusSnapshot {
        let state = self.inner.state.read().await;
        StatusSnapshot {
            current_task: state.task.to_string(),
            agent_status: state.board.clone(),
        }
    }

    pub async fn agent_status(&self) -> AgentStatusSnapshot {
        let state = self.inner.state.read().await;
        AgentStatusSnapshot {
            is_running: state.task.is_running(),
            current_task: state.task.to_string(),
            agent_status: state.board.clone(),
        }
    }

    pub async fn current_task(&self) -> CurrentTask {
        self.inner.state.read().await.task.clone()
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        self.inner.state.read().await.logs.clone()
    }

    pub async fn shopping_list(&self) -> Vec<ShoppingItem> {
        self.inner.state.read().await.shopping_list.clone()
    }

    fn emit(&self, event: AssistantEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    pub(crate) async fn log(&self, entry: LogEntry) {
        tracing::debug!(level = ?entry.level, "{}", entry.message);
        self.inner.state.write().await.logs.push(entry.clone());
        self.emit(AssistantEvent::AgentLog(entry));
    }

    /// Mutate the board and broadcast the new snapshot
    pub(crate) async fn update_board(&self, f: impl FnOnce(&mut AgentStatusBoard)) {
        let board = {
            let mut state = self.inner.state.write().await;
            f(&mut state.board);
            state.board.clone()
        };
        self.emit(AssistantEvent::AgentStatus(board));
    }

    pub(crate) async fn navigate(&self, url: String) {
        self.emit(AssistantEvent::BrowserActivity(BrowserActivity::navigation(
            url,
        )));
    }

    pub(crate) async fn set_shopping_list(&self, list: Vec<ShoppingItem>) {
        self.inner.state.write().await.shopping_list = list;
    }

    /// Sleep one simulation step; false once a stop was requested
    pub(crate) async fn step(&self) -> bool {
        tokio::time::sleep(self.inner.config.step_delay).await;
        !self.is_stopped()
    }

    async fn begin(&self, query: &str) -> Result<(), SessionError> {
        {
            let mut state = self.inner.state.write().await;
            if state.in_flight || state.task.is_running() {
                return Err(SessionError::Busy);
            }
            state.in_flight = true;
            state.logs.clear();
            state.shopping_list.clear();
            state.task = CurrentTask::Processing(query.to_string());
            state.board.set_all(AgentState::Initializing);
        }
        self.inner.stop_requested.store(false, Ordering::SeqCst);
        tracing::info!(query, "Run started");

        let snapshot = self.status().await;
        self.emit(AssistantEvent::CurrentTask(snapshot.current_task));
        self.emit(AssistantEvent::AgentStatus(snapshot.agent_status));
        self.log(LogEntry::info(format!(
            "Initializing assistant with query: {}",
            query
        )))
        .await;
        Ok(())
    }

    async fn execute(&self, query: &str) {
        let controller = if self.uses_crew() {
            self.inner.controller.read().await.clone()
        } else {
            None
        };

        match controller {
            Some(controller) => {
                if let Err(e) = self.run_crew(&controller, query).await {
                    tracing::warn!("Run failed: {}", e);
                    self.log(LogEntry::error(format!("Error: {}", e))).await;
                }
            }
            None => simulation::run(self, query).await,
        }

        self.update_board(|board| board.set_all(AgentState::Idle))
            .await;
        let task = {
            let mut state = self.inner.state.write().await;
            state.task.finish();
            state.in_flight = false;
            state.task.to_string()
        };
        tracing::info!(current_task = %task, "Run finished");
        self.emit(AssistantEvent::CurrentTask(task));
    }

    async fn run_crew(
        &self,
        controller: &ShoppingController,
        query: &str,
    ) -> Result<(), SessionError> {
        if !controller.is_running() {
            self.log(LogEntry::warning("Shopping controller was stopped, restarting it"))
                .await;
            controller.start().await?;
        }

        let (tx, mut rx) = mpsc::channel(64);
        controller.set_progress_channel(Some(tx)).await;

        let work = controller.process_query(UserPreferences::from_query(query));
        tokio::pin!(work);
        let result = loop {
            tokio::select! {
                result = &mut work => break result,
                Some(progress) = rx.recv() => self.apply_progress(progress).await,
            }
        };

        controller.set_progress_channel(None).await;
        while let Ok(progress) = rx.try_recv() {
            self.apply_progress(progress).await;
        }

        let outcome = result?;
        self.set_shopping_list(outcome.shopping_list).await;
        self.log(LogEntry::success(format!(
            "Successfully processed query: {}",
            query
        )))
        .await;
        Ok(())
    }

    /// Mirror executor progress onto the board, log, and browser feed
    pub async fn apply_progress(&self, progress: ExecutorProgress) {
        match progress {
            ExecutorProgress::AgentStarted(role) => {
                self.update_board(|board| board.set(role, AgentState::Active))
                    .await;
            }
            ExecutorProgress::AgentFinished(role) => {
                self.update_board(|board| board.set(role, AgentState::Idle))
                    .await;
            }
            ExecutorProgress::SiteVisited { agent, site, url } => {
                self.log(LogEntry::info(format!("{}: Visiting {}", agent.title(), site)))
                    .await;
                self.navigate(url).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::AgentRole;
    use crate::swarm::events::LogLevel;

    fn config(use_crew: bool, step_delay: Duration) -> SessionConfig {
        SessionConfig {
            step_delay,
            site_delay: Duration::ZERO,
            use_crew,
            model: ModelConfig::default(),
        }
    }

    fn drain(rx: &mut broadcast::Receiver<AssistantEvent>) -> Vec<AssistantEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_initial_state() {
        let session = Session::new(SessionConfig::default());
        let status = session.agent_status().await;
        assert!(!status.is_running);
        assert_eq!(status.current_task, "Initializing...");
        assert!(session.logs().await.is_empty());
        assert!(session.uses_crew());
    }

    #[tokio::test]
    async fn test_simulated_grocery_run() {
        let session = Session::new(config(false, Duration::ZERO));
        let mut rx = session.subscribe();

        session.run("weekly groceries").await.unwrap();

        let logs = session.logs().await;
        let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages[0], "Initializing assistant with query: weekly groceries");
        assert_eq!(messages[1], "[MOCK] Processing query: weekly groceries");
        assert_eq!(messages[2], "[MOCK] Detected query type: grocery");
        assert!(messages.contains(&"[MOCK] Browser Agent: Visiting Whole Foods to find the best deals"));
        assert_eq!(logs.last().unwrap().level, LogLevel::Success);

        assert_eq!(session.shopping_list().await.len(), 4);
        assert_eq!(session.current_task().await, CurrentTask::Completed);

        let events = drain(&mut rx);
        let navigations = events
            .iter()
            .filter(|e| e.name() == "browser_activity")
            .count();
        assert_eq!(navigations, 5);
        match events.last() {
            Some(AssistantEvent::CurrentTask(task)) => assert_eq!(task, "Completed"),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_board_returns_to_idle() {
        let session = Session::new(config(false, Duration::ZERO));
        session.run("new laptop for coding").await.unwrap();
        let status = session.status().await;
        assert!(status.agent_status.active().is_empty());
        assert_eq!(status.agent_status.get(AgentRole::Tech), AgentState::Idle);
        assert_eq!(session.shopping_list().await[0].category, "laptop");
    }

    #[tokio::test]
    async fn test_rejects_concurrent_run() {
        let session = Session::new(config(false, Duration::from_millis(50)));
        let handle = session.start_run("milk and eggs".into()).await.unwrap();
        assert!(session.agent_status().await.is_running);

        let err = session.start_run("bread".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));

        session.stop().await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_ends_run_early() {
        let session = Session::new(config(false, Duration::from_millis(20)));
        let handle = session.start_run("cheap hotel in Rome".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.stop().await;
        handle.await.unwrap();

        assert_eq!(session.current_task().await, CurrentTask::Stopped);
        assert!(session.shopping_list().await.is_empty());
        assert!(!session
            .logs()
            .await
            .iter()
            .any(|l| l.message.starts_with("[MOCK] Successfully")));
    }

    #[tokio::test]
    async fn test_grocery_agent_line_logged_after_its_step() {
        let session = Session::new(config(false, Duration::from_millis(30)));
        let mut rx = session.subscribe();
        let handle = session.start_run("weekly groceries".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let inventory_active = drain(&mut rx).iter().any(|e| match e {
            AssistantEvent::AgentStatus(board) => {
                board.get(AgentRole::Inventory) == AgentState::Active
            }
            _ => false,
        });
        assert!(inventory_active);
        assert!(!session
            .logs()
            .await
            .iter()
            .any(|l| l.message.starts_with("[MOCK] Inventory Agent")));

        session.stop().await;
        handle.await.unwrap();
        assert!(!session
            .logs()
            .await
            .iter()
            .any(|l| l.message.starts_with("[MOCK] Inventory Agent")));
    }

    #[tokio::test]
    async fn test_stopped_run_blocks_next_run_until_it_exits() {
        let session = Session::new(config(false, Duration::from_millis(30)));
        let first = session.start_run("cheap hotel in Rome".into()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.stop().await;

        let err = session.start_run("weekly groceries".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        first.await.unwrap();

        session.run("weekly groceries").await.unwrap();
        assert_eq!(session.current_task().await, CurrentTask::Completed);

        let list = session.shopping_list().await;
        assert_eq!(list.len(), 4);
        assert!(list.iter().all(|i| i.category != "hotel"));

        let logs = session.logs().await;
        assert!(!logs.iter().any(|l| l.message.contains("Rome")
            || l.message.contains("travel options")));
        assert_eq!(
            logs.last().unwrap().message,
            "[MOCK] Successfully processed query: weekly groceries"
        );
    }

    #[tokio::test]
    async fn test_crew_run_uses_controller() {
        let session = Session::new(config(true, Duration::ZERO));
        session.start_controller().await.unwrap();
        let mut rx = session.subscribe();

        session.run("book a flight to Tokyo").await.unwrap();

        assert_eq!(session.shopping_list().await.len(), 3);
        let logs = session.logs().await;
        assert_eq!(
            logs.last().unwrap().message,
            "Successfully processed query: book a flight to Tokyo"
        );
        assert!(logs
            .iter()
            .any(|l| l.message == "Shopping Browser: Visiting Expedia"));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| e.name() == "browser_activity"));
    }

    #[tokio::test]
    async fn test_crew_restarts_after_stop() {
        let session = Session::new(config(true, Duration::ZERO));
        session.start_controller().await.unwrap();
        session.stop().await;

        session.run("index fund").await.unwrap();
        assert_eq!(session.current_task().await, CurrentTask::Completed);
        assert_eq!(session.shopping_list().await[0].category, "etf");
        assert!(session
            .logs()
            .await
            .iter()
            .any(|l| l.level == LogLevel::Warning && l.message.contains("restarting")));
    }

    #[tokio::test]
    async fn test_crew_mode_without_controller_simulates() {
        let session = Session::new(config(true, Duration::ZERO));
        session.run("bananas").await.unwrap();
        assert!(session
            .logs()
            .await
            .iter()
            .any(|l| l.message == "[MOCK] Detected query type: grocery"));
    }
}
