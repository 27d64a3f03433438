//! # Shopping Controller
//!
//! Lifecycle wrapper around the executor: start/stop, remembers the last
//! list and report, and refuses work while stopped.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};

use super::executor::{ExecutionReport, ExecutorProgress, ShoppingExecutor};
use crate::catalog::ShoppingItem;
use crate::models::ModelConfig;
use crate::skills::UserPreferences;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Controller is not running")]
    NotRunning,
    #[error("Error starting controller: {0:#}")]
    Start(anyhow::Error),
    #[error("Missing user query in preferences")]
    MissingQuery,
    #[error("Error processing query: {0:#}")]
    Query(anyhow::Error),
    #[error("Error executing shopping: {0:#}")]
    Shopping(anyhow::Error),
    #[error("Error generating shopping list: {0:#}")]
    Generation(anyhow::Error),
}

/// What the controller is busy with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerTask {
    ProcessingQuery,
    RunningExecutor,
    ExecutingShopping,
    SettingPreferences,
    GeneratingShoppingList,
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    pub is_running: bool,
    pub current_task: Option<ControllerTask>,
    pub has_shopping_list: bool,
    pub items_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub shopping_list: Vec<ShoppingItem>,
    pub result: ExecutionReport,
}

#[derive(Default)]
struct ControllerState {
    current_task: Option<ControllerTask>,
    shopping_list: Vec<ShoppingItem>,
    shopping_result: Option<ExecutionReport>,
}

/// Owns an executor and guards it behind a running flag
pub struct ShoppingController {
    executor: Mutex<ShoppingExecutor>,
    running: AtomicBool,
    state: RwLock<ControllerState>,
}

impl ShoppingController {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_executor(ShoppingExecutor::new(config))
    }

    pub fn with_executor(executor: ShoppingExecutor) -> Self {
        Self {
            executor: Mutex::new(executor),
            running: AtomicBool::new(false),
            state: RwLock::new(ControllerState::default()),
        }
    }

    pub async fn start(&self) -> Result<(), ControllerError> {
        tracing::info!("Starting shopping controller");
        self.executor
            .lock()
            .await
            .initialize()
            .await
            .map_err(ControllerError::Start)?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub async fn stop(&self) {
        tracing::info!("Stopping shopping controller");
        self.running.store(false, Ordering::SeqCst);
        self.state.write().await.current_task = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> ControllerStatus {
        let state = self.state.read().await;
        ControllerStatus {
            is_running: self.is_running(),
            current_task: state.current_task,
            has_shopping_list: !state.shopping_list.is_empty(),
            items_count: state.shopping_list.len(),
        }
    }

    /// Route executor progress to `tx` (or stop reporting with `None`)
    pub async fn set_progress_channel(&self, tx: Option<mpsc::Sender<ExecutorProgress>>) {
        self.executor.lock().await.set_progress_channel(tx);
    }

    fn ensure_running(&self) -> Result<(), ControllerError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ControllerError::NotRunning)
        }
    }

    async fn set_task(&self, task: Option<ControllerTask>) {
        self.state.write().await.current_task = task;
    }

    /// Run the full executor flow for a query
    pub async fn process_query(
        &self,
        preferences: UserPreferences,
    ) -> Result<QueryOutcome, ControllerError> {
        self.ensure_running()?;
        self.set_task(Some(ControllerTask::ProcessingQuery)).await;

        if preferences.user_query.is_none() {
            self.set_task(None).await;
            return Err(ControllerError::MissingQuery);
        }

        self.set_task(Some(ControllerTask::RunningExecutor)).await;
        let result = self.executor.lock().await.run(Some(preferences)).await;

        let mut state = self.state.write().await;
        state.current_task = None;
        let output = result.map_err(ControllerError::Query)?;
        state.shopping_list = output.shopping_list.clone();
        state.shopping_result = Some(output.result.clone());

        Ok(QueryOutcome {
            shopping_list: output.shopping_list,
            result: output.result,
        })
    }

    pub async fn get_shopping_list(&self) -> Vec<ShoppingItem> {
        self.state.read().await.shopping_list.clone()
    }

    pub async fn get_shopping_result(&self) -> Option<ExecutionReport> {
        self.state.read().await.shopping_result.clone()
    }

    /// Execute `list`, or the stored list when `None`
    pub async fn execute_shopping(
        &self,
        list: Option<Vec<ShoppingItem>>,
    ) -> Result<ExecutionReport, ControllerError> {
        self.ensure_running()?;
        self.set_task(Some(ControllerTask::ExecutingShopping)).await;

        let list = match list {
            Some(list) if !list.is_empty() => list,
            _ => self.get_shopping_list().await,
        };
        let result = self.executor.lock().await.execute_shopping(&list).await;

        let mut state = self.state.write().await;
        state.current_task = None;
        let report = result.map_err(ControllerError::Shopping)?;
        state.shopping_result = Some(report.clone());
        Ok(report)
    }

    pub async fn set_preferences(&self, preferences: UserPreferences) -> Result<(), ControllerError> {
        self.ensure_running()?;
        self.set_task(Some(ControllerTask::SettingPreferences)).await;
        self.executor.lock().await.set_user_preferences(preferences);
        self.set_task(None).await;
        Ok(())
    }

    pub async fn generate_shopping_list(&self) -> Result<Vec<ShoppingItem>, ControllerError> {
        self.ensure_running()?;
        self.set_task(Some(ControllerTask::GeneratingShoppingList))
            .await;
        let result = self.executor.lock().await.generate_shopping_list().await;

        let mut state = self.state.write().await;
        state.current_task = None;
        let list = result.map_err(ControllerError::Generation)?;
        state.shopping_list = list.clone();
        Ok(list)
    }
}
