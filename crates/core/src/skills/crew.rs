//! # Crew
//!
//! Runs a fixed sequence of tasks, each against the agent holding the
//! matching role.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;

use super::agent_definitions::{Agent, AgentRole};
use super::tasks::Task;
use crate::models::ChatMessage;

/// Reported around each task while a crew works
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrewProgress {
    TaskStarted(AgentRole),
    TaskFinished(AgentRole),
}

/// Output of a single task
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutput {
    pub agent: AgentRole,
    pub description: String,
    pub raw: String,
}

/// Output of a full crew run
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    pub tasks: Vec<TaskOutput>,
    /// Output of the final task
    pub raw: String,
}

/// A set of agents working through tasks in order
#[derive(Debug, Clone)]
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    verbose: bool,
}

impl Crew {
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Self {
        Self {
            agents,
            tasks,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run every task in order
    pub async fn kickoff(&self) -> Result<CrewOutput> {
        self.run_tasks(None).await
    }

    /// Like [`Crew::kickoff`], reporting on `tx` as each task starts and
    /// finishes. The sender is dropped when the crew is done.
    pub async fn kickoff_with_progress(
        &self,
        tx: mpsc::Sender<CrewProgress>,
    ) -> Result<CrewOutput> {
        self.run_tasks(Some(tx)).await
    }

    #[tracing::instrument(skip(self, progress), fields(tasks = self.tasks.len()))]
    async fn run_tasks(&self, progress: Option<mpsc::Sender<CrewProgress>>) -> Result<CrewOutput> {
        if self.tasks.is_empty() {
            anyhow::bail!("Crew has no tasks to run");
        }

        let mut outputs = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let agent = self
                .agents
                .iter()
                .find(|a| a.role == task.agent)
                .ok_or_else(|| anyhow::anyhow!("No agent in crew for role '{}'", task.agent))?;

            if self.verbose {
                tracing::debug!(agent = %agent.title, "Working on task");
            }
            if let Some(tx) = &progress {
                let _ = tx.send(CrewProgress::TaskStarted(agent.role)).await;
            }

            let reply = agent
                .model
                .invoke(&[
                    ChatMessage::System(agent.backstory.to_string()),
                    ChatMessage::Human(task.description.clone()),
                ])
                .await
                .with_context(|| format!("{} failed its task", agent.title))?;

            outputs.push(TaskOutput {
                agent: agent.role,
                description: task.description.clone(),
                raw: reply.content().to_string(),
            });
            if let Some(tx) = &progress {
                let _ = tx.send(CrewProgress::TaskFinished(agent.role)).await;
            }
        }

        let raw = outputs
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();
        Ok(CrewOutput {
            tasks: outputs,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelConfig;
    use crate::skills::agent_definitions::AgentFactory;
    use crate::skills::tasks::TaskFactory;

    #[tokio::test]
    async fn test_kickoff_runs_tasks_in_order() {
        let agents = AgentFactory::new(ModelConfig::default());
        let tasks = TaskFactory::new();
        let crew = Crew::new(
            vec![agents.tech_product_agent(), agents.travel_agent()],
            vec![
                tasks.travel_planning_task("beach trip"),
                tasks.tech_product_research_task("new laptop"),
            ],
        );

        let output = crew.kickoff().await.unwrap();
        assert_eq!(output.tasks.len(), 2);
        assert_eq!(output.tasks[0].agent, AgentRole::Travel);
        assert!(output.tasks[0].raw.contains("travel itinerary"));
        assert!(output.raw.contains("tech products"));
    }

    #[tokio::test]
    async fn test_missing_agent_fails() {
        let agents = AgentFactory::new(ModelConfig::default());
        let crew = Crew::new(
            vec![agents.budget_agent()],
            vec![TaskFactory::new().financial_advisory_task("retirement")],
        );
        let err = crew.kickoff().await.unwrap_err();
        assert!(err.to_string().contains("finance"));
    }

    #[tokio::test]
    async fn test_progress_follows_each_task() {
        let agents = AgentFactory::new(ModelConfig::default());
        let tasks = TaskFactory::new();
        let crew = Crew::new(
            vec![agents.inventory_agent(), agents.dietary_agent()],
            vec![
                tasks.inventory_analysis_task(&Default::default()),
                tasks.dietary_filtering_task(&Default::default()),
            ],
        );

        let (tx, mut rx) = mpsc::channel(8);
        crew.kickoff_with_progress(tx).await.unwrap();

        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p);
        }
        assert_eq!(
            seen,
            vec![
                CrewProgress::TaskStarted(AgentRole::Inventory),
                CrewProgress::TaskFinished(AgentRole::Inventory),
                CrewProgress::TaskStarted(AgentRole::Dietary),
                CrewProgress::TaskFinished(AgentRole::Dietary),
            ]
        );
    }

    #[test]
    fn test_empty_crew_fails() {
        let crew = Crew::new(vec![], vec![]);
        assert!(tokio_test::block_on(crew.kickoff()).is_err());
    }
}
