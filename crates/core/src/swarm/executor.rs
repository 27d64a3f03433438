//! # Shopping Executor
//!
//! Assembles the crew for a query's domain, runs it, and turns the output
//! into a shopping list. "Parsing" the crew output means picking the canned
//! catalog table for the domain.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::catalog::{self, ShoppingItem};
use crate::models::ModelConfig;
use crate::query::{classify, search_url, QueryType};
use crate::skills::{
    AgentFactory, AgentRole, Crew, CrewOutput, CrewProgress, TaskFactory, UserPreferences,
};

/// Default pause between simulated site visits during execution
pub const DEFAULT_SITE_DELAY: Duration = Duration::from_millis(500);

const TECH_REVIEW_SITES: &[&str] = &["BestBuy", "Amazon", "Newegg", "MicroCenter"];
const TRAVEL_REVIEW_SITES: &[&str] = &["Expedia", "Booking.com", "Kayak", "Airbnb"];
const FINANCE_REVIEW_SITES: &[&str] = &["Yahoo Finance", "Bloomberg", "MarketWatch", "Morningstar"];

/// Progress reported while the executor works
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorProgress {
    AgentStarted(AgentRole),
    AgentFinished(AgentRole),
    SiteVisited {
        agent: AgentRole,
        site: String,
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Error,
}

/// What the execution step counted, keyed by domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tally {
    ProductsFound(usize),
    OptionsFound(usize),
    InvestmentsAnalyzed(usize),
    ItemsPurchased(usize),
}

impl Tally {
    pub fn count(&self) -> usize {
        match *self {
            Tally::ProductsFound(n)
            | Tally::OptionsFound(n)
            | Tally::InvestmentsAnalyzed(n)
            | Tally::ItemsPurchased(n) => n,
        }
    }
}

/// Result of the execution step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub status: ReportStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<QueryType>,
    #[serde(flatten)]
    pub tally: Option<Tally>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total: Option<f64>,
}

impl ExecutionReport {
    fn error(message: &str) -> Self {
        Self {
            status: ReportStatus::Error,
            message: message.to_string(),
            query_type: None,
            tally: None,
            estimated_total: None,
        }
    }

    fn success(kind: QueryType, message: &str, tally: Tally, list: &[ShoppingItem]) -> Self {
        Self {
            status: ReportStatus::Success,
            message: message.to_string(),
            query_type: Some(kind),
            tally: Some(tally),
            estimated_total: Some(catalog::total_cost(list)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }
}

/// Output of a full executor run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorOutput {
    pub shopping_list: Vec<ShoppingItem>,
    pub result: ExecutionReport,
}

/// Drives crews for each shopping domain
pub struct ShoppingExecutor {
    agents: AgentFactory,
    tasks: TaskFactory,
    preferences: UserPreferences,
    site_delay: Duration,
    verbose: bool,
    progress_tx: Option<mpsc::Sender<ExecutorProgress>>,
}

impl ShoppingExecutor {
    pub fn new(config: ModelConfig) -> Self {
        Self::with_agents(AgentFactory::new(config))
    }

    pub fn with_agents(agents: AgentFactory) -> Self {
        Self {
            agents,
            tasks: TaskFactory::new(),
            preferences: UserPreferences::default(),
            site_delay: DEFAULT_SITE_DELAY,
            verbose: false,
            progress_tx: None,
        }
    }

    pub fn with_site_delay(mut self, delay: Duration) -> Self {
        self.site_delay = delay;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Report progress on this channel
    pub fn with_progress_channel(mut self, tx: mpsc::Sender<ExecutorProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn set_progress_channel(&mut self, tx: Option<mpsc::Sender<ExecutorProgress>>) {
        self.progress_tx = tx;
    }

    /// Agents and tasks are built on demand, so there is nothing to warm up.
    pub async fn initialize(&self) -> Result<()> {
        tracing::debug!("Initializing shopping executor");
        Ok(())
    }

    pub fn set_user_preferences(&mut self, preferences: UserPreferences) {
        self.preferences.merge(preferences);
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    async fn report(&self, progress: ExecutorProgress) {
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(progress).await;
        }
    }

    /// Kick off `crew`, forwarding each task's start and finish as agent
    /// progress while it runs.
    async fn run_crew(&self, crew: Crew) -> Result<CrewOutput> {
        let crew = crew.verbose(self.verbose);
        let (tx, mut rx) = mpsc::channel(8);
        let forward = async {
            while let Some(progress) = rx.recv().await {
                let progress = match progress {
                    CrewProgress::TaskStarted(role) => ExecutorProgress::AgentStarted(role),
                    CrewProgress::TaskFinished(role) => ExecutorProgress::AgentFinished(role),
                };
                self.report(progress).await;
            }
        };
        let (output, ()) = tokio::join!(crew.kickoff_with_progress(tx), forward);
        output
    }

    /// Build a shopping list from the stored preferences.
    ///
    /// Returns an empty list when there is no query.
    pub async fn generate_shopping_list(&self) -> Result<Vec<ShoppingItem>> {
        let query = match self.preferences.user_query.as_deref() {
            Some(q) if !q.is_empty() => q.to_string(),
            _ => return Ok(Vec::new()),
        };

        let kind = classify(&query);
        tracing::info!(query_type = %kind, "Generating shopping list");

        let crew = match kind {
            QueryType::Grocery => Crew::new(
                vec![
                    self.agents.inventory_agent(),
                    self.agents.dietary_agent(),
                    self.agents.budget_agent(),
                    self.agents.price_comparison_agent(),
                ],
                vec![
                    self.tasks.inventory_analysis_task(&self.preferences),
                    self.tasks.dietary_filtering_task(&self.preferences),
                    self.tasks.budget_optimization_task(&self.preferences),
                    self.tasks.price_comparison_task(&self.preferences),
                ],
            ),
            QueryType::Tech => Crew::new(
                vec![self.agents.tech_product_agent()],
                vec![self.tasks.tech_product_research_task(&query)],
            ),
            QueryType::Travel => Crew::new(
                vec![self.agents.travel_agent()],
                vec![self.tasks.travel_planning_task(&query)],
            ),
            QueryType::Finance => Crew::new(
                vec![self.agents.finance_agent()],
                vec![self.tasks.financial_advisory_task(&query)],
            ),
        };

        let output = self
            .run_crew(crew)
            .await
            .with_context(|| format!("{} crew failed", kind))?;
        Ok(Self::parse_crew_output(kind, &query, &output))
    }

    fn parse_crew_output(kind: QueryType, query: &str, output: &CrewOutput) -> Vec<ShoppingItem> {
        tracing::debug!(
            query_type = %kind,
            raw_len = output.raw.len(),
            "Mapping crew output to catalog"
        );
        catalog::items_for(kind, query)
    }

    /// Simulate acting on a shopping list.
    ///
    /// The domain is inferred from the first item's category.
    pub async fn execute_shopping(&self, list: &[ShoppingItem]) -> Result<ExecutionReport> {
        let Some(first) = list.first() else {
            return Ok(ExecutionReport::error("Shopping list is empty"));
        };
        let kind = QueryType::from_category(&first.category);
        let query = self.preferences.user_query.clone().unwrap_or_default();

        let (sites, message, tally) = match kind {
            QueryType::Tech => (
                TECH_REVIEW_SITES,
                "Tech product comparison completed successfully",
                Tally::ProductsFound(list.len()),
            ),
            QueryType::Travel => (
                TRAVEL_REVIEW_SITES,
                "Travel search completed successfully",
                Tally::OptionsFound(list.len()),
            ),
            QueryType::Finance => (
                FINANCE_REVIEW_SITES,
                "Financial analysis completed successfully",
                Tally::InvestmentsAnalyzed(list.len()),
            ),
            QueryType::Grocery => {
                let crew = Crew::new(
                    vec![self.agents.browser_agent()],
                    vec![self.tasks.shopping_execution_task(&self.preferences, list)],
                );
                self.run_crew(crew).await.context("Browser crew failed")?;
                return Ok(ExecutionReport::success(
                    kind,
                    "Shopping simulation completed successfully",
                    Tally::ItemsPurchased(list.len()),
                    list,
                ));
            }
        };

        tracing::info!(query_type = %kind, "Executing {} research", kind);
        self.report(ExecutorProgress::AgentStarted(AgentRole::Browser))
            .await;
        for site in sites {
            tracing::debug!("Browser Agent visiting {}", site);
            self.report(ExecutorProgress::SiteVisited {
                agent: AgentRole::Browser,
                site: site.to_string(),
                url: search_url(site, &query),
            })
            .await;
            tokio::time::sleep(self.site_delay).await;
        }
        self.report(ExecutorProgress::AgentFinished(AgentRole::Browser))
            .await;

        Ok(ExecutionReport::success(kind, message, tally, list))
    }

    /// Merge preferences, generate a list, then execute it
    pub async fn run(&mut self, preferences: Option<UserPreferences>) -> Result<ExecutorOutput> {
        self.initialize().await?;
        if let Some(preferences) = preferences {
            self.set_user_preferences(preferences);
        }
        let shopping_list = self.generate_shopping_list().await?;
        let result = self.execute_shopping(&shopping_list).await?;
        Ok(ExecutorOutput {
            shopping_list,
            result,
        })
    }
}
