//! # Omnicart Models
//!
//! Chat model configuration and the canned model every agent talks to.
//! No request ever leaves the process: [`MockChatModel`] answers from a fixed
//! set of responses picked by keywords in the last message.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o";

const GROCERY_RESPONSE: &str = "Based on your preferences, I've created a grocery list with items from your local stores. The list includes fresh produce, dairy, and pantry staples, optimized for your dietary preferences and budget constraints.";
const TECH_RESPONSE: &str = "I've analyzed the latest tech products matching your requirements. Here are the top recommendations based on performance, price, and user reviews. I've included options from different price ranges to give you flexibility in your decision.";
const TRAVEL_RESPONSE: &str = "I've put together a travel itinerary based on your preferences. The plan includes accommodations, transportation options, and activities that match your interests and budget. I've also included some local recommendations that tourists often miss.";
const HELP_RESPONSE: &str = "I can help you with grocery shopping, tech product recommendations, travel planning, and financial advice. What would you like assistance with today?";

/// Configuration for chat model selection
///
/// The API key is accepted for parity with a hosted provider but never used,
/// logged, or serialized.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name (e.g., "gpt-4o")
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            api_key: None,
        }
    }
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build from `OMNICART_MODEL` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let model = std::env::var("OMNICART_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            ..Self::new(model)
        }
    }
}

/// A message in a chat exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    System(String),
    Human(String),
    Ai(String),
}

impl ChatMessage {
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(c) | ChatMessage::Human(c) | ChatMessage::Ai(c) => c,
        }
    }
}

/// Anything that can answer a chat exchange
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage>;
}

/// Canned chat model
#[derive(Debug, Clone)]
pub struct MockChatModel {
    config: ModelConfig,
}

impl MockChatModel {
    pub fn new(config: ModelConfig) -> Self {
        tracing::info!(model = %config.model, "Initialized mock chat model");
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn respond(query: &str) -> &'static str {
        let query = query.to_lowercase();
        let mentions = |terms: &[&str]| terms.iter().any(|t| query.contains(t));

        if query.contains("grocery") {
            tracing::debug!("Detected grocery query type");
            GROCERY_RESPONSE
        } else if mentions(&["tech", "laptop", "computer"]) {
            tracing::debug!("Detected non-grocery query type: tech");
            TECH_RESPONSE
        } else if mentions(&["travel", "vacation", "trip"]) {
            tracing::debug!("Detected non-grocery query type: travel");
            TRAVEL_RESPONSE
        } else {
            HELP_RESPONSE
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let last = messages
            .last()
            .ok_or_else(|| anyhow::anyhow!("Chat model invoked with no messages"))?;
        tracing::debug!(query = %last.content(), "Mock model processing query");
        Ok(ChatMessage::Ai(Self::respond(last.content()).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = ModelConfig::new("gpt-4o").with_api_key("sk-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("gpt-4o"));
        assert!(!json.contains("sk-secret"));
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_mock_responses_by_keyword() {
        let model = MockChatModel::new(ModelConfig::default());

        let reply = model
            .invoke(&[ChatMessage::Human("Build my Grocery list".into())])
            .await
            .unwrap();
        assert!(reply.content().contains("grocery list"));

        let reply = model
            .invoke(&[ChatMessage::Human("new computer".into())])
            .await
            .unwrap();
        assert!(reply.content().contains("tech products"));

        let reply = model
            .invoke(&[ChatMessage::Human("weekend trip".into())])
            .await
            .unwrap();
        assert!(reply.content().contains("travel itinerary"));

        let reply = model
            .invoke(&[ChatMessage::Human("buy index funds".into())])
            .await
            .unwrap();
        assert!(reply.content().starts_with("I can help you with"));
    }

    #[tokio::test]
    async fn test_only_last_message_counts() {
        let model = MockChatModel::new(ModelConfig::default());
        let reply = model
            .invoke(&[
                ChatMessage::System("You are a travel planner".into()),
                ChatMessage::Human("laptop recommendations".into()),
            ])
            .await
            .unwrap();
        assert!(matches!(reply, ChatMessage::Ai(_)));
        assert!(reply.content().contains("tech products"));
    }

    #[tokio::test]
    async fn test_empty_messages_is_an_error() {
        let model = MockChatModel::new(ModelConfig::default());
        assert!(model.invoke(&[]).await.is_err());
    }
}
