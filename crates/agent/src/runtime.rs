use std::sync::Arc;

use anyhow::{Context, Result};
use carfinder_core::config::AppConfig;
use carfinder_core::search::VehicleSearch;
use tracing::info;

use crate::conversation::ConversationChannel;
use crate::extraction::LlmExtractionGateway;
use crate::gatekeeper::LlmIntentClassifier;
use crate::llm::{HttpLlmClient, LlmClient};
use crate::orchestrator::{DialogueOutcome, OrchestratorError, SearchOrchestrator};
use crate::prompts::PromptTemplates;

type SharedLlm = Arc<dyn LlmClient>;

pub type RuntimeOrchestrator = SearchOrchestrator<
    LlmExtractionGateway<SharedLlm>,
    LlmIntentClassifier<SharedLlm>,
    Arc<dyn VehicleSearch>,
>;

/// Production wiring: one HTTP language-model client shared by the extractor
/// and the gatekeeper, plus whatever catalog the caller hands in.
pub struct AgentRuntime {
    orchestrator: RuntimeOrchestrator,
}

impl AgentRuntime {
    pub fn from_config(config: &AppConfig, catalog: Arc<dyn VehicleSearch>) -> Result<Self> {
        let client = HttpLlmClient::from_config(&config.llm)
            .context("failed to build language model client")?;
        info!(
            event_name = "agent.llm_ready",
            provider = ?config.llm.provider,
            model = %config.llm.model,
            endpoint = client.endpoint(),
            "language model client ready"
        );
        Self::with_client(Arc::new(client), catalog, config)
    }

    pub fn with_client(
        client: SharedLlm,
        catalog: Arc<dyn VehicleSearch>,
        config: &AppConfig,
    ) -> Result<Self> {
        let prompts = PromptTemplates::new().context("failed to load prompt templates")?;
        let orchestrator = SearchOrchestrator::new(
            LlmExtractionGateway::new(Arc::clone(&client), prompts.clone()),
            LlmIntentClassifier::new(client, prompts),
            catalog,
            config.search.clone(),
        );
        Ok(Self { orchestrator })
    }

    pub fn orchestrator(&self) -> &RuntimeOrchestrator {
        &self.orchestrator
    }

    /// Runs one conversation under a fresh correlation id.
    pub async fn run_conversation<C>(
        &self,
        channel: &mut C,
    ) -> Result<(String, DialogueOutcome), (String, OrchestratorError)>
    where
        C: ConversationChannel + ?Sized,
    {
        let conversation_id = uuid::Uuid::new_v4().to_string();
        match self.orchestrator.run_dialogue(channel, &conversation_id).await {
            Ok(outcome) => Ok((conversation_id, outcome)),
            Err(error) => Err((conversation_id, error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use carfinder_core::config::AppConfig;
    use carfinder_core::domain::filter::SearchFilter;
    use carfinder_core::domain::vehicle::VehicleRecord;
    use carfinder_core::search::{SearchError, VehicleSearch};

    use super::AgentRuntime;
    use crate::conversation::ScriptedChannel;
    use crate::llm::LlmClient;
    use crate::orchestrator::DialogueOutcome;

    /// Answers the gatekeeper with PROCEED and every extraction with `{}`.
    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.starts_with("You are a strict gatekeeper") {
                Ok("PROCEED".to_string())
            } else {
                Ok("{}".to_string())
            }
        }
    }

    struct EmptyCatalog;

    #[async_trait]
    impl VehicleSearch for EmptyCatalog {
        async fn search(
            &self,
            _filter: &SearchFilter,
            _limit: u32,
        ) -> Result<Vec<VehicleRecord>, SearchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn blank_answers_and_proceed_reach_a_no_match_outcome() {
        let config = AppConfig::default();
        let runtime =
            AgentRuntime::with_client(Arc::new(CannedLlm), Arc::new(EmptyCatalog), &config)
                .expect("runtime");
        let mut channel = ScriptedChannel::new(["", "", "", "", "", "search"]);

        let (conversation_id, outcome) =
            runtime.run_conversation(&mut channel).await.expect("dialogue");

        assert_eq!(conversation_id.len(), 36);
        let DialogueOutcome::Completed { report, .. } = outcome else {
            panic!("expected completion");
        };
        assert!(report.is_no_match());
        assert_eq!(report.attempts.len(), 3);
    }
}
