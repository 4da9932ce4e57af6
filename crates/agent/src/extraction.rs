use async_trait::async_trait;
use carfinder_core::domain::criterion::Criterion;
use carfinder_core::domain::slots::CriteriaUpdate;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::llm::LlmClient;
use crate::prompts::{PromptError, PromptTemplates};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extractor response is not a JSON object: {0}")]
    Malformed(String),
    #[error("extractor call failed: {0}")]
    Llm(String),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Turns one user utterance into a partial criteria update.
///
/// `hint` names the mandatory criterion currently being asked about; a
/// negative or indifferent answer must come back as that criterion's waiver.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        hint: Option<Criterion>,
    ) -> Result<CriteriaUpdate, ExtractionError>;
}

pub struct LlmExtractionGateway<C> {
    client: C,
    prompts: PromptTemplates,
}

impl<C> LlmExtractionGateway<C>
where
    C: LlmClient,
{
    pub fn new(client: C, prompts: PromptTemplates) -> Self {
        Self { client, prompts }
    }
}

#[async_trait]
impl<C> ExtractionGateway for LlmExtractionGateway<C>
where
    C: LlmClient,
{
    async fn extract(
        &self,
        text: &str,
        hint: Option<Criterion>,
    ) -> Result<CriteriaUpdate, ExtractionError> {
        if text.trim().is_empty() {
            return Ok(hint.map(CriteriaUpdate::waive).unwrap_or_default());
        }

        let prompt = self.prompts.extraction(text, hint)?;
        let raw = self
            .client
            .complete(&prompt)
            .await
            .map_err(|error| ExtractionError::Llm(format!("{error:#}")))?;

        let update = parse_update(&raw)?;
        debug!(
            event_name = "extraction.parsed",
            hint = hint.map(Criterion::key),
            extracted = update.len(),
            "extraction response parsed"
        );
        Ok(update)
    }
}

/// Parses an extractor reply, tolerating a surrounding markdown code fence.
pub fn parse_update(raw: &str) -> Result<CriteriaUpdate, ExtractionError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|error| ExtractionError::Malformed(error.to_string()))?;

    match value {
        Value::Object(object) => Ok(CriteriaUpdate::from_json_object(&object)),
        other => Err(ExtractionError::Malformed(format!("expected object, got {other}"))),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop an info string such as `json` on the opening fence line.
    match rest.split_once('\n') {
        Some((first, body)) if !first.trim_start().starts_with('{') => body.trim(),
        _ => rest.trim(),
    }
}
