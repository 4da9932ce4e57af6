use async_trait::async_trait;
use carfinder_core::dialogue::SlotSequencer;
use carfinder_core::domain::slots::SlotState;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::llm::LlmClient;
use crate::prompts::{PromptError, PromptTemplates};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentToken {
    Proceed,
    Ask,
}

impl IntentToken {
    /// Anything other than an exact `PROCEED` or `ASK` is treated as `ASK`.
    pub fn parse_lenient(raw: &str) -> Self {
        let token = match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::String(text)) => text,
            Ok(Value::Object(object)) => object
                .values()
                .find_map(|value| value.as_str().map(str::to_string))
                .unwrap_or_default(),
            _ => raw.trim().trim_matches('"').to_string(),
        };

        match token.trim().to_ascii_uppercase().as_str() {
            "PROCEED" => Self::Proceed,
            _ => Self::Ask,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("intent classifier call failed: {0}")]
    Llm(String),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<IntentToken, ClassificationError>;
}

pub struct LlmIntentClassifier<C> {
    client: C,
    prompts: PromptTemplates,
}

impl<C> LlmIntentClassifier<C>
where
    C: LlmClient,
{
    pub fn new(client: C, prompts: PromptTemplates) -> Self {
        Self { client, prompts }
    }
}

#[async_trait]
impl<C> IntentClassifier for LlmIntentClassifier<C>
where
    C: LlmClient,
{
    async fn classify(&self, text: &str) -> Result<IntentToken, ClassificationError> {
        let prompt = self.prompts.gatekeeper(text)?;
        let raw = self
            .client
            .complete(&prompt)
            .await
            .map_err(|error| ClassificationError::Llm(format!("{error:#}")))?;
        Ok(IntentToken::parse_lenient(&raw))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    KeepAsking,
}

/// Decides whether a turn ends questioning.
///
/// The classifier is never consulted while a mandatory criterion is unset,
/// and every classifier fault resolves to [`GateDecision::KeepAsking`].
pub struct ProceedGatekeeper<I> {
    classifier: I,
    sequencer: SlotSequencer,
}

impl<I> ProceedGatekeeper<I>
where
    I: IntentClassifier,
{
    pub fn new(classifier: I) -> Self {
        Self { classifier, sequencer: SlotSequencer::new() }
    }

    pub fn classifier(&self) -> &I {
        &self.classifier
    }

    pub async fn decide(&self, state: &SlotState, text: &str) -> GateDecision {
        if let Some(gap) = self.sequencer.next_mandatory_gap(state) {
            debug!(event_name = "gate.blocked", criterion = gap.key(), "mandatory gap open");
            return GateDecision::KeepAsking;
        }

        match self.classifier.classify(text).await {
            Ok(IntentToken::Proceed) => GateDecision::Proceed,
            Ok(IntentToken::Ask) => GateDecision::KeepAsking,
            Err(error) => {
                debug!(
                    event_name = "gate.classifier_failed",
                    error = %error,
                    "treating classifier failure as ask"
                );
                GateDecision::KeepAsking
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use carfinder_core::domain::criterion::{Criterion, MANDATORY_ORDER};
    use carfinder_core::domain::slots::{CriterionValue, SlotState};

    use super::{
        ClassificationError, GateDecision, IntentClassifier, IntentToken, ProceedGatekeeper,
    };

    struct AlwaysProceed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IntentClassifier for AlwaysProceed {
        async fn classify(&self, _text: &str) -> Result<IntentToken, ClassificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(IntentToken::Proceed)
        }
    }

    struct Broken;

    #[async_trait]
    impl IntentClassifier for Broken {
        async fn classify(&self, _text: &str) -> Result<IntentToken, ClassificationError> {
            Err(ClassificationError::Llm("deadline exceeded".to_string()))
        }
    }

    fn resolved() -> SlotState {
        let mut state = SlotState::new();
        for criterion in MANDATORY_ORDER {
            state.waive(criterion);
        }
        state
    }

    #[tokio::test]
    async fn blocks_while_any_mandatory_criterion_is_unset() {
        let gate = ProceedGatekeeper::new(AlwaysProceed { calls: AtomicUsize::new(0) });

        let mut state = SlotState::new();
        for criterion in MANDATORY_ORDER {
            for text in ["search", "go", "that's it", ""] {
                assert_eq!(gate.decide(&state, text).await, GateDecision::KeepAsking);
            }
            state.apply(criterion, CriterionValue::waiver(criterion.kind()).expect("waivable"));
        }
        assert_eq!(gate.classifier.calls.load(Ordering::SeqCst), 0);

        assert_eq!(gate.decide(&state, "search").await, GateDecision::Proceed);
        assert_eq!(gate.classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn optional_criteria_do_not_gate() {
        let gate = ProceedGatekeeper::new(AlwaysProceed { calls: AtomicUsize::new(0) });
        let mut state = resolved();
        state.apply(Criterion::IsArmored, CriterionValue::Flag(true));
        assert_eq!(gate.decide(&state, "go").await, GateDecision::Proceed);
    }

    #[tokio::test]
    async fn classifier_failure_keeps_asking() {
        let gate = ProceedGatekeeper::new(Broken);
        assert_eq!(gate.decide(&resolved(), "search").await, GateDecision::KeepAsking);
    }

    #[test]
    fn lenient_parsing_defaults_to_ask() {
        assert_eq!(IntentToken::parse_lenient("PROCEED"), IntentToken::Proceed);
        assert_eq!(IntentToken::parse_lenient(" proceed\n"), IntentToken::Proceed);
        assert_eq!(IntentToken::parse_lenient("\"PROCEED\""), IntentToken::Proceed);
        assert_eq!(IntentToken::parse_lenient(r#"{"decision": "PROCEED"}"#), IntentToken::Proceed);
        assert_eq!(IntentToken::parse_lenient("ASK"), IntentToken::Ask);
        assert_eq!(IntentToken::parse_lenient("PROCEED now"), IntentToken::Ask);
        assert_eq!(IntentToken::parse_lenient("yes"), IntentToken::Ask);
        assert_eq!(IntentToken::parse_lenient(""), IntentToken::Ask);
    }
}
