//! Conversation side of the car finder.
//!
//! The language model is only a translator here: it turns one utterance
//! into a partial criteria update, or into a proceed/ask token. Which question
//! comes next, when questioning stops and how a search is widened are all
//! decided by deterministic code in `carfinder-core` and [`orchestrator`].
//!
//! - [`llm`]: HTTP completion client for OpenAI, Anthropic or Ollama
//! - [`prompts`]: the two fixed prompt templates
//! - [`extraction`] and [`gatekeeper`]: the two model-backed gateways
//! - [`conversation`]: text channel abstraction
//! - [`orchestrator`]: turn loop plus widen-and-retry search
//! - [`runtime`]: production wiring from [`carfinder_core::config::AppConfig`]

pub mod conversation;
pub mod extraction;
pub mod gatekeeper;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod runtime;

pub use conversation::{ConversationChannel, ScriptedChannel};
pub use orchestrator::{
    DialogueOutcome, OrchestratorError, SearchAttempt, SearchOrchestrator, SearchReport,
};
pub use runtime::AgentRuntime;
