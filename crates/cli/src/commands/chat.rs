use std::sync::Arc;

use anyhow::Result;
use carfinder_agent::{AgentRuntime, ConversationChannel, DialogueOutcome, OrchestratorError};
use carfinder_core::errors::ApplicationError;
use carfinder_core::search::VehicleSearch;
use carfinder_db::{connect_with_config, migrations, SqlVehicleRepository};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{info, warn};

use crate::commands::{prepare, CommandResult, StepFailure};
use crate::presentation::{render_listing, FAREWELL, INTRO, NEW_SEARCH_PROMPT, NO_MATCH};
use crate::terminal::TerminalChannel;

const RESTART_WORDS: [&str; 4] = ["new", "again", "y", "yes"];

/// What happened across the conversations of one chat session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatSummary {
    pub completed: usize,
    pub failed: usize,
    pub abandoned: bool,
}

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("chat") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let catalog: Arc<dyn VehicleSearch> = Arc::new(SqlVehicleRepository::new(pool.clone()));
        let agent = AgentRuntime::from_config(&config, catalog)
            .map_err(|error| ("agent_init", format!("{error:#}"), 6u8))?;

        let mut channel = TerminalChannel::stdio();
        let summary = chat_session(&agent, &mut channel)
            .await
            .map_err(|error| ("terminal_io", format!("{error:#}"), 7u8))?;

        pool.close().await;
        Ok::<ChatSummary, StepFailure>(summary)
    });

    match result {
        Ok(summary) => {
            info!(
                event_name = "chat.session_closed",
                completed = summary.completed,
                failed = summary.failed,
                abandoned = summary.abandoned
            );
            CommandResult::text(String::new())
        }
        Err(failure) => CommandResult::from_step("chat", failure),
    }
}

/// Runs conversations until the user leaves. Every conversation starts from
/// empty criteria; only terminal I/O failures end the session with an error.
pub async fn chat_session<R, W>(
    agent: &AgentRuntime,
    channel: &mut TerminalChannel<R, W>,
) -> Result<ChatSummary>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut summary = ChatSummary::default();
    channel.emit(INTRO).await?;

    loop {
        match agent.run_conversation(channel).await {
            Ok((_, DialogueOutcome::Abandoned { .. })) => {
                summary.abandoned = true;
                channel.emit(FAREWELL).await?;
                return Ok(summary);
            }
            Ok((_, DialogueOutcome::Completed { report, .. })) => {
                summary.completed += 1;
                if report.is_no_match() {
                    channel.emit(NO_MATCH).await?;
                } else {
                    channel.emit(&render_listing(&report.records)).await?;
                }
            }
            Err((_, OrchestratorError::Channel(error))) => return Err(error),
            Err((conversation_id, error)) => {
                summary.failed += 1;
                let interface = ApplicationError::from(error).into_interface(conversation_id);
                warn!(
                    event_name = "chat.search_failed",
                    conversation_id = interface.correlation_id(),
                    error = %interface,
                    "conversation ended without results"
                );
                channel
                    .emit(&format!(
                        "Error: {} (reference {})",
                        interface.user_message(),
                        interface.correlation_id()
                    ))
                    .await?;
            }
        }

        channel.emit(NEW_SEARCH_PROMPT).await?;
        match channel.read_line().await? {
            Some(answer) if wants_restart(&answer) => continue,
            _ => {
                channel.emit(FAREWELL).await?;
                return Ok(summary);
            }
        }
    }
}

fn wants_restart(answer: &str) -> bool {
    RESTART_WORDS.iter().any(|word| word.eq_ignore_ascii_case(answer.trim()))
}
