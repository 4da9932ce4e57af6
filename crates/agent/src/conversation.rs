use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;

/// Text-in, text-out link to whoever is answering the questions.
///
/// `next_turn` yields `None` once the user has left; the conversation is then
/// abandoned without searching.
#[async_trait]
pub trait ConversationChannel: Send {
    async fn emit(&mut self, text: &str) -> Result<()>;
    async fn next_turn(&mut self) -> Result<Option<String>>;
}

/// Replays a fixed list of user turns and records everything emitted.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChannel {
    turns: VecDeque<String>,
    emitted: Vec<String>,
}

impl ScriptedChannel {
    pub fn new<I, T>(turns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self { turns: turns.into_iter().map(Into::into).collect(), emitted: Vec::new() }
    }

    pub fn emitted(&self) -> &[String] {
        &self.emitted
    }

    pub fn remaining_turns(&self) -> usize {
        self.turns.len()
    }
}

#[async_trait]
impl ConversationChannel for ScriptedChannel {
    async fn emit(&mut self, text: &str) -> Result<()> {
        self.emitted.push(text.to_string());
        Ok(())
    }

    async fn next_turn(&mut self) -> Result<Option<String>> {
        Ok(self.turns.pop_front())
    }
}
