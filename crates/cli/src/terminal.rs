use anyhow::{Context, Result};
use async_trait::async_trait;
use carfinder_agent::ConversationChannel;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "sair"];
const PROMPT: &str = "> ";

pub fn is_exit_utterance(text: &str) -> bool {
    let text = text.trim();
    EXIT_WORDS.iter().any(|word| word.eq_ignore_ascii_case(text))
}

/// Line-oriented channel over a reader and a writer, normally stdin/stdout.
pub struct TerminalChannel<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl TerminalChannel<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalChannel<R, W> {
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<R, W> TerminalChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { lines: reader.lines(), writer }
    }

    /// Shows the prompt and reads one trimmed line; `None` at end of input.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        self.writer.write_all(PROMPT.as_bytes()).await.context("failed to write prompt")?;
        self.writer.flush().await.context("failed to flush terminal")?;
        let line = self.lines.next_line().await.context("failed to read from terminal")?;
        Ok(line.map(|line| line.trim().to_string()))
    }
}

#[async_trait]
impl<R, W> ConversationChannel for TerminalChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await.context("failed to write to terminal")?;
        self.writer.write_all(b"\n").await.context("failed to write to terminal")?;
        self.writer.flush().await.context("failed to flush terminal")
    }

    async fn next_turn(&mut self) -> Result<Option<String>> {
        match self.read_line().await? {
            Some(text) if is_exit_utterance(&text) => Ok(None),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use carfinder_agent::ConversationChannel;

    use super::{is_exit_utterance, TerminalChannel};

    #[test]
    fn exit_words_ignore_case_and_padding() {
        assert!(is_exit_utterance("exit"));
        assert!(is_exit_utterance("  QUIT "));
        assert!(is_exit_utterance("Sair"));
        assert!(!is_exit_utterance("exit please"));
        assert!(!is_exit_utterance(""));
    }

    #[tokio::test]
    async fn turns_are_trimmed_and_exit_ends_the_channel() {
        let input: &[u8] = b"  honda civic \n\nquit\nnever read\n";
        let mut channel = TerminalChannel::new(input, Vec::new());

        channel.emit("Which brand?").await.expect("emit");
        assert_eq!(channel.next_turn().await.expect("turn").as_deref(), Some("honda civic"));
        assert_eq!(channel.next_turn().await.expect("turn").as_deref(), Some(""));
        assert_eq!(channel.next_turn().await.expect("turn"), None);

        let written = String::from_utf8(channel.writer().clone()).expect("utf8");
        assert_eq!(written, "Which brand?\n> > > ");
    }

    #[tokio::test]
    async fn end_of_input_ends_the_channel() {
        let input: &[u8] = b"";
        let mut channel = TerminalChannel::new(input, Vec::new());
        assert_eq!(channel.next_turn().await.expect("turn"), None);
    }
}
