
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use webscout_core::conversation::{Conversation, Message};
use webscout_core::tool::Tool;
use webscout_core::{Agent, AgentBuilder};
use webscout_model::ModelProvider;

use crate::report::{self, ReportMetadata};

const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

type Hook = Box<dyn Fn() + Send + Sync>;

struct ReportTarget {
    path: PathBuf,
    meta: ReportMetadata,
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    on_thinking: Option<Hook>,
    on_idle: Option<Hook>,
    report: Option<ReportTarget>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self {
            agent_builder: AgentBuilder::with_model_provider(provider),
            on_thinking: None,
            on_idle: None,
            report: None,
        }
    }

    /// Registers tools the agent may call.
    #[inline]
    pub fn with_tools<T, I>(mut self, tools: I) -> Self
    where
        T: Tool,
        I: IntoIterator<Item = T>,
    {
        for tool in tools {
            self.agent_builder = self.agent_builder.with_tool(tool);
        }
        self
    }

    /// Writes a report to `path` after every reply.
    #[inline]
    pub fn save_report_to(
        mut self,
        path: impl Into<PathBuf>,
        meta: ReportMetadata,
    ) -> Self {
        self.report = Some(ReportTarget {
            path: path.into(),
            meta,
        });
        self
    }

    /// Attaches a callback to be invoked when the agent starts working on a
    /// question.
    #[inline]
    pub fn on_thinking(
        mut self,
        on_thinking: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_thinking = Some(Box::new(on_thinking));
        self
    }

    /// Attaches a callback to be invoked with the tool name before the agent
    /// runs a tool.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_tool_call(on_tool_call);
        self
    }

    /// Attaches a callback to be invoked when the agent is done with a
    /// question, whether it succeeded or not.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            agent: self.agent_builder.build(),
            conversation: Conversation::default(),
            on_thinking: self.on_thinking,
            on_idle: self.on_idle,
            report: self.report,
        }
    }
}

/// A chat session, like a terminal window that shows the exchange so far.
///
/// The session owns the conversation. Only answered questions are recorded,
/// each together with the agent's reply.
pub struct Session {
    agent: Agent,
    conversation: Conversation,
    on_thinking: Option<Hook>,
    on_idle: Option<Hook>,
    report: Option<ReportTarget>,
}

impl Session {
    /// Returns the conversation recorded so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Answers a single question.
    ///
    /// Prints the reply, then saves the report if one is configured. Any
    /// failure is returned.
    pub async fn run_one_shot<W: Write>(
        &mut self,
        question: &str,
        out: &mut W,
    ) -> Result<()> {
        let question = Message::user(question.trim());
        let reply = self.ask(&question).await?;
        writeln!(out, "Agent: {}", reply.content)?;

        if let Some(path) = self.save_report(&question, &reply).await? {
            writeln!(out, "Saved report to: {}", path.display())?;
        }
        self.record(question, reply);
        Ok(())
    }

    /// Reads questions line by line until `exit`, `quit` or the end of
    /// input.
    ///
    /// A failed question is reported on stderr and dropped, the loop goes on.
    /// So does a failed report write. Only I/O errors on `input` or `out`
    /// end the loop early.
    pub async fn run_interactive<R, W>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Type 'exit' or 'quit' to end the chat.")?;
        writeln!(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "You: ")?;
            out.flush()?;

            let Some(line) =
                lines.next_line().await.context("failed to read input")?
            else {
                debug!("end of input");
                break;
            };
            let line = line.trim();
            if is_exit_command(line) {
                break;
            }
            if line.is_empty() {
                continue;
            }

            let question = Message::user(line);
            let reply = match self.ask(&question).await {
                Ok(reply) => reply,
                Err(err) => {
                    print_error(&err);
                    continue;
                }
            };
            writeln!(out, "Agent: {}", reply.content)?;

            match self.save_report(&question, &reply).await {
                Ok(Some(path)) => {
                    writeln!(out, "Saved report to: {}", path.display())?;
                }
                Ok(None) => {}
                Err(err) => print_error(&err),
            }
            self.record(question, reply);
        }
        Ok(())
    }

    async fn ask(&self, question: &Message) -> Result<Message> {
        if let Some(on_thinking) = &self.on_thinking {
            on_thinking();
        }
        let reply = self
            .agent
            .ask(self.conversation.iter().chain([question]))
            .await;
        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
        Ok(reply?)
    }

    // The report shows the history the question was asked with, and the
    // reply as the final answer.
    async fn save_report(
        &self,
        question: &Message,
        reply: &Message,
    ) -> Result<Option<PathBuf>> {
        let Some(report) = &self.report else {
            return Ok(None);
        };
        let path = report::write_report(
            self.conversation.iter().chain([question]),
            &reply.content,
            &report.path,
            &report.meta,
        )
        .await
        .with_context(|| {
            format!("failed to save report to {}", report.path.display())
        })?;
        Ok(Some(path))
    }

    #[inline]
    fn record(&mut self, question: Message, reply: Message) {
        self.conversation.push(question);
        self.conversation.push(reply);
    }
}

/// Returns `true` if the line asks to end the chat.
#[inline]
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| line.eq_ignore_ascii_case(command))
}

fn print_error(err: &anyhow::Error) {
    eprintln!(
        "{} {err:#}",
        "error:".if_supports_color(Stream::Stderr, |text| text.red())
    );
}
