//! Markdown reports of a conversation.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use webscout_core::conversation::Message;

/// Run settings printed at the top of a report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportMetadata {
    /// The model id.
    pub model: String,
    /// Whether MCP tools were provisioned.
    pub used_mcp: bool,
    /// The sampling temperature.
    pub temperature: f32,
    /// The generation cap.
    pub max_tokens: u32,
}

/// Renders a report. The output depends only on the arguments.
pub fn render<'a, I>(
    messages: I,
    final_reply: &str,
    meta: &ReportMetadata,
) -> String
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut out = String::new();
    // Writing into a `String` never fails.
    let _ = write_markdown(&mut out, messages, final_reply, meta);
    out
}

fn write_markdown<'a, I>(
    out: &mut String,
    messages: I,
    final_reply: &str,
    meta: &ReportMetadata,
) -> std::fmt::Result
where
    I: IntoIterator<Item = &'a Message>,
{
    writeln!(out, "# Agent Report")?;
    writeln!(out)?;
    writeln!(out, "## Metadata")?;
    writeln!(out)?;
    writeln!(out, "- model: {}", meta.model)?;
    writeln!(out, "- used_mcp: {}", meta.used_mcp)?;
    writeln!(out, "- temperature: {:?}", meta.temperature)?;
    writeln!(out, "- max_tokens: {}", meta.max_tokens)?;
    writeln!(out)?;
    writeln!(out, "## Conversation")?;
    writeln!(out)?;
    for message in messages {
        writeln!(out, "{}: {}", message.role, message.content)?;
        writeln!(out)?;
    }
    writeln!(out, "## Final Answer")?;
    writeln!(out)?;
    writeln!(out, "{final_reply}")
}

/// Renders a report and writes it to `out_path`, replacing any existing file.
///
/// Returns the path written to. The parent directory must exist.
pub async fn write_report<'a, I>(
    messages: I,
    final_reply: &str,
    out_path: &Path,
    meta: &ReportMetadata,
) -> io::Result<PathBuf>
where
    I: IntoIterator<Item = &'a Message>,
{
    let markdown = render(messages, final_reply, meta);
    tokio::fs::write(out_path, markdown).await?;
    debug!("report written to {}", out_path.display());
    Ok(out_path.to_path_buf())
}
