//! Command line flags and environment resolution.

use std::fmt::{self, Debug, Display};
use std::path::PathBuf;

use clap::Parser;
use webscout_anthropic_model::{
    AnthropicConfig, AnthropicConfigBuilder, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

use crate::report::ReportMetadata;
use crate::tools::McpServerConfig;

/// Environment variable holding the Anthropic API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Environment variable overriding the Anthropic API base URL.
pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// Credentials forwarded to the MCP server. Missing ones only warn.
pub const MCP_CREDENTIAL_VARS: [&str; 3] =
    ["API_TOKEN", "BROWSER_AUTH", "WEB_UNLOCKER_ZONE"];

/// Chat with Claude, optionally backed by web scraping tools from an MCP
/// server.
#[derive(Clone, Debug, Parser)]
#[command(name = "webscout", version, about)]
pub struct Args {
    /// Model id to use.
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature, between 0 and 2.
    #[arg(long, default_value_t = 0.0, value_parser = parse_temperature)]
    pub temperature: f32,

    /// Maximum number of tokens to generate per reply.
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_TOKENS,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub max_tokens: u32,

    /// Run without the MCP server and its tools.
    #[arg(long)]
    pub no_mcp: bool,

    /// Ask a single question and exit. A blank question starts the chat
    /// instead.
    #[arg(short, long)]
    pub question: Option<String>,

    /// Write the conversation to a Markdown file after every reply.
    #[arg(long, value_name = "PATH")]
    pub save_report: Option<PathBuf>,
}

fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|err| format!("{err}"))?;
    if !(0.0..=2.0).contains(&value) {
        return Err(format!("{value} is not in 0.0..=2.0"));
    }
    Ok(value)
}

/// Errors that stop the program before anything else happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API key is not set, or set to an empty string.
    #[error("Missing {API_KEY_VAR} in environment.")]
    MissingApiKey,
}

/// A credential the MCP server expects but the environment lacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissingCredential(pub &'static str);

impl Display for MissingCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env var {} is not set (MCP may fail).", self.0)
    }
}

/// The outcome of [`RunConfig::resolve`].
#[derive(Debug)]
pub struct Resolved {
    /// The resolved configuration.
    pub config: RunConfig,
    /// Credentials to warn about, in a fixed order.
    pub warnings: Vec<MissingCredential>,
}

/// Everything a run needs, resolved once at startup.
#[derive(Clone)]
pub struct RunConfig {
    model: String,
    temperature: f32,
    max_tokens: u32,
    use_mcp: bool,
    question: Option<String>,
    report_path: Option<PathBuf>,
    api_key: String,
    base_url: Option<String>,
    mcp_env: Vec<(String, String)>,
}

impl RunConfig {
    /// Combines the parsed flags with the environment.
    ///
    /// `env` looks up a variable by name; empty values count as missing.
    pub fn resolve<F>(args: Args, env: F) -> Result<Resolved, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;
        let base_url = lookup(BASE_URL_VAR);

        let use_mcp = !args.no_mcp;
        let mut warnings = vec![];
        let mut mcp_env = vec![];
        if use_mcp {
            for name in MCP_CREDENTIAL_VARS {
                match lookup(name) {
                    Some(value) => mcp_env.push((name.to_owned(), value)),
                    None => warnings.push(MissingCredential(name)),
                }
            }
        }

        let config = RunConfig {
            model: args.model,
            temperature: args.temperature,
            max_tokens: args.max_tokens,
            use_mcp,
            // A blank question means interactive mode.
            question: args.question.filter(|q| !q.trim().is_empty()),
            report_path: args.save_report,
            api_key,
            base_url,
            mcp_env,
        };
        Ok(Resolved { config, warnings })
    }

    /// Returns the model id.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns whether MCP tools are provisioned.
    #[inline]
    pub fn use_mcp(&self) -> bool {
        self.use_mcp
    }

    /// Returns the one-shot question, if any.
    #[inline]
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// Returns where reports are written, if anywhere.
    #[inline]
    pub fn report_path(&self) -> Option<&PathBuf> {
        self.report_path.as_ref()
    }

    /// Builds the provider configuration.
    pub fn anthropic_config(&self) -> AnthropicConfig {
        let mut builder = AnthropicConfigBuilder::with_api_key(&self.api_key)
            .with_model(&self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }

    /// Returns the MCP server to launch, or `None` when tools are disabled.
    pub fn mcp_server(&self) -> Option<McpServerConfig> {
        self.use_mcp
            .then(|| McpServerConfig::bright_data(self.mcp_env.clone()))
    }

    /// Returns the metadata recorded in reports.
    pub fn report_metadata(&self) -> ReportMetadata {
        ReportMetadata {
            model: self.model.clone(),
            used_mcp: self.use_mcp,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mcp_env: Vec<_> = self
            .mcp_env
            .iter()
            .map(|(name, _)| (name.as_str(), "<redacted>"))
            .collect();
        f.debug_struct("RunConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("use_mcp", &self.use_mcp)
            .field("question", &self.question)
            .field("report_path", &self.report_path)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("mcp_env", &mcp_env)
            .finish()
    }
}
