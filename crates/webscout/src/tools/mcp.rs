use anyhow::{Context, Result};
use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, Content, JsonObject, RawContent};
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use serde_json::Value;
use tokio::process::Command;
use webscout_core::tool::{Error as ToolError, Tool, ToolResult};

type McpService = RunningService<RoleClient, ()>;

/// How to launch an MCP server over stdio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct McpServerConfig {
    /// The executable to run.
    pub command: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,
}

impl McpServerConfig {
    /// The Bright Data scraping server, launched through `npx`.
    pub fn bright_data(env: Vec<(String, String)>) -> Self {
        Self {
            command: "npx".to_owned(),
            args: vec!["@brightdata/mcp".to_owned()],
            env,
        }
    }
}

/// A live session with an MCP server child process.
pub struct McpConnection {
    command: String,
    service: McpService,
}

impl McpConnection {
    /// Spawns the server and performs the protocol handshake.
    pub async fn connect(config: &McpServerConfig) -> Result<Self> {
        let transport =
            TokioChildProcess::new(Command::new(&config.command).configure(
                |cmd| {
                    cmd.args(&config.args);
                    cmd.envs(config.env.iter().map(|(k, v)| (k, v)));
                },
            ))
            .with_context(|| {
                format!("failed to spawn MCP server `{}`", config.command)
            })?;
        let service = ().serve(transport).await.with_context(|| {
            format!("failed to connect MCP server `{}` over stdio", config.command)
        })?;

        debug!("connected to MCP server `{}`", config.command);
        Ok(Self {
            command: config.command.clone(),
            service,
        })
    }

    /// Lists every tool the server offers, following pagination.
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let tools = self.service.list_all_tools().await.with_context(|| {
            format!("failed to list tools of MCP server `{}`", self.command)
        })?;
        let peer = self.service.peer().clone();
        Ok(tools
            .into_iter()
            .map(|tool| McpTool {
                peer: peer.clone(),
                name: tool.name.into_owned(),
                description: tool
                    .description
                    .map(|desc| desc.into_owned())
                    .unwrap_or_default(),
                parameter_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    /// Cancels the session and waits for the child process to go away.
    pub async fn shutdown(self) -> Result<()> {
        let reason = self.service.cancel().await.with_context(|| {
            format!("failed to shut down MCP server `{}`", self.command)
        })?;
        debug!("MCP server `{}` stopped: {reason:?}", self.command);
        Ok(())
    }
}

/// A tool offered by an MCP server, called through the shared session.
#[derive(Clone)]
pub struct McpTool {
    peer: Peer<RoleClient>,
    name: String,
    description: String,
    parameter_schema: Value,
}

impl Tool for McpTool {
    type Input = JsonObject;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let peer = self.peer.clone();
        let name = self.name.clone();
        async move {
            let result = peer
                .call_tool(CallToolRequestParams {
                    meta: None,
                    name: name.into(),
                    arguments: Some(input),
                    task: None,
                })
                .await
                .map_err(|err| {
                    ToolError::execution_error().with_reason(format!("{err}"))
                })?;

            let text = render_contents(&result.content);
            if result.is_error.unwrap_or(false) {
                return Err(ToolError::execution_error().with_reason(text));
            }
            Ok(text)
        }
    }
}

/// Flattens tool output into the text handed back to the model.
fn render_contents(contents: &[Content]) -> String {
    contents
        .iter()
        .map(|content| match &content.raw {
            RawContent::Text(text) => text.text.clone(),
            RawContent::Image(image) => format!("[image: {}]", image.mime_type),
            _ => "[unsupported content]".to_owned(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The tools available for a run, together with the connection serving them.
#[derive(Default)]
pub struct Toolbox {
    connection: Option<McpConnection>,
    tools: Vec<McpTool>,
}

impl Toolbox {
    /// Connects to the server and lists its tools. `None` gives an empty
    /// toolbox without spawning anything.
    ///
    /// If listing fails, the connection is shut down before returning the
    /// error.
    pub async fn provision(server: Option<&McpServerConfig>) -> Result<Self> {
        let Some(server) = server else {
            debug!("MCP is disabled, no tools provisioned");
            return Ok(Self::default());
        };

        let connection = McpConnection::connect(server).await?;
        let tools = match connection.list_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                if let Err(shutdown_err) = connection.shutdown().await {
                    warn!("{shutdown_err:#}");
                }
                return Err(err);
            }
        };
        info!("loaded {} tools from `{}`", tools.len(), server.command);

        Ok(Self {
            connection: Some(connection),
            tools,
        })
    }

    /// Returns the tools, in the order the server listed them.
    #[inline]
    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// Returns `true` if there is a live server connection.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Closes the server connection, if any.
    pub async fn shutdown(self) -> Result<()> {
        match self.connection {
            Some(connection) => connection.shutdown().await,
            None => Ok(()),
        }
    }
}
