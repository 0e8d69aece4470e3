//! Tools exposed to the model.
//!
//! All tools come from an MCP server running as a child process. The
//! [`Toolbox`] owns that connection for the whole run.

mod mcp;

pub use mcp::{McpConnection, McpServerConfig, McpTool, Toolbox};
