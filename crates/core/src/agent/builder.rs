use webscout_model::ModelProvider;

use super::{Agent, ToolCallHook};
use crate::model_client::ModelClient;
use crate::tool::{Manager as ToolManager, Tool};

/// [`Agent`] builder.
pub struct AgentBuilder {
    model_client: ModelClient,
    tools: ToolManager,
    on_tool_call: Option<ToolCallHook>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: Default::default(),
            on_tool_call: None,
        }
    }

    /// Attaches a callback to be invoked with the tool name right before a
    /// tool runs.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_tool_call = Some(Box::new(on_tool_call));
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent {
            model_client: self.model_client,
            tools: self.tools,
            on_tool_call: self.on_tool_call,
        }
    }
}
