mod builder;
#[cfg(test)]
mod tests;

use webscout_model::{ModelFinishReason, ModelMessage, ModelRequest};

use crate::conversation::Message;
use crate::error::Error;
use crate::model_client::ModelClient;
use crate::tool::Manager as ToolManager;
pub use builder::AgentBuilder;

type ToolCallHook = Box<dyn Fn(&str) + Send + Sync>;

/// An agent that answers the latest user message of a conversation, calling
/// tools on behalf of the model until it produces a final reply.
///
/// The agent itself is stateless between calls to [`Agent::ask`]. Callers own
/// the conversation and decide what gets recorded.
pub struct Agent {
    model_client: ModelClient,
    tools: ToolManager,
    on_tool_call: Option<ToolCallHook>,
}

impl Agent {
    /// Produces the agent's reply to the given history.
    ///
    /// The history must contain at least one user message. Earlier agent
    /// replies are sent to the model as assistant turns, so follow-up
    /// questions keep their context.
    pub async fn ask<'a, I>(&self, history: I) -> Result<Message, Error>
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut messages: Vec<ModelMessage> =
            history.into_iter().map(Message::to_model_message).collect();
        let has_user_input = messages
            .iter()
            .any(|msg| matches!(msg, ModelMessage::User(_)));
        if !has_user_input {
            return Err(Error::NoUserInput);
        }

        let tools = self.tools.definitions();
        debug!(
            "asking the model with {} messages and {} tools",
            messages.len(),
            self.tools.len()
        );

        loop {
            let req = ModelRequest {
                messages: messages.clone(),
                tools: tools.clone(),
            };
            let resp = self
                .model_client
                .send_request(req)
                .await
                .map_err(Error::Model)?;

            if resp.finish_reason == Some(ModelFinishReason::Length) {
                warn!("the reply was cut off by the token limit");
            }

            if resp.tool_calls.is_empty() {
                trace!("got the final reply");
                return Ok(Message::agent(resp.transcript));
            }

            messages.push(ModelMessage::Assistant(resp.to_assistant_message()));
            for call in resp.tool_calls {
                if let Some(on_tool_call) = &self.on_tool_call {
                    on_tool_call(&call.name);
                }
                let result = self.tools.call(call).await;
                messages.push(ModelMessage::Tool(result));
            }
        }
    }
}
