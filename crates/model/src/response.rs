use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::ModelProviderError;

/// A streamed reply from a model provider.
///
/// Text arrives in pieces, tool calls arrive whole, and a single
/// [`ModelResponseEvent::Completed`] closes the stream.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error produced while streaming.
    type Error: ModelProviderError;

    /// Polls for the next event of the stream.
    ///
    /// Returns `Ready(Ok(Some(_)))` for every event in arrival order, then
    /// `Ready(Ok(None))` once the stream is over; later calls keep
    /// returning `None`. A `Ready(Err(_))` ends the stream early. While
    /// `Pending`, the waker in `cx` is registered for the next event.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;
}

/// Why the model stopped generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model is waiting for tool results.
    ToolCalls,
    /// The reply is complete.
    Stop,
    /// The model hit the output token limit.
    Length,
}

/// A tool invocation the model asked for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifies the call, echoed back in its [`crate::ToolCallResult`].
    pub id: String,
    /// The tool name, as advertised in [`crate::ModelTool`].
    pub name: String,
    /// The tool input, a JSON object for well-behaved models.
    pub arguments: Value,
}

/// An event streamed by a [`ModelResponse`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The last event of a response.
    Completed(ModelFinishReason),
    /// A piece of the reply text.
    MessageDelta(String),
    /// A fully received tool call.
    ToolCall(ToolCallRequest),
}
