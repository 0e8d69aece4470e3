//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::time::{Sleep, sleep};
use webscout_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let delay = this.delay;
        let sleep = this.sleep.get_or_insert_with(|| Box::pin(sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let preset_events = &this.preset.events;
        let event = if this.event_idx < preset_events.len() {
            match &preset_events[this.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            }
        } else if this.event_idx == preset_events.len() {
            let has_tool_call = preset_events
                .iter()
                .any(|event| matches!(event, PresetEvent::ToolCall(_)));
            let finish_reason = if has_tool_call {
                ModelFinishReason::ToolCalls
            } else if this.preset.truncated {
                ModelFinishReason::Length
            } else {
                ModelFinishReason::Stop
            };
            ModelResponseEvent::Completed(finish_reason)
        } else {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Clone, Debug)]
enum ConversationStep {
    UserInput,
    AssistantResponse(PresetResponse),
    ToolResult,
}

impl ConversationStep {
    fn matches(&self, msg: &ModelMessage) -> bool {
        matches!(
            (self, msg),
            (ConversationStep::UserInput, ModelMessage::User(_))
                | (
                    ConversationStep::AssistantResponse(_),
                    ModelMessage::Assistant(_)
                )
                | (ConversationStep::ToolResult, ModelMessage::Tool(_))
        )
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// number of history messages in your request, and the history must follow
/// the script step by step. If the history diverges, or there are no enough
/// steps in the script, an error will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    #[inline]
    pub fn add_tool_result_step(&mut self) {
        self.conversation_script.push(ConversationStep::ToolResult);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, shared across clones.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn response_for(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        let script = &self.conversation_script;
        let diverged = req
            .messages
            .iter()
            .zip(script)
            .any(|(msg, step)| !step.matches(msg));
        if diverged {
            return Err(Error {
                message: "history does not follow the script",
                kind: ErrorKind::Other,
            });
        }

        match script.get(req.messages.len()) {
            Some(ConversationStep::AssistantResponse(preset)) => {
                Ok(TestModelResponse {
                    preset: preset.clone(),
                    delay: self.delay.unwrap_or(Duration::from_millis(1)),
                    event_idx: 0,
                    sleep: None,
                })
            }
            Some(_) => Err(Error {
                message: "not an assistant response step",
                kind: ErrorKind::Moderated,
            }),
            None => Err(Error {
                message: "no enough steps",
                kind: ErrorKind::RateLimitExceeded,
            }),
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(req.clone());
        ready(self.response_for(req))
    }
}
