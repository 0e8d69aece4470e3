use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use serde_json::Value;
use webscout_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};

use crate::Error;
use crate::io::Sse;
use crate::proto::{ContentBlockDelta, ContentBlockStart, StreamEvent};

/// A tool use block whose input is still streaming in.
struct PartialToolUse {
    id: String,
    name: String,
    input_json: String,
}

struct PartialState {
    sse: Sse,
    tool_uses: HashMap<usize, PartialToolUse>,
    // Events decoded from the stream but not yet handed out. One SSE event
    // maps to at most one model event, but the queue keeps the ordering
    // explicit.
    pending_events: VecDeque<ModelResponseEvent>,
    // Set by `message_delta`, emitted as `Completed` on `message_stop`.
    finish_reason: Option<ModelFinishReason>,
    stopped: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct AnthropicResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl AnthropicResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            tool_uses: Default::default(),
            pending_events: Default::default(),
            finish_reason: None,
            stopped: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for AnthropicResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut partial_state: PartialState) -> NextEvent {
    while partial_state.pending_events.is_empty() && !partial_state.stopped {
        let sse_event = match partial_state.sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Err(Error::new(
                    "stream ended before message_stop",
                    ErrorKind::Other,
                ));
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event:?}");

        let event = serde_json::from_str::<StreamEvent>(&sse_event.data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        handle_stream_event(&mut partial_state, event)?;
    }

    let event = partial_state.pending_events.pop_front();
    Ok((event, partial_state))
}

fn handle_stream_event(
    state: &mut PartialState,
    event: StreamEvent,
) -> Result<(), Error> {
    match event {
        StreamEvent::MessageStart { message } => {
            debug!("message started: {} ({:?})", message.id, message.model);
        }
        StreamEvent::ContentBlockStart {
            index,
            content_block,
        } => match content_block {
            ContentBlockStart::Text { text } => {
                if !text.is_empty() {
                    state
                        .pending_events
                        .push_back(ModelResponseEvent::MessageDelta(text));
                }
            }
            ContentBlockStart::ToolUse { id, name } => {
                state.tool_uses.insert(
                    index,
                    PartialToolUse {
                        id,
                        name,
                        input_json: String::new(),
                    },
                );
            }
            ContentBlockStart::Unknown => {
                trace!("ignoring content block {index}");
            }
        },
        StreamEvent::ContentBlockDelta { index, delta } => match delta {
            ContentBlockDelta::TextDelta { text } => {
                state
                    .pending_events
                    .push_back(ModelResponseEvent::MessageDelta(text));
            }
            ContentBlockDelta::InputJsonDelta { partial_json } => {
                let Some(tool_use) = state.tool_uses.get_mut(&index) else {
                    return Err(Error::new(
                        format!("input delta for unknown block {index}"),
                        ErrorKind::Other,
                    ));
                };
                tool_use.input_json.push_str(&partial_json);
            }
            ContentBlockDelta::Unknown => {}
        },
        StreamEvent::ContentBlockStop { index } => {
            // Only tool use blocks need finalizing.
            if let Some(tool_use) = state.tool_uses.remove(&index) {
                let arguments = parse_tool_input(&tool_use.input_json)?;
                state.pending_events.push_back(ModelResponseEvent::ToolCall(
                    ToolCallRequest {
                        id: tool_use.id,
                        name: tool_use.name,
                        arguments,
                    },
                ));
            }
        }
        StreamEvent::MessageDelta { delta } => {
            if let Some(stop_reason) = delta.stop_reason {
                state.finish_reason = Some(map_stop_reason(&stop_reason));
            }
        }
        StreamEvent::MessageStop => {
            state.stopped = true;
            let finish_reason =
                state.finish_reason.take().unwrap_or(ModelFinishReason::Stop);
            state
                .pending_events
                .push_back(ModelResponseEvent::Completed(finish_reason));
        }
        StreamEvent::Error { error } => {
            return Err(Error::from_api_error(error));
        }
        StreamEvent::Ping | StreamEvent::Unknown => {}
    }
    Ok(())
}

#[inline]
fn parse_tool_input(input_json: &str) -> Result<Value, Error> {
    // A tool without parameters streams no input at all.
    if input_json.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(input_json).map_err(|err| {
        Error::new(format!("invalid tool input: {err}"), ErrorKind::Other)
    })
}

#[inline]
fn map_stop_reason(stop_reason: &str) -> ModelFinishReason {
    match stop_reason {
        "tool_use" => ModelFinishReason::ToolCalls,
        "max_tokens" => ModelFinishReason::Length,
        _ => ModelFinishReason::Stop,
    }
}
