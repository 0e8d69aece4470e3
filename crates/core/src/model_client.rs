use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use tracing::Instrument;
use webscout_model::{
    AssistantMessage, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent, ToolCallRequest,
};

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// Hides the concrete provider type behind a cloneable handle, and collects
/// the streamed events of each response into one value.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            let span = debug_span!("model request", messages = req.messages.len());
            Box::pin(
                async move {
                    let resp = fut.await.map_err(|err| {
                        error!("model request failed: {err}");
                        Box::new(err) as Box<dyn ModelProviderError>
                    })?;
                    collect::<P>(resp).await
                }
                .instrument(span),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the whole response.
    ///
    /// Dropping the returned future stops reading the stream.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// Everything one model response carried.
#[derive(Clone, Debug, Default)]
pub struct ModelClientResponse {
    /// The concatenated message deltas.
    pub transcript: String,
    /// Tool calls requested by the model, in the order they were streamed.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating, if the stream said so.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    /// Converts the response into a message that replays this turn.
    #[inline]
    pub fn to_assistant_message(&self) -> AssistantMessage {
        AssistantMessage {
            text: self.transcript.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }

    fn apply(&mut self, event: ModelResponseEvent) {
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                self.transcript.push_str(&delta)
            }
            ModelResponseEvent::ToolCall(call) => self.tool_calls.push(call),
            ModelResponseEvent::Completed(reason) => {
                self.finish_reason = Some(reason)
            }
        }
    }
}

async fn collect<P: ModelProvider + 'static>(
    resp: P::Response,
) -> SendRequestResult {
    let mut collected = ModelClientResponse::default();
    let mut resp = pin!(resp);
    loop {
        match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
            Ok(Some(event)) => {
                trace!("event: {event:?}");
                collected.apply(event);
            }
            Ok(None) => break,
            Err(err) => {
                error!("response stream failed: {err}");
                return Err(Box::new(err));
            }
        }
    }
    debug!(
        "response finished ({:?}) with {} tool calls",
        collected.finish_reason,
        collected.tool_calls.len()
    );
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use webscout_model::{ErrorKind, ModelMessage};
    use webscout_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_user_input_step();
        model_provider.add_assistant_response_step(
            PresetResponse::with_events([
                PresetEvent::MessageDelta("Checking ".to_owned()),
                PresetEvent::MessageDelta("now.".to_owned()),
                PresetEvent::ToolCall(ToolCallRequest {
                    id: "toolu_1".to_owned(),
                    name: "search_engine".to_owned(),
                    arguments: json!({ "query": "rust" }),
                }),
            ]),
        );

        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let resp = model_client
                .send_request(ModelRequest {
                    messages: vec![ModelMessage::User("Hi".to_owned())],
                    tools: vec![],
                })
                .await
                .unwrap();
            assert_eq!(resp.transcript, "Checking now.");
            assert_eq!(resp.tool_calls.len(), 1);
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));

            let replay = resp.to_assistant_message();
            assert_eq!(replay.text, "Checking now.");
            assert_eq!(replay.tool_calls[0].id, "toolu_1");
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider);
        let err = model_client
            .send_request(ModelRequest {
                messages: vec![ModelMessage::User("Hi".to_owned())],
                tools: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
