use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use serde_json::json;
use tokio::time::{Sleep, sleep};
use webscout_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ModelTool, ToolCallRequest,
};

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "echo failed: {}", self.0)
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Repeats the last user message word by word, or asks for the first tool
/// when the request carries any.
struct EchoResponse {
    pending: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(req: &ModelRequest) -> Self {
        let input = req
            .messages
            .iter()
            .rev()
            .find_map(|msg| match msg {
                ModelMessage::User(text) => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or_default();

        let mut pending: VecDeque<_> = format!("You said {input}")
            .split(' ')
            .enumerate()
            .map(|(idx, word)| {
                let word = if idx == 0 {
                    word.to_owned()
                } else {
                    format!(" {word}")
                };
                ModelResponseEvent::MessageDelta(word)
            })
            .collect();

        let finish_reason = match req.tools.first() {
            Some(tool) => {
                pending.push_back(ModelResponseEvent::ToolCall(
                    ToolCallRequest {
                        id: "call:0".to_owned(),
                        name: tool.name.clone(),
                        arguments: json!({ "text": input }),
                    },
                ));
                ModelFinishReason::ToolCalls
            }
            None => ModelFinishReason::Stop,
        };
        pending.push_back(ModelResponseEvent::Completed(finish_reason));

        Self {
            pending,
            sleep: None,
        }
    }
}

impl ModelResponse for EchoResponse {
    type Error = EchoError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(Duration::from_millis(1))));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;
        Poll::Ready(Ok(this.pending.pop_front()))
    }
}

struct EchoProvider;

impl ModelProvider for EchoProvider {
    type Error = EchoError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let has_user_input = req
            .messages
            .iter()
            .any(|msg| matches!(msg, ModelMessage::User(_)));
        let result = if has_user_input {
            Ok(EchoResponse::new(req))
        } else {
            Err(EchoError(ErrorKind::Other))
        };
        ready(result)
    }
}

async fn drain(
    mut resp: EchoResponse,
) -> (String, Vec<ToolCallRequest>, Option<ModelFinishReason>) {
    let mut text = String::new();
    let mut tool_calls = vec![];
    let mut finish_reason = None;
    while let Some(event) =
        poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap()
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::ToolCall(req) => tool_calls.push(req),
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }
    (text, tool_calls, finish_reason)
}

#[tokio::test]
async fn test_completion() {
    let req = ModelRequest {
        messages: vec![ModelMessage::User("Good morning".to_owned())],
        tools: vec![],
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    let (text, tool_calls, finish_reason) = drain(resp).await;

    assert_eq!(text, "You said Good morning");
    assert!(tool_calls.is_empty());
    assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_tool_call() {
    let req = ModelRequest {
        messages: vec![ModelMessage::User("scrape it".to_owned())],
        tools: vec![ModelTool {
            name: "scrape_as_markdown".to_owned(),
            description: "Scrapes a page".to_owned(),
            parameters: json!({ "type": "object" }),
        }],
    };
    let resp = EchoProvider.send_request(&req).await.unwrap();
    let (_, tool_calls, finish_reason) = drain(resp).await;

    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].name, "scrape_as_markdown");
    assert_eq!(tool_calls[0].arguments, json!({ "text": "scrape it" }));
    assert_eq!(finish_reason, Some(ModelFinishReason::ToolCalls));
}

#[tokio::test]
async fn test_error() {
    let req = ModelRequest::default();
    let err = EchoProvider.send_request(&req).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert_eq!(err.to_string(), "echo failed: other");
}
