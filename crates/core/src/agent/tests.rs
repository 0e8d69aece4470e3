use std::future::ready;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::{Value, json};
use webscout_model::{ErrorKind, ModelMessage, ToolCallRequest};
use webscout_test_model::{PresetEvent, PresetResponse, TestModelProvider};

use crate::conversation::{Conversation, Message};
use crate::tool::{Error as ToolError, Tool, ToolResult};
use crate::{AgentBuilder, Error};

#[derive(Deserialize)]
struct SearchInput {
    query: String,
}

/// A search tool that records every query it receives.
#[derive(Clone, Default)]
struct RecordingSearch {
    queries: Arc<Mutex<Vec<String>>>,
    schema: Value,
}

impl Tool for RecordingSearch {
    type Input = SearchInput;

    fn name(&self) -> &str {
        "search_engine"
    }

    fn description(&self) -> &str {
        "Searches the web"
    }

    fn parameter_schema(&self) -> &Value {
        &self.schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        self.queries.lock().unwrap().push(input.query.clone());
        let result = if input.query == "fail" {
            Err(ToolError::execution_error().with_reason("zone is not active"))
        } else {
            Ok(format!("results for {}", input.query))
        };
        ready(result)
    }
}

fn tool_call(id: &str, name: &str, arguments: Value) -> PresetEvent {
    PresetEvent::ToolCall(ToolCallRequest {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    })
}

#[tokio::test]
async fn test_simple_message() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        PresetEvent::MessageDelta("Hi, ".to_owned()),
        PresetEvent::MessageDelta("what can I do for you?".to_owned()),
    ]));

    let agent = AgentBuilder::with_model_provider(model_provider).build();
    let reply = agent.ask([&Message::user("Hello")]).await.unwrap();
    assert_eq!(reply, Message::agent("Hi, what can I do for you?"));
}

#[tokio::test]
async fn test_tool_round_trip() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        PresetEvent::MessageDelta("Let me look.".to_owned()),
        tool_call("toolu_1", "search_engine", json!({ "query": "rust" })),
        tool_call("toolu_2", "search_engine", json!({ "query": "fail" })),
    ]));
    model_provider.add_tool_result_step();
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::with_text(
        "Rust is a language.",
    ));

    let search = RecordingSearch::default();
    let called_tools = Arc::new(Mutex::new(Vec::new()));
    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(search.clone())
        .on_tool_call({
            let called_tools = Arc::clone(&called_tools);
            move |name| called_tools.lock().unwrap().push(name.to_owned())
        })
        .build();

    let reply = agent.ask([&Message::user("What is Rust?")]).await.unwrap();
    assert_eq!(reply.content, "Rust is a language.");
    assert_eq!(*search.queries.lock().unwrap(), ["rust", "fail"]);
    assert_eq!(
        *called_tools.lock().unwrap(),
        ["search_engine", "search_engine"]
    );

    let requests = model_provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tools[0].name, "search_engine");

    let ModelMessage::Assistant(assistant) = &requests[1].messages[1] else {
        panic!("expected an assistant turn: {:?}", requests[1].messages);
    };
    assert_eq!(assistant.text, "Let me look.");
    assert_eq!(assistant.tool_calls.len(), 2);

    let ModelMessage::Tool(first) = &requests[1].messages[2] else {
        panic!("expected a tool result");
    };
    assert_eq!(first.id, "toolu_1");
    assert_eq!(first.content, "results for rust");
    assert!(!first.is_error);

    let ModelMessage::Tool(second) = &requests[1].messages[3] else {
        panic!("expected a tool result");
    };
    assert_eq!(second.id, "toolu_2");
    assert_eq!(second.content, "zone is not active");
    assert!(second.is_error);
}

#[tokio::test]
async fn test_unknown_tool_does_not_abort() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_events([
        tool_call("toolu_1", "scrape_as_html", json!({ "url": "x" })),
    ]));
    model_provider.add_tool_result_step();
    model_provider.add_assistant_response_step(PresetResponse::with_text(
        "I could not scrape it.",
    ));

    let agent = AgentBuilder::with_model_provider(model_provider.clone())
        .with_tool(RecordingSearch::default())
        .build();
    let reply = agent.ask([&Message::user("Scrape x")]).await.unwrap();
    assert_eq!(reply.content, "I could not scrape it.");

    let requests = model_provider.requests();
    let ModelMessage::Tool(result) = &requests[1].messages[2] else {
        panic!("expected a tool result");
    };
    assert!(result.is_error);
    assert!(result.content.contains("scrape_as_html"));
}

#[tokio::test]
async fn test_history_includes_previous_replies() {
    let mut model_provider = TestModelProvider::default();
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_text("4"));
    model_provider.add_user_input_step();
    model_provider.add_assistant_response_step(PresetResponse::with_text("8"));

    let agent = AgentBuilder::with_model_provider(model_provider.clone()).build();

    let first = Message::user("What is 2+2?");
    let reply = agent.ask([&first]).await.unwrap();
    assert_eq!(reply.content, "4");

    let second = Message::user("Double it");
    let reply = agent.ask([&first, &reply, &second]).await.unwrap();
    assert_eq!(reply.content, "8");

    let requests = model_provider.requests();
    let ModelMessage::Assistant(previous) = &requests[1].messages[1] else {
        panic!("expected the previous reply");
    };
    assert_eq!(previous.text, "4");
    assert!(previous.tool_calls.is_empty());
}

#[tokio::test]
async fn test_model_error() {
    let model_provider = TestModelProvider::default();
    let agent = AgentBuilder::with_model_provider(model_provider).build();

    let err = agent.ask([&Message::user("Hello")]).await.unwrap_err();
    assert!(matches!(err, Error::Model(_)));
    assert_eq!(err.model_error_kind(), Some(ErrorKind::RateLimitExceeded));
}

#[tokio::test]
async fn test_no_user_input() {
    let agent =
        AgentBuilder::with_model_provider(TestModelProvider::default()).build();

    let err = agent.ask(&Conversation::default()).await.unwrap_err();
    assert!(matches!(err, Error::NoUserInput));
    assert_eq!(err.model_error_kind(), None);
}
