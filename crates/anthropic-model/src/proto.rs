use serde::{Deserialize, Serialize};
use serde_json::Value;
use webscout_model::{ModelMessage, ModelRequest, ModelTool};

use crate::AnthropicConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: MessageInfo,
    },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlockStart,
    },
    ContentBlockDelta {
        index: usize,
        delta: ContentBlockDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        delta: MessageDeltaBody,
    },
    MessageStop,
    Ping,
    Error {
        error: ApiError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub model: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockStart {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageDeltaBody {
    pub stop_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// The body of a non-2xx response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    role: Role,
    content: Content,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &AnthropicConfig,
) -> MessagesRequest {
    MessagesRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        messages: create_messages(&req.messages),
        tools: req.tools.iter().map(create_tool).collect(),
        stream: true,
    }
}

fn create_messages(history: &[ModelMessage]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::with_capacity(history.len());
    for msg in history {
        match msg {
            ModelMessage::User(text) => messages.push(Message {
                role: Role::User,
                content: Content::Text(text.clone()),
            }),
            ModelMessage::Assistant(assistant) => {
                let mut blocks = Vec::with_capacity(
                    assistant.tool_calls.len() + 1,
                );
                if !assistant.text.is_empty() {
                    blocks.push(ContentBlock::Text {
                        text: assistant.text.clone(),
                    });
                }
                blocks.extend(assistant.tool_calls.iter().map(|call| {
                    ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    }
                }));
                // The API rejects empty content, and an empty reply carries
                // nothing the model needs to see again.
                if blocks.is_empty() {
                    continue;
                }
                messages.push(Message {
                    role: Role::Assistant,
                    content: Content::Blocks(blocks),
                });
            }
            ModelMessage::Tool(result) => {
                let block = ContentBlock::ToolResult {
                    tool_use_id: result.id.clone(),
                    content: result.content.clone(),
                    is_error: result.is_error.then_some(true),
                };
                // All results answering one assistant turn must arrive in a
                // single user message.
                if let Some(Message {
                    role: Role::User,
                    content: Content::Blocks(blocks),
                }) = messages.last_mut()
                {
                    if blocks
                        .iter()
                        .all(|b| matches!(b, ContentBlock::ToolResult { .. }))
                    {
                        blocks.push(block);
                        continue;
                    }
                }
                messages.push(Message {
                    role: Role::User,
                    content: Content::Blocks(vec![block]),
                });
            }
        }
    }
    messages
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.parameters.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use webscout_model::{AssistantMessage, ToolCallRequest, ToolCallResult};

    use super::*;
    use crate::AnthropicConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![ModelMessage::User("Hello".to_owned())],
            tools: vec![ModelTool {
                name: "search_engine".to_owned(),
                description: "Searches the web.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } }
                }),
            }],
        };
        let config = AnthropicConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_temperature(0.5)
            .with_max_tokens(256)
            .build();

        let payload = serde_json::to_value(create_request(&request, &config))
            .unwrap();
        assert_eq!(
            payload,
            json!({
                "model": "custom",
                "max_tokens": 256,
                "temperature": 0.5,
                "messages": [{ "role": "user", "content": "Hello" }],
                "tools": [{
                    "name": "search_engine",
                    "description": "Searches the web.",
                    "input_schema": {
                        "type": "object",
                        "properties": { "query": { "type": "string" } }
                    }
                }],
                "stream": true
            })
        );
    }

    #[test]
    fn test_tool_turns() {
        let history = vec![
            ModelMessage::User("Compare two pages".to_owned()),
            ModelMessage::Assistant(AssistantMessage {
                text: String::new(),
                tool_calls: vec![
                    ToolCallRequest {
                        id: "toolu_1".to_owned(),
                        name: "scrape_as_markdown".to_owned(),
                        arguments: json!({ "url": "https://a.example" }),
                    },
                    ToolCallRequest {
                        id: "toolu_2".to_owned(),
                        name: "scrape_as_markdown".to_owned(),
                        arguments: json!({ "url": "https://b.example" }),
                    },
                ],
            }),
            ModelMessage::Tool(ToolCallResult {
                id: "toolu_1".to_owned(),
                content: "# A".to_owned(),
                is_error: false,
            }),
            ModelMessage::Tool(ToolCallResult {
                id: "toolu_2".to_owned(),
                content: "timeout".to_owned(),
                is_error: true,
            }),
        ];

        let payload = serde_json::to_value(create_messages(&history)).unwrap();
        assert_eq!(
            payload,
            json!([
                { "role": "user", "content": "Compare two pages" },
                {
                    "role": "assistant",
                    "content": [
                        {
                            "type": "tool_use",
                            "id": "toolu_1",
                            "name": "scrape_as_markdown",
                            "input": { "url": "https://a.example" }
                        },
                        {
                            "type": "tool_use",
                            "id": "toolu_2",
                            "name": "scrape_as_markdown",
                            "input": { "url": "https://b.example" }
                        }
                    ]
                },
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "tool_result",
                            "tool_use_id": "toolu_1",
                            "content": "# A"
                        },
                        {
                            "type": "tool_result",
                            "tool_use_id": "toolu_2",
                            "content": "timeout",
                            "is_error": true
                        }
                    ]
                }
            ])
        );
    }

    #[test]
    fn test_empty_assistant_turn_is_skipped() {
        let history = vec![
            ModelMessage::User("Scrape the page".to_owned()),
            ModelMessage::Assistant(AssistantMessage::text("")),
            ModelMessage::User("Try again".to_owned()),
        ];

        let payload = serde_json::to_value(create_messages(&history)).unwrap();
        assert_eq!(
            payload,
            json!([
                { "role": "user", "content": "Scrape the page" },
                { "role": "user", "content": "Try again" }
            ])
        );
    }

    #[test]
    fn test_parse_stream_events() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"q"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::ContentBlockDelta {
                index: 1,
                delta: ContentBlockDelta::InputJsonDelta {
                    partial_json: "{\"q".to_owned()
                },
            }
        );

        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"something_new","x":1}"#)
                .unwrap();
        assert_eq!(event, StreamEvent::Unknown);

        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlockStart::Unknown,
            }
        );
    }
}
