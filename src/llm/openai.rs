//! OpenAI 兼容传输适配器
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 DeepSeek、OpenAI、自建代理等。
//! 携带工具定义时走原生 function calling，回复中的 tool_calls 原样透传（arguments 保持
//! JSON 字符串，由解析层统一归一化）。

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
    ToolChoiceOptions,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{
    ChatMessage, ModelResponse, ModelTransport, NativeToolCall, Role, SendOptions, ToolDefinition,
};

/// OpenAI 兼容传输：持有 Client 与 model 名，send 时转消息 / 工具定义为 API 格式并取首个 choice
pub struct OpenAiTransport {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTransport {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    fn to_api_messages(&self, messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>, String> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::System)
                    .map_err(|e| e.to_string()),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(m.content.clone())
                    .build()
                    .map(ChatCompletionRequestMessage::User)
                    .map_err(|e| e.to_string()),
                Role::Assistant => {
                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    builder.content(m.content.clone());
                    if !m.tool_calls.is_empty() {
                        builder.tool_calls(
                            m.tool_calls.iter().map(to_api_tool_call).collect::<Vec<_>>(),
                        );
                    }
                    builder
                        .build()
                        .map(ChatCompletionRequestMessage::Assistant)
                        .map_err(|e| e.to_string())
                }
                Role::Tool => ChatCompletionRequestToolMessageArgs::default()
                    .content(m.content.clone())
                    .tool_call_id(m.tool_call_id.clone().unwrap_or_default())
                    .build()
                    .map(ChatCompletionRequestMessage::Tool)
                    .map_err(|e| e.to_string()),
            })
            .collect()
    }

    fn to_api_tools(&self, tools: &[ToolDefinition]) -> Result<Vec<ChatCompletionTools>, String> {
        tools
            .iter()
            .map(|t| {
                let function = FunctionObjectArgs::default()
                    .name(t.name.clone())
                    .description(t.description.clone())
                    .parameters(t.parameters.clone())
                    .build()
                    .map_err(|e| e.to_string())?;
                Ok(ChatCompletionTools::Function(ChatCompletionTool { function }))
            })
            .collect()
    }
}

/// 规范 NativeToolCall -> API 回显格式（arguments 统一转 JSON 字符串）
fn to_api_tool_call(call: &NativeToolCall) -> ChatCompletionMessageToolCalls {
    let arguments = match &call.arguments {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
        id: call.id.clone(),
        function: FunctionCall {
            name: call.name.clone(),
            arguments,
        },
    })
}

#[async_trait]
impl ModelTransport for OpenAiTransport {
    async fn send(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        options: &SendOptions,
    ) -> Result<ModelResponse, String> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(self.to_api_messages(messages)?);

        if let Some(defs) = tools {
            if !defs.is_empty() {
                builder.tools(self.to_api_tools(defs)?);
                // 未指定 tool_choice 时不发该字段，交由后端默认
                match options.tool_choice.as_deref() {
                    Some("required") => {
                        builder.tool_choice(ChatCompletionToolChoiceOption::Mode(
                            ToolChoiceOptions::Required,
                        ));
                    }
                    Some("none") => {
                        builder.tool_choice(ChatCompletionToolChoiceOption::Mode(
                            ToolChoiceOptions::None,
                        ));
                    }
                    Some(_) => {
                        builder.tool_choice(ChatCompletionToolChoiceOption::Mode(
                            ToolChoiceOptions::Auto,
                        ));
                    }
                    None => {}
                }
            }
        }
        if let Some(t) = options.temperature {
            builder.temperature(t);
        }

        let request = builder.build().map_err(|e| e.to_string())?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(ModelResponse::default());
        };

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| match c {
                ChatCompletionMessageToolCalls::Function(call) => Some(NativeToolCall {
                    id: call.id,
                    name: call.function.name,
                    // 保留原始 JSON 字符串，解析层负责容错归一化
                    arguments: Value::String(call.function.arguments),
                }),
                _ => None,
            })
            .collect();

        Ok(ModelResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_echo_keeps_arguments_as_json_string() {
        let call = NativeToolCall {
            id: "c1".to_string(),
            name: "fill_field".to_string(),
            arguments: json!({"field_id": "f1"}),
        };
        match to_api_tool_call(&call) {
            ChatCompletionMessageToolCalls::Function(api) => {
                assert_eq!(api.id, "c1");
                assert_eq!(api.function.name, "fill_field");
                assert_eq!(api.function.arguments, r#"{"field_id":"f1"}"#);
            }
            other => panic!("expected function tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_definitions_become_function_tools() {
        let transport = OpenAiTransport::new(None, "test-model", Some("sk-test"));
        let defs = vec![ToolDefinition {
            name: "search_resume".to_string(),
            description: "search".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }];
        let tools = transport.to_api_tools(&defs).unwrap();
        assert_eq!(tools.len(), 1);
        match &tools[0] {
            ChatCompletionTools::Function(tool) => {
                assert_eq!(tool.function.name, "search_resume");
            }
            other => panic!("expected function tool, got {other:?}"),
        }
    }
}
