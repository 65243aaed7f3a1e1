//! 模型传输层抽象
//!
//! 所有后端（OpenAI 兼容 / Scripted Mock）实现 ModelTransport：send 接收完整对话与可选工具定义，
//! 返回自由文本或原生结构化 tool call；重试 / 超时属传输实现自身职责，循环层不再包一层。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 消息角色（与 Chat API 一致，tool 为工具结果回传）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// 响应中携带的原生结构化 tool call（arguments 可能是 JSON 对象，也可能是 JSON 字符串）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NativeToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// 单条对话消息；tool_calls 仅出现在 assistant 回显消息上，
/// tool_call_id 仅出现在 role=tool 的结果消息上，与请求按 id 关联
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<NativeToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// assistant 回显消息：content 为空，仅携带发出的 tool calls
    pub fn assistant_tool_calls(calls: Vec<NativeToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// 工具结果消息：JSON 序列化后的结果，按 call_id 关联到请求
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// 工具定义：注入 system prompt 并随请求发给支持原生 function calling 的端点
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// 参数 JSON Schema
    pub parameters: Value,
}

/// 模型回复：自由文本与零或多个原生 tool call；两者可同时存在
#[derive(Clone, Debug, Default)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<NativeToolCall>,
}

impl ModelResponse {
    /// 纯文本回复（无原生 tool call）
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// 原生结构化 tool call 回复
    pub fn calls(calls: Vec<(&str, &str, Value)>) -> Self {
        Self {
            content: String::new(),
            tool_calls: calls
                .into_iter()
                .map(|(id, name, arguments)| NativeToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                })
                .collect(),
        }
    }
}

/// 发送选项：按需透传给后端
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    pub temperature: Option<f32>,
    /// "auto" / "required" 等；None 时由后端默认
    pub tool_choice: Option<String>,
}

/// 模型传输层 trait：对不断增长的消息列表可重复调用
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn send(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        options: &SendOptions,
    ) -> Result<ModelResponse, String>;
}
