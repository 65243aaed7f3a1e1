//! Scripted Mock 传输（用于测试，无需 API）
//!
//! 按入队顺序逐条吐出预置回复，队列耗尽后返回收尾文本；便于在本地精确驱动填表循环。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatMessage, ModelResponse, ModelTransport, SendOptions, ToolDefinition};

/// Scripted 传输：每次 send 弹出一条预置回复
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ModelResponse>>,
    /// 队列耗尽后的回复内容（纯文本，即「无 tool call」终止）
    exhausted_reply: String,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            exhausted_reply: "Done.".to_string(),
        }
    }

    pub fn with_exhausted_reply(mut self, reply: impl Into<String>) -> Self {
        self.exhausted_reply = reply.into();
        self
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    async fn send(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[ToolDefinition]>,
        _options: &SendOptions,
    ) -> Result<ModelResponse, String> {
        let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(queue
            .pop_front()
            .unwrap_or_else(|| ModelResponse::text(self.exhausted_reply.clone())))
    }
}

/// 始终失败的传输：模拟网络 / 端点故障
pub struct FailingTransport(pub String);

#[async_trait]
impl ModelTransport for FailingTransport {
    async fn send(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[ToolDefinition]>,
        _options: &SendOptions,
    ) -> Result<ModelResponse, String> {
        Err(self.0.clone())
    }
}
