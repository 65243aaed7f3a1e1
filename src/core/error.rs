//! Agent 错误类型
//!
//! 区分「对本轮致命」（Transport）与「可恢复」（工具执行失败，写回对话让 LLM 自行纠正）两类；
//! 预算耗尽不是错误，由循环以 StopReason 正常终止。

use thiserror::Error;

/// 填表循环中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型传输层失败（网络 / 端点错误）：对本轮运行致命，带部分结果终止
    #[error("Transport error: {0}")]
    Transport(String),

    /// 工具执行失败（如字段不存在）：可恢复，作为诊断消息写回对话
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),
}
