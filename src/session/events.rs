//! 填表过程事件：用于前端展示进度、工具调用与失败

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// 新一轮模型交互（当前工具调用数 / 上限）
    StepUpdate { attempts: u32, max_attempts: u32 },
    /// 正在调用模型
    ModelCall,
    /// 派发工具调用
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    ToolResult { tool: String, preview: String },
    /// 工具执行失败（作为诊断消息写回对话）
    ToolFailure { tool: String, reason: String },
    /// 字段失败达上限，本轮永久跳过
    FieldSkipped { field_id: String },
    /// 每次成功 fill_field 后的完成百分比（0-100）
    Progress { percent: u8 },
    /// 运行结束
    Done { summary: String },
    /// 错误（传输失败等）
    Error { text: String },
}
