//! 工具执行器
//!
//! 持有 ToolRegistry，execute(tool_name, args) 调用 registry.execute 并把失败统一转为
//! AgentError；每次调用输出结构化审计日志（JSON）。工具均为进程内纯计算，不设单独超时
//! （对外部时间的约束由传输层与循环的墙钟预算承担）。

use std::time::Instant;

use crate::core::AgentError;
use crate::tools::ToolRegistry;

/// 工具执行器：统一调度与错误映射
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// 执行指定工具；工具返回 Err 则转为 ToolExecutionFailed；输出 JSON 审计日志
    pub async fn execute(
        &self,
        tool_name: &str,
        args: serde_json::Value,
    ) -> Result<String, AgentError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = self.registry.execute(tool_name, args).await;

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": result.is_ok(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        result.map_err(AgentError::ToolExecutionFailed)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        self.registry.definitions()
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.len() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
