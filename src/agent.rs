//! 填表 Agent 入口
//!
//! run_agent 是核心对外的唯一入口：给定简历文本、字段列表与模型传输实现，
//! 组装简历查询服务 / 字段注册表 / 工具箱并执行填表循环，返回已填字段与摘要。
//! 每次调用独立建 RunState 与 FieldRegistry，多表单并发各跑各的，互不共享。

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::RunBudget;
use crate::fields::{FieldRegistry, FormField};
use crate::llm::{ModelTransport, OpenAiTransport, SendOptions};
use crate::resume::ResumeQuery;
use crate::session::{fill_loop, AgentEvent, FillSession, RunReport};
use crate::tools::{build_registry, ToolExecutor};

/// 一次运行的参数：预算、采样与可选的取消 / 事件通道
#[derive(Default)]
pub struct RunOptions {
    pub budget: RunBudget,
    pub temperature: Option<f32>,
    /// "auto" / "required" 等；None 由后端默认
    pub tool_choice: Option<String>,
    pub cancel_token: CancellationToken,
    /// 可选：过程事件推送（含每次成功填写后的 0-100 进度）
    pub event_tx: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl RunOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            budget: cfg.agent.budget(),
            temperature: cfg.llm.temperature,
            ..Self::default()
        }
    }

    pub fn with_budget(mut self, budget: RunBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_event_tx(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }
}

/// 按配置构建 OpenAI 兼容传输
pub fn transport_from_config(cfg: &AppConfig) -> Arc<dyn ModelTransport> {
    Arc::new(OpenAiTransport::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        cfg.llm.api_key.as_deref(),
    ))
}

/// 对一份简历与一张表单执行完整填表循环
///
/// 永远返回结果对象（含已填字段与 "n/total fields" 摘要）；仅传输层失败时 error 为 true。
pub async fn run_agent(
    resume_text: &str,
    fields: Vec<FormField>,
    transport: Arc<dyn ModelTransport>,
    options: RunOptions,
) -> RunReport {
    let resume = Arc::new(ResumeQuery::new(resume_text));
    let registry = Arc::new(Mutex::new(FieldRegistry::new(fields)));
    let executor = ToolExecutor::new(build_registry(resume, registry.clone()));

    let session = FillSession {
        transport: transport.as_ref(),
        executor: &executor,
        registry: &registry,
        budget: &options.budget,
        send_options: SendOptions {
            temperature: options.temperature,
            tool_choice: options.tool_choice.clone(),
        },
        cancel_token: options.cancel_token.clone(),
        event_tx: options.event_tx.as_ref(),
    };

    fill_loop(&session).await
}
