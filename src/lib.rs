//! formbee - Rust 求职表单填写智能体
//!
//! 以受限的工具调用循环驱动 LLM 自动填写求职申请表：模型通过 8 个工具查简历、
//! 看字段、填值，循环容忍坏格式输出、重复失败与各家供应商不一致的回复形态。
//!
//! 模块划分：
//! - **agent**: run_agent 入口与运行参数
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、运行预算与瞬时状态
//! - **fields**: 表单字段注册表（单调游标 + 已填映射）
//! - **llm**: 模型传输层抽象与实现（OpenAI 兼容 / Scripted Mock）
//! - **parse**: 多形态 Tool Call 归一化解析
//! - **resume**: 简历查询服务（事实提取 / 节窗口 / 检索）
//! - **session**: 事件、prompt 拼装与填表主循环
//! - **tools**: 8 个填表工具、注册表、执行器与静态目录

pub mod agent;
pub mod config;
pub mod core;
pub mod fields;
pub mod llm;
pub mod parse;
pub mod resume;
pub mod session;
pub mod tools;

pub use agent::{run_agent, transport_from_config, RunOptions};
pub use config::{load_config, AppConfig};
pub use core::{AgentError, RunBudget, StopReason};
pub use fields::{FieldRegistry, FilledField, FormField};
pub use llm::{ChatMessage, ModelResponse, ModelTransport, Role, ToolDefinition};
pub use resume::{Confidence, ResumeQuery};
pub use session::{AgentEvent, RunReport};
