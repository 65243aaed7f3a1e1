//! 核心类型：错误分类与运行预算 / 状态

pub mod error;
pub mod state;

pub use error::AgentError;
pub use state::{RunBudget, RunState, StopReason};
