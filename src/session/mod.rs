//! 会话编排层：事件、prompt 拼装与填表主循环

pub mod events;
pub mod loop_;
pub mod prompt;

pub use events::AgentEvent;
pub use loop_::{fill_loop, FillSession, RunReport};
