//! 模型传输层：抽象与实现（OpenAI 兼容 / Scripted Mock）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{FailingTransport, ScriptedTransport};
pub use openai::OpenAiTransport;
pub use traits::{
    ChatMessage, ModelResponse, ModelTransport, NativeToolCall, Role, SendOptions, ToolDefinition,
};
