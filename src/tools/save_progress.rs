//! save_progress 工具

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fields::FieldRegistry;
use crate::tools::Tool;

/// 进度检查点：无副作用的完成度快照，带时间戳
pub struct SaveProgressTool {
    registry: Arc<Mutex<FieldRegistry>>,
}

impl SaveProgressTool {
    pub fn new(registry: Arc<Mutex<FieldRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for SaveProgressTool {
    fn name(&self) -> &str {
        "save_progress"
    }

    fn description(&self) -> &str {
        "Take a side-effect-free checkpoint snapshot of the current completion state. No arguments."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| "field registry lock poisoned".to_string())?;
        let snapshot = registry.snapshot();
        Ok(json!({
            "total": snapshot.total,
            "completed": snapshot.completed,
            "percentage": snapshot.percentage,
            "fields": registry.completed_fields(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
        .to_string())
    }
}
