//! list_fields 工具

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fields::FieldRegistry;
use crate::tools::Tool;

/// 与游标无关的全量字段快照，供模型整体规划而非顺序消费
pub struct ListFieldsTool {
    registry: Arc<Mutex<FieldRegistry>>,
}

impl ListFieldsTool {
    pub fn new(registry: Arc<Mutex<FieldRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for ListFieldsTool {
    fn name(&self) -> &str {
        "list_fields"
    }

    fn description(&self) -> &str {
        "List every form field with its fill status, independent of the sequential cursor. No arguments."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| "field registry lock poisoned".to_string())?;
        let fields: Vec<Value> = registry
            .fields()
            .iter()
            .map(|f| {
                json!({
                    "field_id": f.id,
                    "label": f.label,
                    "type": f.field_type,
                    "required": f.required,
                    "filled": registry.is_filled(&f.id),
                })
            })
            .collect();
        Ok(json!({
            "fields": fields,
            "total": registry.total(),
            "completed": registry.completed_count(),
            "remaining": registry.total() - registry.completed_count(),
        })
        .to_string())
    }
}
