//! get_next_field 工具

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fields::{FieldRegistry, NextField};
use crate::tools::Tool;

/// 顺序取下一个待填字段；游标只进不退，走完后持续返回 remaining: 0
pub struct NextFieldTool {
    registry: Arc<Mutex<FieldRegistry>>,
}

impl NextFieldTool {
    pub fn new(registry: Arc<Mutex<FieldRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for NextFieldTool {
    fn name(&self) -> &str {
        "get_next_field"
    }

    fn description(&self) -> &str {
        "Advance to the next form field to work on. Sequential; a field is never returned twice. No arguments."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        let mut registry = self
            .registry
            .lock()
            .map_err(|_| "field registry lock poisoned".to_string())?;
        let result = match registry.next_field() {
            NextField::Field {
                field,
                index,
                remaining,
            } => json!({
                "field_id": field.id,
                "label": field.label,
                "type": field.field_type,
                "required": field.required,
                "index": index,
                "remaining": remaining,
            }),
            NextField::Exhausted => json!({
                "remaining": 0,
                "message": "All fields have been visited",
            }),
        };
        Ok(result.to_string())
    }
}
