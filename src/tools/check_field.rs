//! check_field 工具

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fields::FieldRegistry;
use crate::tools::Tool;

/// 按 id 查字段详情；id 不存在是可恢复错误，写回对话让模型自行纠正
pub struct CheckFieldTool {
    registry: Arc<Mutex<FieldRegistry>>,
}

impl CheckFieldTool {
    pub fn new(registry: Arc<Mutex<FieldRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for CheckFieldTool {
    fn name(&self) -> &str {
        "check_field"
    }

    fn description(&self) -> &str {
        "Look up one form field's details (label, type, required) by its id."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "field_id": { "type": "string" }
            },
            "required": ["field_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let field_id = args
            .get("field_id")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("Missing 'field_id' argument")?;
        let registry = self
            .registry
            .lock()
            .map_err(|_| "field registry lock poisoned".to_string())?;
        match registry.check_field(field_id) {
            Some(field) => Ok(json!({
                "field_id": field.id,
                "label": field.label,
                "type": field.field_type,
                "required": field.required,
                "filled": registry.is_filled(field_id),
            })
            .to_string()),
            None => Err(format!("Field not found: {field_id}")),
        }
    }
}
