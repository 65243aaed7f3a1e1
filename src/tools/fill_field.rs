//! fill_field 工具

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fields::FieldRegistry;
use crate::resume::Confidence;
use crate::tools::Tool;

/// 填入字段值；同 id 重复填写后写覆盖，模型省略 confidence 时取 Medium
pub struct FillFieldTool {
    registry: Arc<Mutex<FieldRegistry>>,
}

impl FillFieldTool {
    pub fn new(registry: Arc<Mutex<FieldRegistry>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for FillFieldTool {
    fn name(&self) -> &str {
        "fill_field"
    }

    fn description(&self) -> &str {
        "Fill one form field with a value sourced from the resume. Refilling the same id overwrites the previous value."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "field_id": { "type": "string" },
                "value": { "type": "string" },
                "confidence": { "type": "string", "enum": ["High", "Medium", "Low"] }
            },
            "required": ["field_id", "value"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let field_id = args
            .get("field_id")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("Missing 'field_id' argument")?;
        let value = args
            .get("value")
            .and_then(|v| v.as_str())
            .ok_or("Missing 'value' argument")?;
        let confidence = args
            .get("confidence")
            .and_then(|v| v.as_str())
            .map(Confidence::parse_lenient)
            .unwrap_or(Confidence::Medium);

        let mut registry = self
            .registry
            .lock()
            .map_err(|_| "field registry lock poisoned".to_string())?;
        match registry.fill_field(field_id, value, confidence) {
            Some(filled) => Ok(json!({
                "filled": filled,
                "completed": registry.completed_count(),
                "total": registry.total(),
                "percentage": registry.completion_percentage(),
            })
            .to_string()),
            None => Err(format!("Field not found: {field_id}")),
        }
    }
}
