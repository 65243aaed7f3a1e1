//! 工具定义目录
//!
//! 8 个工具的静态 schema（名称 / 描述 / 参数），既用于拼 system prompt 与原生 function calling
//! 的工具定义，也是解析层「已知工具名」与直调语法按位参数顺序的唯一事实来源。

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::llm::ToolDefinition;

/// 全部已知工具名；解析层据此过滤，未知名静默丢弃
pub const TOOL_NAMES: [&str; 8] = [
    "analyze_resume",
    "get_resume_section",
    "get_next_field",
    "check_field",
    "fill_field",
    "list_fields",
    "search_resume",
    "save_progress",
];

pub fn is_known_tool(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}

/// 直调语法 tool_name(a, b, c) 的固定按位参数顺序
pub fn positional_args(name: &str) -> &'static [&'static str] {
    match name {
        "fill_field" => &["field_id", "value", "confidence"],
        "check_field" => &["field_id"],
        "search_resume" => &["query"],
        "get_resume_section" => &["section"],
        _ => &[],
    }
}

fn no_params() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// 8 个工具的完整定义，目录序固定
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "analyze_resume".to_string(),
            description: "Extract headline facts from the resume: name, email, phone, location, education. No arguments.".to_string(),
            parameters: no_params(),
        },
        ToolDefinition {
            name: "get_resume_section".to_string(),
            description: "Get one resume section by canonical name: education, experience, skills, projects or contact.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "section": {
                        "type": "string",
                        "enum": ["education", "experience", "skills", "projects", "contact"],
                        "description": "Canonical section name"
                    }
                },
                "required": ["section"]
            }),
        },
        ToolDefinition {
            name: "get_next_field".to_string(),
            description: "Advance to the next form field to work on. Sequential; a field is never returned twice. No arguments.".to_string(),
            parameters: no_params(),
        },
        ToolDefinition {
            name: "check_field".to_string(),
            description: "Look up one form field's details (label, type, required) by its id.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "field_id": { "type": "string", "description": "Form field id" }
                },
                "required": ["field_id"]
            }),
        },
        ToolDefinition {
            name: "fill_field".to_string(),
            description: "Fill one form field with a value sourced from the resume. Refilling the same id overwrites the previous value.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "field_id": { "type": "string", "description": "Form field id" },
                    "value": { "type": "string", "description": "Value to fill in" },
                    "confidence": {
                        "type": "string",
                        "enum": ["High", "Medium", "Low"],
                        "description": "How directly the value was found in the resume; defaults to Medium"
                    }
                },
                "required": ["field_id", "value"]
            }),
        },
        ToolDefinition {
            name: "list_fields".to_string(),
            description: "List every form field with its fill status, independent of the sequential cursor. No arguments.".to_string(),
            parameters: no_params(),
        },
        ToolDefinition {
            name: "search_resume".to_string(),
            description: "Case-insensitive keyword search over the resume text, with context lines and a confidence level per match.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Keyword or phrase to look for" }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "save_progress".to_string(),
            description: "Take a side-effect-free checkpoint snapshot of the current completion state. No arguments.".to_string(),
            parameters: no_params(),
        },
    ]
}

/// 规范 tool call 请求格式（仅用于 Schema 生成，注入 system prompt 减少格式错误）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 工具名，见 TOOL_NAMES
    pub tool: String,
    /// 工具参数，依工具不同而不同（field_id、value、query 等）
    pub args: HashMap<String, String>,
}

/// 返回规范调用格式的 JSON Schema 字符串，可拼入 system prompt
pub fn call_format_schema_json() -> String {
    let schema = schema_for!(ToolCallFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_all_names() {
        let defs = definitions();
        assert_eq!(defs.len(), TOOL_NAMES.len());
        for (def, name) in defs.iter().zip(TOOL_NAMES.iter()) {
            assert_eq!(def.name, *name);
            assert!(is_known_tool(&def.name));
        }
    }

    #[test]
    fn test_positional_orders() {
        assert_eq!(positional_args("fill_field"), ["field_id", "value", "confidence"]);
        assert!(positional_args("analyze_resume").is_empty());
        assert!(positional_args("unknown").is_empty());
    }
}
