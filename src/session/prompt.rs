//! 对话种子：system / user prompt 拼装
//!
//! system 由工具目录（名称 + 描述 + 规范调用格式 Schema）与当前完成度计数拼成；
//! user 只陈述字段总数，让模型自行用 get_next_field 顺序推进。

use crate::llm::ToolDefinition;
use crate::tools::catalog;

/// 拼 system prompt：角色设定 + 可用工具 + 规范调用格式 + 进度计数
pub fn system_prompt(definitions: &[ToolDefinition], completed: usize, total: usize) -> String {
    let mut tools_block = String::new();
    for def in definitions {
        tools_block.push_str(&format!("- {}: {}\n", def.name, def.description));
    }

    format!(
        "You are a form-filling assistant. You fill out a job application form using only \
information found in the candidate's resume, by calling tools.\n\n\
Available tools:\n{tools}\n\
Workflow: call get_next_field to get the field to work on, look the value up with \
analyze_resume / search_resume / get_resume_section, then call fill_field with the exact \
field_id you were given and a confidence of High, Medium or Low. Call one tool at a time \
and wait for its result. If the resume holds nothing usable for a field, you may fill it \
with \"No information available\". Stop calling tools once every field has been visited.\n\n\
When you cannot use native tool calls, reply with a single JSON object in this format:\n\
{schema}\n\n\
Progress so far: {completed}/{total} fields filled.",
        tools = tools_block,
        schema = catalog::call_format_schema_json(),
        completed = completed,
        total = total,
    )
}

/// 拼首条 user prompt：陈述任务与字段总数
pub fn user_prompt(total: usize) -> String {
    format!(
        "Please fill out this job application form. It has {total} fields. \
Work through them one at a time, starting with get_next_field."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::definitions;

    #[test]
    fn test_system_prompt_lists_all_tools() {
        let prompt = system_prompt(&definitions(), 2, 5);
        for name in catalog::TOOL_NAMES {
            assert!(prompt.contains(name), "missing tool {name}");
        }
        assert!(prompt.contains("2/5"));
    }

    #[test]
    fn test_user_prompt_states_field_count() {
        assert!(user_prompt(7).contains("7 fields"));
    }
}
