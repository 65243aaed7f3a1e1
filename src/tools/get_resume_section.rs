//! get_resume_section 工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::resume::ResumeQuery;
use crate::tools::Tool;

/// 按规范节名取简历节窗口；未命中返回哨兵 content 而非失败
pub struct ResumeSectionTool {
    resume: Arc<ResumeQuery>,
}

impl ResumeSectionTool {
    pub fn new(resume: Arc<ResumeQuery>) -> Self {
        Self { resume }
    }
}

#[async_trait]
impl Tool for ResumeSectionTool {
    fn name(&self) -> &str {
        "get_resume_section"
    }

    fn description(&self) -> &str {
        "Get one resume section by canonical name: education, experience, skills, projects or contact."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "section": {
                    "type": "string",
                    "enum": ["education", "experience", "skills", "projects", "contact"]
                }
            },
            "required": ["section"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let section = args
            .get("section")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("Missing 'section' argument")?;
        serde_json::to_string(&self.resume.section(section)).map_err(|e| e.to_string())
    }
}
