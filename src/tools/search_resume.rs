//! search_resume 工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::resume::ResumeQuery;
use crate::tools::Tool;

/// 大小写不敏感的简历检索；查无结果时返回 "No matches found" 哨兵（Low），不是错误
pub struct SearchResumeTool {
    resume: Arc<ResumeQuery>,
}

impl SearchResumeTool {
    pub fn new(resume: Arc<ResumeQuery>) -> Self {
        Self { resume }
    }
}

#[async_trait]
impl Tool for SearchResumeTool {
    fn name(&self) -> &str {
        "search_resume"
    }

    fn description(&self) -> &str {
        "Case-insensitive keyword search over the resume text, with context lines and a confidence level per match."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("Missing 'query' argument")?;
        serde_json::to_string(&self.resume.search(query)).map_err(|e| e.to_string())
    }
}
