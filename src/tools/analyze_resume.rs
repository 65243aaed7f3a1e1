//! analyze_resume 工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::resume::ResumeQuery;
use crate::tools::Tool;

/// 提取简历头部事实（姓名 / 邮箱 / 电话 / 地点 / 学历），结果按会话缓存
pub struct AnalyzeResumeTool {
    resume: Arc<ResumeQuery>,
}

impl AnalyzeResumeTool {
    pub fn new(resume: Arc<ResumeQuery>) -> Self {
        Self { resume }
    }
}

#[async_trait]
impl Tool for AnalyzeResumeTool {
    fn name(&self) -> &str {
        "analyze_resume"
    }

    fn description(&self) -> &str {
        "Extract headline facts from the resume: name, email, phone, location, education. No arguments."
    }

    async fn execute(&self, _args: Value) -> Result<String, String> {
        serde_json::to_string(self.resume.analyze()).map_err(|e| e.to_string())
    }
}
