//! 填表工具箱：8 个工具 + 注册表 / 执行器 / 静态目录

pub mod analyze_resume;
pub mod catalog;
pub mod check_field;
pub mod executor;
pub mod fill_field;
pub mod get_next_field;
pub mod get_resume_section;
pub mod list_fields;
pub mod registry;
pub mod save_progress;
pub mod search_resume;

pub use analyze_resume::AnalyzeResumeTool;
pub use check_field::CheckFieldTool;
pub use executor::ToolExecutor;
pub use fill_field::FillFieldTool;
pub use get_next_field::NextFieldTool;
pub use get_resume_section::ResumeSectionTool;
pub use list_fields::ListFieldsTool;
pub use registry::{Tool, ToolRegistry};
pub use save_progress::SaveProgressTool;
pub use search_resume::SearchResumeTool;

use std::sync::{Arc, Mutex};

use crate::fields::FieldRegistry;
use crate::resume::ResumeQuery;

/// 注册全部 8 个填表工具
pub fn build_registry(
    resume: Arc<ResumeQuery>,
    fields: Arc<Mutex<FieldRegistry>>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(AnalyzeResumeTool::new(resume.clone()));
    registry.register(ResumeSectionTool::new(resume.clone()));
    registry.register(SearchResumeTool::new(resume));
    registry.register(NextFieldTool::new(fields.clone()));
    registry.register(CheckFieldTool::new(fields.clone()));
    registry.register(FillFieldTool::new(fields.clone()));
    registry.register(ListFieldsTool::new(fields.clone()));
    registry.register(SaveProgressTool::new(fields));
    registry
}
