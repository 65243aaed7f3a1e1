//! 表单字段注册表
//!
//! 持有外部「表单发现」协作者给出的有序字段列表；游标严格单调前进（不支持回看），
//! 已填值按 id 去重（后写覆盖），随时可取与游标无关的全量快照。
//! 仅限单次运行内单一持有者使用，不跨运行共享。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resume::Confidence;

/// 目标表单字段：注册后不可变，身份以 id 为准（id 非空由表单发现协作者保证）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
}

impl FormField {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        field_type: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type: field_type.into(),
            required,
        }
    }
}

/// 已填字段：仅由成功的 fill_field 产生，每 id 至多一条
#[derive(Clone, Debug, Serialize)]
pub struct FilledField {
    pub id: String,
    pub value: String,
    pub confidence: Confidence,
}

/// next_field 的结果：游标前进一格返回字段，或已走完
#[derive(Debug)]
pub enum NextField<'a> {
    Field {
        field: &'a FormField,
        /// 本字段在列表中的序号（0 起）
        index: usize,
        /// 本字段之后还剩多少个
        remaining: usize,
    },
    /// 游标已走完全部字段
    Exhausted,
}

/// 与游标无关的进度快照
#[derive(Clone, Debug, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub percentage: u8,
}

/// 字段注册表：有序字段 + 单调游标 + 已填映射
pub struct FieldRegistry {
    fields: Vec<FormField>,
    cursor: usize,
    /// 模型是否已经观察到 remaining: 0（即 next_field 在走完后又被调用过）
    observed_exhausted: bool,
    completed: BTreeMap<String, FilledField>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            cursor: 0,
            observed_exhausted: false,
            completed: BTreeMap::new(),
        }
    }

    /// 顺序取下一个字段；游标前进是副作用，走完后每次调用都返回 Exhausted
    pub fn next_field(&mut self) -> NextField<'_> {
        if self.cursor >= self.fields.len() {
            self.observed_exhausted = true;
            return NextField::Exhausted;
        }
        let index = self.cursor;
        self.cursor += 1;
        NextField::Field {
            field: &self.fields[index],
            index,
            remaining: self.fields.len() - self.cursor,
        }
    }

    /// 按 id 随机访问字段详情
    pub fn check_field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// 填入字段值；同 id 重复填写以最后一次为准
    pub fn fill_field(
        &mut self,
        id: &str,
        value: impl Into<String>,
        confidence: Confidence,
    ) -> Option<FilledField> {
        self.check_field(id)?;
        let filled = FilledField {
            id: id.to_string(),
            value: value.into(),
            confidence,
        };
        self.completed.insert(id.to_string(), filled.clone());
        Some(filled)
    }

    /// 全量字段列表（与游标无关），供模型整体规划
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn is_filled(&self, id: &str) -> bool {
        self.completed.contains_key(id)
    }

    pub fn total(&self) -> usize {
        self.fields.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// 已填字段按表单原始顺序导出（fill_field 已保证 completed 的 id 都在字段列表中）
    pub fn completed_fields(&self) -> Vec<FilledField> {
        self.fields
            .iter()
            .filter_map(|f| self.completed.get(&f.id).cloned())
            .collect()
    }

    /// 完成百分比（0-100，整数截断）
    pub fn completion_percentage(&self) -> u8 {
        if self.fields.is_empty() {
            return 100;
        }
        ((self.completed.len() * 100) / self.fields.len()) as u8
    }

    /// 进度检查点快照，无副作用
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total(),
            completed: self.completed_count(),
            percentage: self.completion_percentage(),
        }
    }

    /// 游标是否已被模型观察到走完（运行终止条件之一）
    pub fn cursor_exhausted(&self) -> bool {
        self.observed_exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> Vec<FormField> {
        vec![
            FormField::new("name", "Full Name", "text", true),
            FormField::new("email", "Email", "email", true),
            FormField::new("phone", "Phone", "tel", false),
        ]
    }

    #[test]
    fn test_cursor_monotonicity() {
        let mut registry = FieldRegistry::new(sample_fields());
        let mut seen = Vec::new();
        // N 个字段恰好 N 次非终止结果
        for _ in 0..3 {
            match registry.next_field() {
                NextField::Field { field, .. } => seen.push(field.id.clone()),
                NextField::Exhausted => panic!("exhausted too early"),
            }
        }
        assert_eq!(seen, vec!["name", "email", "phone"]);
        assert!(!registry.cursor_exhausted());
        // 第 N+1 次返回 Exhausted，且之后一直如此
        assert!(matches!(registry.next_field(), NextField::Exhausted));
        assert!(registry.cursor_exhausted());
        assert!(matches!(registry.next_field(), NextField::Exhausted));
    }

    #[test]
    fn test_next_field_remaining_counts() {
        let mut registry = FieldRegistry::new(sample_fields());
        match registry.next_field() {
            NextField::Field { index, remaining, .. } => {
                assert_eq!(index, 0);
                assert_eq!(remaining, 2);
            }
            NextField::Exhausted => panic!(),
        }
        registry.next_field();
        match registry.next_field() {
            NextField::Field { index, remaining, .. } => {
                assert_eq!(index, 2);
                assert_eq!(remaining, 0);
            }
            NextField::Exhausted => panic!(),
        }
    }

    #[test]
    fn test_refill_last_write_wins() {
        let mut registry = FieldRegistry::new(sample_fields());
        registry.fill_field("name", "v1", Confidence::High).unwrap();
        registry.fill_field("name", "v2", Confidence::Low).unwrap();
        let filled = registry.completed_fields();
        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].value, "v2");
        assert_eq!(filled[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_fill_unknown_field() {
        let mut registry = FieldRegistry::new(sample_fields());
        assert!(registry.fill_field("nope", "v", Confidence::Medium).is_none());
        assert_eq!(registry.completed_count(), 0);
    }

    #[test]
    fn test_completion_percentage() {
        let mut registry = FieldRegistry::new(sample_fields());
        assert_eq!(registry.completion_percentage(), 0);
        registry.fill_field("name", "Jane", Confidence::High).unwrap();
        assert_eq!(registry.completion_percentage(), 33);
        registry.fill_field("email", "j@x.com", Confidence::High).unwrap();
        registry.fill_field("phone", "555", Confidence::Medium).unwrap();
        assert_eq!(registry.completion_percentage(), 100);
        assert_eq!(FieldRegistry::new(vec![]).completion_percentage(), 100);
    }

    #[test]
    fn test_completed_fields_keep_form_order() {
        let mut registry = FieldRegistry::new(sample_fields());
        registry.fill_field("phone", "555", Confidence::Medium).unwrap();
        registry.fill_field("name", "Jane", Confidence::High).unwrap();
        let filled = registry.completed_fields();
        assert_eq!(filled[0].id, "name");
        assert_eq!(filled[1].id, "phone");
    }
}
