//! 单次运行的预算与瞬时状态
//!
//! RunBudget 将循环中的魔法数字（最大调用数 / 连续错误数 / 墙钟时限）收敛为显式策略对象；
//! RunState 持有一次 run_agent 调用期间的全部可变计数器，运行结束即丢弃。

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 默认最大工具调用总数
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;
/// 默认最大连续错误数（熔断阈值）
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;
/// 默认墙钟预算（毫秒）
pub const DEFAULT_MAX_RUN_TIME_MS: u64 = 300_000;
/// 同一字段失败达到该次数后永久跳过
pub const DEFAULT_MAX_FIELD_ATTEMPTS: u32 = 3;

/// 运行预算：循环在每次工具调用后检查，任一耗尽则提前终止（正常终止，非错误）
#[derive(Debug, Clone)]
pub struct RunBudget {
    /// 工具调用总数上限
    pub max_attempts: u32,
    /// 连续错误熔断阈值
    pub max_consecutive_errors: u32,
    /// 墙钟时限
    pub max_run_time: Duration,
    /// 单字段失败上限，达到后该字段本轮不再尝试
    pub max_field_attempts: u32,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            max_run_time: Duration::from_millis(DEFAULT_MAX_RUN_TIME_MS),
            max_field_attempts: DEFAULT_MAX_FIELD_ATTEMPTS,
        }
    }
}

/// 终止原因：对应循环的五个终止条件 + 取消 + 传输失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 字段游标已走完（模型收到过 remaining: 0）
    FieldsExhausted,
    /// 本轮回复未解析出任何 tool call
    NoToolCalls,
    /// 工具调用总数耗尽
    AttemptBudget,
    /// 连续错误熔断
    ErrorStorm,
    /// 墙钟预算耗尽
    TimeBudget,
    /// 取消令牌触发
    Cancelled,
    /// 模型传输层失败
    TransportFailed,
}

/// 一次运行的瞬时状态：仅在 run_agent 内部存活
#[derive(Debug)]
pub struct RunState {
    /// 已派发的工具调用总数
    pub attempts_used: u32,
    /// 连续错误计数，任一成功执行即清零
    pub consecutive_errors: u32,
    /// fill_field 失败次数，按字段 id 记
    pub field_attempts: HashMap<String, u32>,
    pub started_at: Instant,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            attempts_used: 0,
            consecutive_errors: 0,
            field_attempts: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// 记录一次 fill_field 失败，返回该字段累计失败数
    pub fn record_field_failure(&mut self, field_id: &str) -> u32 {
        let count = self.field_attempts.entry(field_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// 该字段是否已达失败上限（永久跳过）
    pub fn field_abandoned(&self, field_id: &str, budget: &RunBudget) -> bool {
        self.field_attempts
            .get(field_id)
            .is_some_and(|c| *c >= budget.max_field_attempts)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 检查全局预算，耗尽则返回对应终止原因
    pub fn budget_exceeded(&self, budget: &RunBudget) -> Option<StopReason> {
        if self.attempts_used >= budget.max_attempts {
            return Some(StopReason::AttemptBudget);
        }
        if self.consecutive_errors >= budget.max_consecutive_errors {
            return Some(StopReason::ErrorStorm);
        }
        if self.elapsed() >= budget.max_run_time {
            return Some(StopReason::TimeBudget);
        }
        None
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
