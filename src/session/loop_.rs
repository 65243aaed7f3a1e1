//! 填表主循环
//!
//! Seeding -> AwaitingModel -> DispatchingTools -> ... -> Terminated：
//! 把完整对话发给模型传输层，解析回复中的工具调用并逐个派发，结果折回对话，
//! 直到字段游标走完 / 无工具调用 / 预算耗尽 / 连续错误熔断 / 取消。
//! 单线程严格顺序：一次运行一个对话、一个在途模型请求，无并行派发。

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::{AgentError, RunBudget, RunState, StopReason};
use crate::fields::{FieldRegistry, FilledField};
use crate::llm::{ChatMessage, ModelTransport, NativeToolCall, SendOptions};
use crate::parse::{parse_response, ToolCallRequest};
use crate::session::events::AgentEvent;
use crate::session::prompt;
use crate::tools::ToolExecutor;

/// 事件与日志中工具结果预览的最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

/// 一次运行的最终产物：已填字段、可读摘要与终止原因
#[derive(Debug)]
pub struct RunReport {
    pub fields: Vec<FilledField>,
    /// 形如 "2/5 fields"
    pub summary: String,
    /// 仅传输层失败时为 true；预算耗尽等都是预期内的正常终止
    pub error: bool,
    pub stop: StopReason,
    /// 最终对话记录，供调试与上层展示
    pub messages: Vec<ChatMessage>,
}

/// 填表会话配置：组件引用与运行参数
pub struct FillSession<'a> {
    pub transport: &'a dyn ModelTransport,
    pub executor: &'a ToolExecutor,
    pub registry: &'a Arc<Mutex<FieldRegistry>>,
    pub budget: &'a RunBudget,
    pub send_options: SendOptions,
    pub cancel_token: CancellationToken,
    pub event_tx: Option<&'a mpsc::UnboundedSender<AgentEvent>>,
}

fn send_event(tx: &Option<&mpsc::UnboundedSender<AgentEvent>>, ev: AgentEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > RESULT_PREVIEW_CHARS {
        format!("{}...", text.chars().take(RESULT_PREVIEW_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 执行填表循环直至任一终止条件成立
pub async fn fill_loop(session: &FillSession<'_>) -> RunReport {
    let event_tx = session.event_tx;
    let definitions = session.executor.definitions();
    let mut state = RunState::new();

    // Seeding：工具目录 + 完成度计数拼 system，user 陈述字段总数
    let (completed, total) = {
        let registry = lock_registry(session.registry);
        (registry.completed_count(), registry.total())
    };
    let mut messages = vec![
        ChatMessage::system(prompt::system_prompt(&definitions, completed, total)),
        ChatMessage::user(prompt::user_prompt(total)),
    ];

    let stop = 'run: loop {
        if session.cancel_token.is_cancelled() {
            break StopReason::Cancelled;
        }
        if let Some(reason) = state.budget_exceeded(session.budget) {
            break reason;
        }
        send_event(&event_tx, AgentEvent::StepUpdate {
            attempts: state.attempts_used,
            max_attempts: session.budget.max_attempts,
        });

        // AwaitingModel：传输失败对本轮致命，带部分结果终止（重试属传输层职责）
        send_event(&event_tx, AgentEvent::ModelCall);
        let response = match session
            .transport
            .send(&messages, Some(&definitions), &session.send_options)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let err = AgentError::Transport(e);
                tracing::warn!(error = %err, "model transport failed, terminating run");
                send_event(&event_tx, AgentEvent::Error {
                    text: err.to_string(),
                });
                break StopReason::TransportFailed;
            }
        };

        // DispatchingTools：零调用是正常终止，不是错误
        let calls = parse_response(&response);
        if calls.is_empty() {
            messages.push(ChatMessage::assistant(response.content));
            break StopReason::NoToolCalls;
        }

        for call in calls {
            state.attempts_used += 1;
            send_event(&event_tx, AgentEvent::ToolCall {
                tool: call.tool.clone(),
                args: args_value(&call),
            });

            // 失败达上限的字段永久跳过，即便模型再次点名
            if call.tool == "fill_field" {
                if let Some(field_id) = call.arg("field_id") {
                    if state.field_abandoned(field_id, session.budget) {
                        messages.push(ChatMessage::assistant(format!(
                            "Field '{}' has already failed {} times and is skipped for the rest \
                             of this run. Do not retry it; continue with get_next_field.",
                            field_id, session.budget.max_field_attempts,
                        )));
                        send_event(&event_tx, AgentEvent::FieldSkipped {
                            field_id: field_id.to_string(),
                        });
                        if let Some(reason) = state.budget_exceeded(session.budget) {
                            break 'run reason;
                        }
                        continue;
                    }
                }
            }

            match session.executor.execute(&call.tool, args_value(&call)).await {
                Ok(result) => {
                    state.consecutive_errors = 0;
                    // 回显调用 + 按 id 关联的工具结果消息
                    messages.push(ChatMessage::assistant_tool_calls(vec![NativeToolCall {
                        id: call.id.clone(),
                        name: call.tool.clone(),
                        arguments: args_value(&call),
                    }]));
                    messages.push(ChatMessage::tool_result(call.id.clone(), result.clone()));
                    send_event(&event_tx, AgentEvent::ToolResult {
                        tool: call.tool.clone(),
                        preview: preview(&result),
                    });
                    if call.tool == "fill_field" {
                        let percent = lock_registry(session.registry).completion_percentage();
                        send_event(&event_tx, AgentEvent::Progress { percent });
                    }
                }
                Err(e) => {
                    state.consecutive_errors += 1;
                    // 诊断消息写回对话让模型自行纠正，不做 tool-role 回显
                    messages.push(ChatMessage::assistant(format!(
                        "Tool {} failed: {}. Correct the arguments and try again, or move on.",
                        call.tool, e,
                    )));
                    send_event(&event_tx, AgentEvent::ToolFailure {
                        tool: call.tool.clone(),
                        reason: e.to_string(),
                    });
                    if call.tool == "fill_field" {
                        if let Some(field_id) = call.arg("field_id") {
                            let count = state.record_field_failure(field_id);
                            if count >= session.budget.max_field_attempts {
                                messages.push(ChatMessage::assistant(format!(
                                    "Field '{}' has failed {} times. Skip it and continue \
                                     with the next field.",
                                    field_id, count,
                                )));
                                send_event(&event_tx, AgentEvent::FieldSkipped {
                                    field_id: field_id.to_string(),
                                });
                            }
                        }
                    }
                }
            }

            // 每次派发后都可短路：调用数 / 连续错误 / 墙钟
            if let Some(reason) = state.budget_exceeded(session.budget) {
                break 'run reason;
            }
            if session.cancel_token.is_cancelled() {
                break 'run StopReason::Cancelled;
            }
        }

        // 模型已观察到游标走完（收到过 remaining: 0）即终止
        if lock_registry(session.registry).cursor_exhausted() {
            break StopReason::FieldsExhausted;
        }
    };

    // Terminated：无论因何终止都产出部分结果
    let (fields, total) = {
        let registry = lock_registry(session.registry);
        (registry.completed_fields(), registry.total())
    };
    let summary = format!("{}/{} fields", fields.len(), total);
    send_event(&event_tx, AgentEvent::Done {
        summary: summary.clone(),
    });
    tracing::info!(summary = %summary, stop = ?stop, attempts = state.attempts_used, "fill run terminated");

    RunReport {
        fields,
        summary,
        error: stop == StopReason::TransportFailed,
        stop,
        messages,
    }
}

/// 规范调用的参数转 JSON 对象
fn args_value(call: &ToolCallRequest) -> serde_json::Value {
    serde_json::Value::Object(
        call.args
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}

/// 单一持有者顺序使用，锁中毒只可能来自本线程之前的 panic；取回内部值继续
fn lock_registry<'a>(
    registry: &'a Arc<Mutex<FieldRegistry>>,
) -> std::sync::MutexGuard<'a, FieldRegistry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}
