//! 填表循环集成测试
//!
//! 用 Scripted / 本地状态机传输驱动完整 run_agent，覆盖：预算终止、单字段跳过、
//! 连续错误熔断、传输失败带部分结果、无工具调用终止与端到端填表场景。

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use formbee::core::RunBudget;
    use formbee::llm::{
        ChatMessage, FailingTransport, ModelResponse, ModelTransport, Role, ScriptedTransport,
        SendOptions, ToolDefinition,
    };
    use formbee::{run_agent, AgentEvent, FormField, RunOptions, StopReason};

    fn init_logs() {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn two_fields() -> Vec<FormField> {
        vec![
            FormField::new("name", "Full Name", "text", true),
            FormField::new("email", "Email", "email", true),
        ]
    }

    fn five_fields() -> Vec<FormField> {
        (1..=5)
            .map(|i| FormField::new(format!("f{i}"), format!("Field {i}"), "text", false))
            .collect()
    }

    fn next_field_response(call_id: &str) -> ModelResponse {
        ModelResponse::calls(vec![(call_id, "get_next_field", json!({}))])
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AgentEvent>) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn test_budget_terminates_after_exact_attempts() {
        init_logs();
        // maxAttempts = 3，模型每轮返回一个合法 get_next_field：恰好 3 次派发后正常终止
        let transport = Arc::new(ScriptedTransport::new(vec![
            next_field_response("c1"),
            next_field_response("c2"),
            next_field_response("c3"),
            next_field_response("c4"),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = RunOptions::default()
            .with_budget(RunBudget {
                max_attempts: 3,
                ..RunBudget::default()
            })
            .with_event_tx(tx);

        let report = run_agent("Jane Doe\n", five_fields(), transport, options).await;

        assert_eq!(report.stop, StopReason::AttemptBudget);
        assert!(!report.error);
        let dispatched = drain(&mut rx)
            .iter()
            .filter(|ev| matches!(ev, AgentEvent::ToolCall { .. }))
            .count();
        assert_eq!(dispatched, 3);
    }

    #[tokio::test]
    async fn test_unknown_field_abandoned_after_three_failures() {
        init_logs();
        // 同一个不存在的 id 连填 4 次：前 3 次执行失败，第 4 次不再执行直接跳过
        let bad_fill = |id: &str| {
            ModelResponse::calls(vec![(
                id,
                "fill_field",
                json!({"field_id": "ghost", "value": "x"}),
            )])
        };
        let transport = Arc::new(ScriptedTransport::new(vec![
            bad_fill("c1"),
            bad_fill("c2"),
            bad_fill("c3"),
            bad_fill("c4"),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = RunOptions::default()
            .with_budget(RunBudget {
                max_consecutive_errors: 10,
                ..RunBudget::default()
            })
            .with_event_tx(tx);

        let report = run_agent("Jane Doe\n", two_fields(), transport, options).await;

        // 队列耗尽后回落为纯文本回复，按「无工具调用」正常收尾
        assert_eq!(report.stop, StopReason::NoToolCalls);
        assert!(!report.error);
        assert!(report.fields.is_empty());
        let events = drain(&mut rx);
        let failures = events
            .iter()
            .filter(|ev| matches!(ev, AgentEvent::ToolFailure { .. }))
            .count();
        assert_eq!(failures, 3, "the 4th attempt must not be executed");
        assert!(events
            .iter()
            .any(|ev| matches!(ev, AgentEvent::FieldSkipped { field_id } if field_id == "ghost")));
    }

    #[tokio::test]
    async fn test_consecutive_error_circuit_breaker() {
        init_logs();
        // 每次都填不同的未知 id，绕开单字段上限，触发连续错误熔断（默认 5）
        let responses = (1..=6)
            .map(|i| {
                ModelResponse::calls(vec![(
                    format!("c{i}").as_str(),
                    "fill_field",
                    json!({"field_id": format!("ghost{i}"), "value": "x"}),
                )])
            })
            .collect();
        let transport = Arc::new(ScriptedTransport::new(responses));

        let report = run_agent("Jane Doe\n", two_fields(), transport, RunOptions::default()).await;

        assert_eq!(report.stop, StopReason::ErrorStorm);
        assert!(!report.error);
        assert_eq!(report.summary, "0/2 fields");
    }

    #[tokio::test]
    async fn test_wall_clock_budget_terminates() {
        init_logs();
        // 墙钟预算为零：首轮预算检查即终止，一次模型调用都不发
        let transport = Arc::new(ScriptedTransport::new(vec![
            next_field_response("c1"),
            next_field_response("c2"),
        ]));
        let options = RunOptions::default().with_budget(RunBudget {
            max_run_time: Duration::ZERO,
            ..RunBudget::default()
        });

        let report = run_agent("Jane Doe\n", two_fields(), transport, options).await;

        assert_eq!(report.stop, StopReason::TimeBudget);
        assert!(!report.error);
        assert!(report.fields.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_returns_partial_result() {
        init_logs();
        let transport = Arc::new(FailingTransport("connection refused".to_string()));
        let report = run_agent("Jane Doe\n", two_fields(), transport, RunOptions::default()).await;

        assert_eq!(report.stop, StopReason::TransportFailed);
        assert!(report.error);
        assert!(report.fields.is_empty());
        assert_eq!(report.summary, "0/2 fields");
    }

    #[tokio::test]
    async fn test_plain_text_reply_ends_run() {
        init_logs();
        let transport = Arc::new(ScriptedTransport::new(vec![ModelResponse::text(
            "I don't see any form here.",
        )]));
        let report = run_agent("Jane Doe\n", two_fields(), transport, RunOptions::default()).await;

        assert_eq!(report.stop, StopReason::NoToolCalls);
        assert!(!report.error);
        // 原始回复作为 assistant 消息收尾
        let last = report.messages.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.contains("any form"));
    }

    #[tokio::test]
    async fn test_textual_tool_call_shapes_drive_the_loop() {
        init_logs();
        // 文本形态（JSON action / 直调语法）也能驱动循环
        let transport = Arc::new(ScriptedTransport::new(vec![
            ModelResponse::text(
                r#"{"action": "fill_field", "field_id": "name", "value": "Jane Doe", "confidence": "High"}"#,
            ),
            ModelResponse::text(r#"fill_field("email", "jane@x.com", "Medium")"#),
        ]));
        let report = run_agent("Jane Doe\n", two_fields(), transport, RunOptions::default()).await;

        assert_eq!(report.summary, "2/2 fields");
        assert_eq!(report.fields[0].value, "Jane Doe");
        assert_eq!(report.fields[1].value, "jane@x.com");
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        init_logs();
        let transport = Arc::new(ScriptedTransport::new(vec![next_field_response("c1")]));
        let options = RunOptions::default();
        options.cancel_token.cancel();
        let report = run_agent("Jane Doe\n", two_fields(), transport, options).await;
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(report.fields.is_empty());
    }

    /// 端到端场景用的本地状态机模型：get_next_field -> search_resume -> fill_field 循环，
    /// 始终使用工具结果里返回的确切 field_id，值取检索首条匹配
    struct FormFillerModel {
        pending_field: Mutex<Option<String>>,
        counter: Mutex<u32>,
    }

    impl FormFillerModel {
        fn new() -> Self {
            Self {
                pending_field: Mutex::new(None),
                counter: Mutex::new(0),
            }
        }

        fn call_id(&self) -> String {
            let mut c = self.counter.lock().unwrap();
            *c += 1;
            format!("call_{c}")
        }

        fn query_for(field_id: &str) -> &'static str {
            match field_id {
                "name" => "Jane",
                "email" => "@",
                _ => "experience",
            }
        }
    }

    #[async_trait]
    impl ModelTransport for FormFillerModel {
        async fn send(
            &self,
            messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
            _options: &SendOptions,
        ) -> Result<ModelResponse, String> {
            let last_tool: Option<Value> = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::Tool)
                .filter(|_| messages.last().map(|m| m.role) == Some(Role::Tool))
                .and_then(|m| serde_json::from_str(&m.content).ok());

            let response = match last_tool {
                // 开局或上一结果不是工具消息：推进到下一个字段
                None => ModelResponse::calls(vec![(
                    self.call_id().as_str(),
                    "get_next_field",
                    json!({}),
                )]),
                Some(result) => {
                    if let Some(field_id) = result.get("field_id").and_then(|v| v.as_str()) {
                        // get_next_field 的结果：记住 id，去检索
                        *self.pending_field.lock().unwrap() = Some(field_id.to_string());
                        ModelResponse::calls(vec![(
                            self.call_id().as_str(),
                            "search_resume",
                            json!({"query": Self::query_for(field_id)}),
                        )])
                    } else if let Some(matches) = result.get("matches").and_then(|v| v.as_array()) {
                        // search_resume 的结果：用首条匹配填当前字段
                        let value = matches
                            .first()
                            .and_then(|m| m.get("text"))
                            .and_then(|v| v.as_str())
                            .unwrap_or("No information available");
                        let field_id = self
                            .pending_field
                            .lock()
                            .unwrap()
                            .clone()
                            .unwrap_or_default();
                        ModelResponse::calls(vec![(
                            self.call_id().as_str(),
                            "fill_field",
                            json!({"field_id": field_id, "value": value, "confidence": "High"}),
                        )])
                    } else if result.get("filled").is_some() {
                        // fill_field 的结果：继续下一个字段
                        ModelResponse::calls(vec![(
                            self.call_id().as_str(),
                            "get_next_field",
                            json!({}),
                        )])
                    } else {
                        // remaining: 0 等其他结果：结束
                        ModelResponse::text("All fields are done.")
                    }
                }
            };
            Ok(response)
        }
    }

    #[tokio::test]
    async fn test_end_to_end_two_field_form() {
        init_logs();
        let resume = "Jane Doe\njane@x.com\nEducation: Bachelor of Science\n";
        let transport = Arc::new(FormFillerModel::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = RunOptions::default().with_event_tx(tx);

        let report = run_agent(resume, two_fields(), transport, options).await;

        assert_eq!(report.summary, "2/2 fields");
        assert!(!report.error);
        assert_eq!(report.stop, StopReason::FieldsExhausted);

        let name = report.fields.iter().find(|f| f.id == "name").unwrap();
        assert!(name.value.contains("Jane Doe"));
        let email = report.fields.iter().find(|f| f.id == "email").unwrap();
        assert!(email.value.contains("jane@x.com"));

        // 每次成功填写后推送进度：2 个字段 -> 50%、100%
        let percents: Vec<u8> = drain(&mut rx)
            .iter()
            .filter_map(|ev| match ev {
                AgentEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![50, 100]);
    }
}
