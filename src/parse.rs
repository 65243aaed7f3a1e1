//! Tool Call 解析器
//!
//! 不同供应商（甚至同一供应商的不同 prompt）给出的工具调用形态各异：原生结构化 tool_calls、
//! 文本里内嵌的 {"action": ...} JSON、"Tool: xxx" 标注块、tool_name(a, b) 直调语法，
//! 以及只剩只言片语的启发式线索。本模块把这些形态统一归一化为 ToolCallRequest 列表。
//!
//! 各形态探测器为纯函数，按优先级依次尝试，首个产出非空结果的形态即生效；
//! 未知工具名在任何形态下都静默丢弃（「没有调用」是正常终止条件，不是错误）。

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::llm::{ModelResponse, NativeToolCall};
use crate::tools::catalog::{is_known_tool, positional_args};

/// 标注块中 "Tool: xxx" 之后查找 Parameters 的窗口字符数
const LABELED_BLOCK_WINDOW: usize = 200;

/// 规范化后的工具调用请求：无论原始形态如何，统一为 {tool, args}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// 关联请求与其工具结果消息；文本形态下由解析器合成
    pub id: String,
    pub tool: String,
    pub args: HashMap<String, String>,
}

impl ToolCallRequest {
    fn synthesized(tool: &str, args: HashMap<String, String>) -> Self {
        Self {
            id: format!("call-{}", Uuid::new_v4()),
            tool: tool.to_string(),
            args,
        }
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

/// 解析一次模型回复：原生结构化调用优先，其后依次尝试各文本形态
pub fn parse_response(response: &ModelResponse) -> Vec<ToolCallRequest> {
    let native = from_native(&response.tool_calls);
    if !native.is_empty() {
        return native;
    }
    parse_text(&response.content)
}

/// 按优先级尝试各文本形态探测器，首个非空结果生效
pub fn parse_text(text: &str) -> Vec<ToolCallRequest> {
    for detect in [
        detect_json_action,
        detect_labeled_blocks,
        detect_call_syntax,
        detect_heuristic,
    ] {
        let calls = detect(text);
        if !calls.is_empty() {
            return calls;
        }
    }
    Vec::new()
}

/// 形态 1：原生结构化 tool_calls
///
/// arguments 可能是 JSON 对象或 JSON 字符串；字符串按 JSON 再解析，空串与坏 JSON 宽容为 {}。
fn from_native(calls: &[NativeToolCall]) -> Vec<ToolCallRequest> {
    calls
        .iter()
        .filter(|c| is_known_tool(&c.name))
        .map(|c| {
            let args = match &c.arguments {
                Value::Object(map) => map
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_string(v)))
                    .collect(),
                Value::String(s) if s.trim().is_empty() => HashMap::new(),
                Value::String(s) => serde_json::from_str::<Value>(s)
                    .ok()
                    .and_then(|v| v.as_object().cloned())
                    .map(|map| {
                        map.iter()
                            .map(|(k, v)| (k.clone(), value_to_string(v)))
                            .collect()
                    })
                    .unwrap_or_default(),
                _ => HashMap::new(),
            };
            let id = if c.id.is_empty() {
                format!("call-{}", Uuid::new_v4())
            } else {
                c.id.clone()
            };
            ToolCallRequest {
                id,
                tool: c.name.clone(),
                args,
            }
        })
        .collect()
}

/// 形态 2：文本中内嵌的单个 JSON action 对象 {"action": "<tool>", ...}
///
/// 除 action 外的顶层键全部作为参数。
fn detect_json_action(text: &str) -> Vec<ToolCallRequest> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }
        if let Some(candidate) = balanced_object(text, i) {
            if candidate.contains("\"action\"") {
                if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
                    if let Some(tool) = map.get("action").and_then(|v| v.as_str()) {
                        if is_known_tool(tool) {
                            let args = map
                                .iter()
                                .filter(|(k, _)| k.as_str() != "action")
                                .map(|(k, v)| (k.clone(), value_to_string(v)))
                                .collect();
                            return vec![ToolCallRequest::synthesized(tool, args)];
                        }
                    }
                }
            }
        }
        // 候选对象不是合法 action 调用时仅前进一格，嵌套的对象仍有机会命中
        i += 1;
    }
    Vec::new()
}

/// 形态 3：标注块 "Tool: <name>"，其后约 200 字符内可跟 "Parameters: {...}"
///
/// Parameters JSON 坏掉时退化为 "key": "value" 对的正则提取；
/// 完全没有参数块时对 search_resume / fill_field 直接从周边行文抠参数。
fn detect_labeled_blocks(text: &str) -> Vec<ToolCallRequest> {
    let tool_re = tool_label_re();
    let mut out = Vec::new();

    for cap in tool_re.captures_iter(text) {
        let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !is_known_tool(name) {
            continue;
        }
        let after = cap.get(0).map(|m| m.end()).unwrap_or(0);
        let mut window_end = (after + LABELED_BLOCK_WINDOW).min(text.len());
        while !text.is_char_boundary(window_end) {
            window_end -= 1;
        }
        let window = &text[after..window_end];

        let args = match parameters_blob(window) {
            Some(blob) => match serde_json::from_str::<Value>(blob) {
                Ok(Value::Object(map)) => map
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_string(v)))
                    .collect(),
                _ => quoted_pairs(blob),
            },
            None => prose_args(name, window),
        };
        out.push(ToolCallRequest::synthesized(name, args));
    }
    out
}

/// 形态 4：直调语法 tool_name(arg1, arg2, ...)，含代码块内
///
/// 参数按引号感知的逗号切分（朴素逗号切分会拆坏含逗号的值），再按每个工具的固定参数顺序命名。
fn detect_call_syntax(text: &str) -> Vec<ToolCallRequest> {
    let call_re = call_syntax_re();
    let mut found: Vec<(usize, ToolCallRequest)> = Vec::new();

    for cap in call_re.captures_iter(text) {
        let whole = cap.get(0).unwrap();
        let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !is_known_tool(name) {
            continue;
        }
        // 从左括号起引号感知地扫到配对右括号
        let open = whole.end() - 1;
        let Some(close) = matching_paren(text, open) else {
            continue;
        };
        let raw_args = &text[open + 1..close];
        let order = positional_args(name);
        let mut args = HashMap::new();
        for (value, key) in split_quoted(raw_args).into_iter().zip(order.iter()) {
            let value = strip_quotes(value.trim());
            if !value.is_empty() {
                args.insert((*key).to_string(), value.to_string());
            }
        }
        found.push((whole.start(), ToolCallRequest::synthesized(name, args)));
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, call)| call).collect()
}

/// 形态 5：启发式兜底
///
/// "Next field:" 与 get_next_field 同现 -> 合成无参 get_next_field；
/// "ID: ... Value: ..." 模式 -> 合成 fill_field，无 Confidence 行时默认 Medium。
fn detect_heuristic(text: &str) -> Vec<ToolCallRequest> {
    if text.contains("get_next_field") && text.contains("Next field:") {
        return vec![ToolCallRequest::synthesized("get_next_field", HashMap::new())];
    }

    let id_re = heuristic_id_re();
    let value_re = heuristic_value_re();
    if let (Some(id_cap), Some(value_cap)) = (id_re.captures(text), value_re.captures(text)) {
        let mut args = HashMap::new();
        args.insert("field_id".to_string(), id_cap[1].trim().to_string());
        args.insert("value".to_string(), value_cap[1].trim().to_string());
        let confidence = heuristic_confidence_re()
            .captures(text)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "Medium".to_string());
        args.insert("confidence".to_string(), confidence);
        return vec![ToolCallRequest::synthesized("fill_field", args)];
    }
    Vec::new()
}

/// JSON 值转参数字符串：字符串取原文，其余取紧凑 JSON 文本
fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 从 start（须指向 '{'）提取配对的 JSON 对象子串，字符串与转义感知
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// 在窗口内找 "Parameters:" 后面的 JSON 对象子串
///
/// 花括号不配对（被截断的坏 JSON）时取到窗口末尾，交给退化提取。
fn parameters_blob(window: &str) -> Option<&str> {
    let m = parameters_re().find(window)?;
    let brace = window[m.end()..].find('{')? + m.end();
    Some(balanced_object(window, brace).unwrap_or(&window[brace..]))
}

/// 坏 JSON 的退化提取："key": "value" 对
fn quoted_pairs(blob: &str) -> HashMap<String, String> {
    pair_re()
        .captures_iter(blob)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// 无参数块时从行文中抠参数（仅 search_resume 与 fill_field 有此待遇）
fn prose_args(tool: &str, window: &str) -> HashMap<String, String> {
    let mut args = HashMap::new();
    match tool {
        "search_resume" => {
            if let Some(cap) = prose_query_re().captures(window) {
                args.insert("query".to_string(), cap[1].trim().to_string());
            }
        }
        "fill_field" => {
            if let Some(cap) = prose_field_id_re().captures(window) {
                args.insert("field_id".to_string(), cap[1].trim().to_string());
            }
            if let Some(cap) = prose_value_re().captures(window) {
                args.insert("value".to_string(), cap[1].trim().to_string());
            }
            if let Some(cap) = prose_confidence_re().captures(window) {
                args.insert("confidence".to_string(), cap[1].to_string());
            }
        }
        _ => {}
    }
    args
}

/// 从 open（指向 '('）扫到配对右括号，引号感知
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (offset, &b) in bytes[open..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => match b {
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            },
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b')' => return Some(open + offset),
                _ => {}
            },
        }
    }
    None
}

/// 引号感知的逗号切分
fn split_quoted(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) => match b {
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            },
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b',' => {
                    parts.push(&raw[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    if start < raw.len() {
        parts.push(&raw[start..]);
    }
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

/// 去掉成对的首尾引号
fn strip_quotes(s: &str) -> &str {
    let b = s.as_bytes();
    if b.len() >= 2 && (b[0] == b'"' || b[0] == b'\'') && b[b.len() - 1] == b[0] {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

macro_rules! cached_re {
    ($fn_name:ident, $pattern:expr) => {
        fn $fn_name() -> &'static Regex {
            static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

cached_re!(tool_label_re, r"(?i)\btool:\s*([a-z_]+)");
cached_re!(parameters_re, r"(?i)\bparameters\s*:\s*");
cached_re!(pair_re, r#""(\w+)"\s*:\s*"([^"]*)""#);
cached_re!(call_syntax_re, r"\b([a-z_]+)\s*\(");
cached_re!(prose_query_re, r#"(?i)\bquery\s*[:=]\s*"?([^"\n]+)"?"#);
cached_re!(
    prose_field_id_re,
    r#"(?i)\bfield[_ ]?id\s*[:=]\s*"?([A-Za-z0-9_\-\[\].]+)"?"#
);
cached_re!(prose_value_re, r#"(?i)\bvalue\s*[:=]\s*"([^"\n]*)""#);
cached_re!(prose_confidence_re, r"(?i)\bconfidence\s*[:=]\s*\W?(high|medium|low)");
cached_re!(heuristic_id_re, r"(?im)\bID\s*:\s*(\S+)");
cached_re!(heuristic_value_re, r"(?im)\bValue\s*:\s*(.+)$");
cached_re!(heuristic_confidence_re, r"(?im)\bConfidence\s*:\s*(\w+)");
