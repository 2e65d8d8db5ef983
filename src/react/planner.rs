//! Planner：调用 LLM 并解析输出
//!
//! parse_llm_output 从文本中提取 JSON；含 "tool" 字段的对象解析为 ToolCall，其余文本视为给顾客的最终回复。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::ReviewError;
use crate::llm::{LlmClient, Message};

/// LLM 返回的 Tool Call（{"tool": "read_instructions", "args": {"user_review": "..."}}）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Planner 输出
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerOutput {
    /// 最终回复
    Response(String),
    /// 需要执行工具
    ToolCall(ToolCall),
}

/// 解析 LLM 输出
///
/// - ```json 代码块或首个 `{` 到最后一个 `}` 之间的内容若包含 "tool" 键，按 ToolCall 解析，失败返回 JsonParseError
/// - 其它情况（含普通文本里偶然出现的花括号）一律视为最终回复
pub fn parse_llm_output(output: &str) -> Result<PlannerOutput, ReviewError> {
    let trimmed = output.trim();

    let candidate = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        Some(rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim()))
    } else {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
            _ => None,
        }
    };

    let json_str = match candidate {
        Some(c) if c.contains("\"tool\"") => c,
        _ => return Ok(PlannerOutput::Response(trimmed.to_string())),
    };

    let parsed: ToolCall = serde_json::from_str(json_str)
        .map_err(|e| ReviewError::JsonParseError(format!("{}: {}", e, json_str)))?;

    if parsed.tool.trim().is_empty() {
        Ok(PlannerOutput::Response(trimmed.to_string()))
    } else {
        Ok(PlannerOutput::ToolCall(parsed))
    }
}

/// Planner：持有 LLM 与 system prompt，调用时把 system 拼在对话前
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn plan(&self, messages: &[Message]) -> Result<String, ReviewError> {
        let mut full_messages = Vec::with_capacity(messages.len() + 1);
        full_messages.push(Message::system(self.system_prompt.clone()));
        full_messages.extend_from_slice(messages);
        self.llm
            .complete(&full_messages)
            .await
            .map_err(ReviewError::Llm)
    }
}
