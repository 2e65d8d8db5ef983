//! 错误恢复引擎
//!
//! 根据 ReviewError 类型返回 RecoveryAction，供工具调用循环决定是重试、降级还是终止。

use crate::core::{RecoveryAction, ReviewError};

/// 语义化错误恢复：将错误映射为可执行动作（重试提示 / 降级 / 终止）
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &ReviewError) -> RecoveryAction {
        match err {
            ReviewError::JsonParseError(raw) => {
                RecoveryAction::RetryWithPrompt(format!(
                    "上一轮输出的工具调用 JSON 格式错误: {raw}。\
                    调用工具时你必须只输出一个合法的 JSON 对象，格式为: \
                    {{\"tool\": \"工具名\", \"args\": {{...}}}}；\
                    如果不需要调用工具，请直接输出给顾客的回复正文，不要包含花括号。"
                ))
            }
            ReviewError::ToolUnavailable(msg) | ReviewError::IndexBuildFailure(msg) => {
                RecoveryAction::Degrade(format!(
                    "工具调用失败（{msg}），说明书暂时无法查询。请不要再调用工具，直接生成真诚、安抚性的回复。"
                ))
            }
            ReviewError::ToolTimeout(tool) => RecoveryAction::Degrade(format!(
                "工具 {tool} 执行超时。请不要再调用工具，直接生成真诚、安抚性的回复。"
            )),
            ReviewError::UnknownTool(tool) => RecoveryAction::Degrade(format!(
                "不存在名为 {tool} 的工具。请直接生成真诚、安抚性的回复。"
            )),
            _ => RecoveryAction::Abort,
        }
    }
}
