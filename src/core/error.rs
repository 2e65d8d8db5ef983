//! 评论回复流程的错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：Agent 循环内根据 ReviewError 决定 RetryWithPrompt / Degrade / Abort。

use thiserror::Error;

/// 一次评论处理中可能出现的错误
///
/// SchemaViolation / AgentLoopExceeded / IndexBuildFailure / Llm 对调用方是致命的；
/// 工具类错误（ToolUnavailable / ToolTimeout / UnknownTool）在负面回复策略内部被降级为安抚回复。
#[derive(Error, Debug)]
pub enum ReviewError {
    /// 分类器输出不符合 ReviewAssessment 结构
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// 检索后端失败（向量库不可用、嵌入调用失败等）
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 工具调用循环在上限内未产出最终回复
    #[error("Agent loop exceeded {0} iterations")]
    AgentLoopExceeded(usize),

    /// 说明书索引构建失败（加载 / 分块 / 嵌入 / 持久化），不会留下部分索引
    #[error("Index build failure: {0}")]
    IndexBuildFailure(String),

    /// 模型输出的工具调用 JSON 无法解析
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 将提示注入下一轮，让 LLM 重新输出（如工具调用 JSON 格式错误）
    RetryWithPrompt(String),
    /// 工具失败：把失败说明作为 Observation 回写，引导模型生成安抚性回复
    Degrade(String),
    /// 终止当前调用，错误原样上抛
    Abort,
}
