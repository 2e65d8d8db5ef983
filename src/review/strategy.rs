//! 回复策略
//!
//! - 正面/中性、默认：固定话术，无副作用、不会失败
//! - 负面（带工具）：在有上限的工具调用循环里让模型决定是否查说明书，再生成致歉与解决方案；
//!   工具失败或无匹配时降级为安抚性回复，永远不会让回复缺失

use std::sync::Arc;

use crate::core::{RecoveryEngine, ReviewError};
use crate::llm::{LlmClient, Message};
use crate::react::{run_tool_loop, Planner, ToolLoopSession, DEFAULT_MAX_ITERATIONS};
use crate::review::ReviewInput;
use crate::tools::{tool_call_schema_json, ToolExecutor};
use crate::workflow::EventSink;

pub const POSITIVE_REPLY: &str =
    "亲，非常感谢您的认可与支持！您的满意是我们不断前行的动力，期待您的再次光临！";
pub const DEFAULT_REPLY: &str = "感谢您的评价！";
/// 负面回复的兜底：模型没有给出正文时使用
pub const REASSURANCE_REPLY: &str =
    "亲，非常抱歉给您带来了不好的体验！您反馈的问题我们已经记录，客服会尽快与您联系并协助处理，请您放心。";

pub fn positive_reply() -> &'static str {
    POSITIVE_REPLY
}

pub fn default_reply() -> &'static str {
    DEFAULT_REPLY
}

const NEGATIVE_SYSTEM_PROMPT: &str = "你是一个专业的电商客服，负责回复顾客的负面评价。你的回复要真诚、有同理心且专业。\n\
你可以使用下列工具。需要调用工具时，只输出一个 JSON 对象：{\"tool\": \"工具名\", \"args\": {...}}，不要输出其它文字；\
不需要调用工具时，直接输出给顾客的回复正文。";

/// 负面评论的任务描述（与评论一起作为首条 User 消息）
pub fn negative_task_prompt(review: &str) -> String {
    format!(
        "顾客给出了负面评价：'{review}'。\n\
        你的任务是生成一个真诚、有同理心且专业的回复。\n\
        1. 首先，分析用户的评价。如果用户提到了具体产品不会用的问题（例如：不知道如何更换内刀头），你**必须**先使用 `read_instructions` 工具查找解决方案，再回复。\n\
        2. 然后，将工具返回的信息整合到你的最终回复中，先表示歉意，再提供清晰的步骤或解决方案。\n\
        3. 如果用户只是抱怨其他问题（如质量、物流），则无需调用工具，直接生成安抚性的回复，不要涉及技术细节。\n\
        4. 如果你调用工具检索到的信息和用户问题无关，或者工具调用失败，请直接生成安抚性的回复，不要强行使用无关内容。"
    )
}

/// 负面评论回复策略
pub struct NegativeReplyStrategy {
    planner: Planner,
    executor: Arc<ToolExecutor>,
    recovery: RecoveryEngine,
    max_iterations: usize,
}

impl NegativeReplyStrategy {
    pub fn new(llm: Arc<dyn LlmClient>, executor: Arc<ToolExecutor>) -> Self {
        let system = format!(
            "{}\n\nAvailable tools:\n{}\n\nTool call JSON Schema:\n{}",
            NEGATIVE_SYSTEM_PROMPT,
            executor.registry().to_schema_json(),
            tool_call_schema_json()
        );
        Self {
            planner: Planner::new(llm, system),
            executor,
            recovery: RecoveryEngine::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub async fn respond(
        &self,
        review: &ReviewInput,
        event_tx: Option<&EventSink>,
    ) -> Result<String, ReviewError> {
        let session = ToolLoopSession::new(&self.planner, &self.executor, &self.recovery, REASSURANCE_REPLY)
            .with_max_iterations(self.max_iterations)
            .with_event_tx(event_tx);
        let result = run_tool_loop(&session, vec![Message::user(negative_task_prompt(review.text()))]).await?;
        tracing::info!(
            iterations = result.iterations,
            tool_calls = result.tool_calls,
            degraded = result.degraded,
            "negative reply generated"
        );
        Ok(result.response)
    }
}
