//! 工具调用循环（负面回复策略内部使用）
//!
//! 显式状态机：AwaitingModel -> (ToolRequested -> ToolResultReceived -> AwaitingModel)* -> Done。
//! 每次进入 AwaitingModel 计一次迭代，超过上限返回 AgentLoopExceeded。
//! 工具失败经 RecoveryEngine 降级为一条 Observation（引导模型安抚），不会中断循环；
//! 模型最终给出空文本时使用调用方提供的兜底回复，保证总有回复。

use crate::core::{RecoveryAction, RecoveryEngine, ReviewError};
use crate::llm::Message;
use crate::react::{parse_llm_output, Planner, PlannerOutput, ToolCall};
use crate::tools::ToolExecutor;
use crate::workflow::{send_event, EventSink, WorkflowEvent};

/// 未配置时的最大模型调用次数
pub const DEFAULT_MAX_ITERATIONS: usize = 8;
/// Observation 事件预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 循环状态
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    ToolRequested(ToolCall),
    ToolResultReceived { tool: String, observation: String },
    Done(String),
}

/// 循环执行结果
#[derive(Debug, Clone)]
pub struct ToolLoopResult {
    pub response: String,
    /// 模型调用次数
    pub iterations: usize,
    /// 工具调用次数（含失败）
    pub tool_calls: usize,
    /// 是否有工具调用失败
    pub degraded: bool,
}

/// 单次循环所需的协作者
pub struct ToolLoopSession<'a> {
    pub planner: &'a Planner,
    pub executor: &'a ToolExecutor,
    pub recovery: &'a RecoveryEngine,
    pub max_iterations: usize,
    /// 模型最终回复为空时使用
    pub fallback_reply: &'a str,
    pub event_tx: Option<&'a EventSink>,
}

impl<'a> ToolLoopSession<'a> {
    pub fn new(
        planner: &'a Planner,
        executor: &'a ToolExecutor,
        recovery: &'a RecoveryEngine,
        fallback_reply: &'a str,
    ) -> Self {
        Self {
            planner,
            executor,
            recovery,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            fallback_reply,
            event_tx: None,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_event_tx(mut self, tx: Option<&'a EventSink>) -> Self {
        self.event_tx = tx;
        self
    }
}

/// 运行工具调用循环；messages 为初始对话（不含 system，system 由 Planner 拼接）
pub async fn run_tool_loop(
    session: &ToolLoopSession<'_>,
    messages: Vec<Message>,
) -> Result<ToolLoopResult, ReviewError> {
    let mut messages = messages;
    let mut iterations = 0;
    let mut tool_calls = 0;
    let mut degraded = false;
    let mut state = LoopState::AwaitingModel;

    loop {
        state = match state {
            LoopState::AwaitingModel if iterations >= session.max_iterations => {
                if !degraded {
                    tracing::warn!(max = session.max_iterations, "tool loop did not converge");
                    return Err(ReviewError::AgentLoopExceeded(session.max_iterations));
                }
                // 工具已失败过：上限内没收敛也给兜底回复
                tracing::warn!(max = session.max_iterations, "tool loop hit the cap after a tool failure, using fallback");
                LoopState::Done(String::new())
            }
            LoopState::AwaitingModel => {
                iterations += 1;

                let output = session.planner.plan(&messages).await?;
                match parse_llm_output(&output) {
                    Ok(PlannerOutput::Response(text)) => LoopState::Done(text),
                    Ok(PlannerOutput::ToolCall(tc)) => {
                        messages.push(Message::assistant(output));
                        LoopState::ToolRequested(tc)
                    }
                    Err(e) => match session.recovery.handle(&e) {
                        RecoveryAction::RetryWithPrompt(prompt) => {
                            tracing::debug!(error = %e, "retrying after malformed tool call");
                            messages.push(Message::assistant(output));
                            messages.push(Message::user(prompt));
                            LoopState::AwaitingModel
                        }
                        _ => return Err(e),
                    },
                }
            }
            LoopState::ToolRequested(tc) if degraded => {
                // 同一次回复内不再重试失败过的检索
                tracing::warn!(tool = %tc.tool, "tool requested again after a failure, using fallback");
                LoopState::Done(String::new())
            }
            LoopState::ToolRequested(tc) => {
                tool_calls += 1;
                send_event(
                    session.event_tx,
                    WorkflowEvent::ToolCall {
                        tool: tc.tool.clone(),
                        args: tc.args.clone(),
                    },
                );
                let observation = match session.executor.execute(&tc.tool, tc.args).await {
                    Ok(content) => content,
                    Err(e) => match session.recovery.handle(&e) {
                        RecoveryAction::Degrade(note) => {
                            tracing::warn!(tool = %tc.tool, error = %e, "tool failed, degrading to reassurance");
                            degraded = true;
                            send_event(
                                session.event_tx,
                                WorkflowEvent::ToolFailure {
                                    tool: tc.tool.clone(),
                                    reason: e.to_string(),
                                },
                            );
                            note
                        }
                        _ => return Err(e),
                    },
                };
                LoopState::ToolResultReceived {
                    tool: tc.tool,
                    observation,
                }
            }
            LoopState::ToolResultReceived { tool, observation } => {
                let preview: String = observation.chars().take(OBSERVATION_PREVIEW_CHARS).collect();
                send_event(
                    session.event_tx,
                    WorkflowEvent::Observation {
                        tool: tool.clone(),
                        preview,
                    },
                );
                messages.push(Message::user(format!(
                    "工具 {} 返回结果：\n{}\n请根据以上结果继续：需要时可再次调用工具，否则直接输出给顾客的最终回复。",
                    tool, observation
                )));
                LoopState::AwaitingModel
            }
            LoopState::Done(text) => {
                let text = text.trim();
                let response = if text.is_empty() {
                    tracing::warn!("model returned an empty reply, using fallback");
                    session.fallback_reply.to_string()
                } else {
                    text.to_string()
                };
                return Ok(ToolLoopResult {
                    response,
                    iterations,
                    tool_calls,
                    degraded,
                });
            }
        };
    }
}
