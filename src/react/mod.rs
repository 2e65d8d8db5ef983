//! 认知层：Planner（调用 LLM、解析工具调用）与有上限的工具调用循环

pub mod loop_;
pub mod planner;

pub use loop_::{run_tool_loop, ToolLoopResult, ToolLoopSession, DEFAULT_MAX_ITERATIONS};
pub use planner::{parse_llm_output, Planner, PlannerOutput, ToolCall};
