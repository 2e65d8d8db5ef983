//! Review Agent - 电商评论智能回复
//!
//! 模块划分：
//! - **agent**: 无头 Agent 运行时（CLI 等前端调用）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、恢复策略、后端装配
//! - **knowledge**: 说明书加载、分块、嵌入索引与检索
//! - **llm**: LLM 与嵌入客户端抽象及实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: 日志初始化
//! - **react**: Planner 与有上限的工具调用循环
//! - **review**: 评论分类、路由与回复策略
//! - **tools**: 工具注册表、执行器与说明书检索工具
//! - **workflow**: 评论回复工作流（状态、图、构建器、过程事件）

pub mod agent;
pub mod config;
pub mod core;
pub mod knowledge;
pub mod llm;
pub mod observability;
pub mod react;
pub mod review;
pub mod tools;
pub mod workflow;

pub use agent::ReviewAgent;
pub use crate::core::ReviewError;
pub use workflow::{ReviewOutcome, ReviewWorkflow, WorkflowBuilder, WorkflowEvent};
