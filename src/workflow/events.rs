//! 工作流过程事件：供前端流式展示节点执行、路由、工具调用与最终回复

use serde::Serialize;
use tokio::sync::mpsc;

use crate::review::{ReviewAssessment, StrategyId};

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// 节点开始执行
    NodeStarted { node: String },
    /// 分类完成
    Classified { assessment: ReviewAssessment },
    /// 路由结果
    Routed { strategy: StrategyId },
    /// 调用工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览）
    Observation { tool: String, preview: String },
    /// 工具执行失败，已降级
    ToolFailure { tool: String, reason: String },
    /// 最终回复
    Finished { strategy: StrategyId, reply: String },
}

pub type EventSink = mpsc::UnboundedSender<WorkflowEvent>;

/// 接收端已关闭时静默丢弃
pub fn send_event(tx: Option<&EventSink>, ev: WorkflowEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
