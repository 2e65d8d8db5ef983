//! 评论回复工作流
//!
//! 固定的有向图：analyze_review -> (路由) -> 三个回复节点之一 -> END。
//! 每次调用拥有自己的状态，并发调用互不影响；图本身只持有共享的只读依赖。

use std::sync::Arc;

use crate::core::ReviewError;
use crate::review::{
    default_reply, positive_reply, route, Classifier, NegativeReplyStrategy, ReviewInput,
    StrategyId,
};
use crate::workflow::events::{send_event, EventSink, WorkflowEvent};
use crate::workflow::state::{ReviewOutcome, WorkflowState};

/// 入口节点名
pub const ANALYZE_NODE: &str = "analyze_review";

/// 已编译的工作流（构建后不可变，可跨任务共享）
pub struct ReviewWorkflow {
    classifier: Arc<dyn Classifier>,
    negative: NegativeReplyStrategy,
}

impl ReviewWorkflow {
    pub fn new(classifier: Arc<dyn Classifier>, negative: NegativeReplyStrategy) -> Self {
        Self { classifier, negative }
    }

    /// 图中的节点名（按声明顺序）
    pub fn node_names(&self) -> [&'static str; 4] {
        [
            ANALYZE_NODE,
            StrategyId::ToolAugmentedNegative.node_name(),
            StrategyId::PositiveNeutral.node_name(),
            StrategyId::Default.node_name(),
        ]
    }

    pub fn max_iterations(&self) -> usize {
        self.negative.max_iterations()
    }

    /// 处理一条评论，返回最终回复
    pub async fn invoke(&self, review: &str) -> Result<String, ReviewError> {
        Ok(self.run(review, None).await?.final_reply)
    }

    /// 处理一条评论并通过 event_tx 推送过程事件
    pub async fn run(
        &self,
        review: &str,
        event_tx: Option<&EventSink>,
    ) -> Result<ReviewOutcome, ReviewError> {
        let state = WorkflowState::new(ReviewInput::new(review));
        let review_id = uuid::Uuid::new_v4();

        send_event(
            event_tx,
            WorkflowEvent::NodeStarted {
                node: ANALYZE_NODE.to_string(),
            },
        );
        let assessment = self.classifier.classify(state.input()).await.map_err(|e| {
            tracing::warn!(%review_id, error = %e, "classification failed");
            e
        })?;
        send_event(
            event_tx,
            WorkflowEvent::Classified {
                assessment: assessment.clone(),
            },
        );
        let state = state.classified(assessment);

        let strategy = route(state.assessment());
        tracing::info!(%review_id, node = strategy.node_name(), "routed");
        send_event(event_tx, WorkflowEvent::Routed { strategy });
        send_event(
            event_tx,
            WorkflowEvent::NodeStarted {
                node: strategy.node_name().to_string(),
            },
        );

        let reply = match strategy {
            StrategyId::ToolAugmentedNegative => {
                self.negative.respond(state.input(), event_tx).await?
            }
            StrategyId::PositiveNeutral => positive_reply().to_string(),
            StrategyId::Default => default_reply().to_string(),
        };
        let state = state.replied(strategy, reply);

        send_event(
            event_tx,
            WorkflowEvent::Finished {
                strategy: state.strategy(),
                reply: state.reply().to_string(),
            },
        );
        tracing::info!(%review_id, strategy = %state.strategy(), "review replied");
        Ok(state.finish())
    }
}
