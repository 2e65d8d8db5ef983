//! Headless 评论回复 Agent
//!
//! 供 CLI 与其它前端调用的无界面入口：from_config 按配置装配 LLM、嵌入后端、说明书知识库与工作流，
//! process_review 对单条评论跑完整工作流并返回最终回复，process_review_stream 额外推送过程事件。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::orchestrator::{create_embedder, create_llm_from_config};
use crate::core::ReviewError;
use crate::knowledge::KnowledgeBase;
use crate::llm::LlmClient;
use crate::tools::ReadInstructionsTool;
use crate::workflow::{EventSink, ReviewOutcome, ReviewWorkflow, WorkflowBuilder};

/// 已装配的 Agent，可跨任务共享（内部只有只读依赖）
pub struct ReviewAgent {
    llm: Arc<dyn LlmClient>,
    knowledge: Arc<KnowledgeBase>,
    workflow: ReviewWorkflow,
}

impl ReviewAgent {
    /// 从配置创建 Agent（索引在首次检索或 prepare 时才加载 / 构建）
    pub fn from_config(cfg: &AppConfig) -> Self {
        let llm = create_llm_from_config(cfg);
        let knowledge = Arc::new(
            KnowledgeBase::from_config(&cfg.knowledge, create_embedder(cfg))
                .with_concurrency(cfg.embedding.concurrency),
        );
        Self::with_components(llm, knowledge, cfg)
    }

    /// 使用外部提供的 LLM 与知识库装配
    pub fn with_components(
        llm: Arc<dyn LlmClient>,
        knowledge: Arc<KnowledgeBase>,
        cfg: &AppConfig,
    ) -> Self {
        let workflow = WorkflowBuilder::new(llm.clone())
            .tool(Arc::new(ReadInstructionsTool::new(knowledge.clone())))
            .max_iterations(cfg.agent.max_iterations)
            .tool_timeout(Duration::from_secs(cfg.tools.tool_timeout_secs))
            .build();
        Self {
            llm,
            knowledge,
            workflow,
        }
    }

    /// 预先加载或构建说明书索引
    pub async fn prepare(&self) -> Result<usize, ReviewError> {
        let store = self.knowledge.ensure_ready().await?;
        Ok(store.len())
    }

    /// 处理单条评论，返回最终回复及分类、路由结果
    pub async fn process_review(&self, review: &str) -> Result<ReviewOutcome, ReviewError> {
        self.workflow.run(review, None).await
    }

    /// 处理单条评论，通过 event_tx 推送 NodeStarted / Classified / Routed / ToolCall / Observation / Finished
    pub async fn process_review_stream(
        &self,
        review: &str,
        event_tx: EventSink,
    ) -> Result<ReviewOutcome, ReviewError> {
        self.workflow.run(review, Some(&event_tx)).await
    }

    /// (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }
}
