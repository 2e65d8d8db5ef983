//! 工作流构建器
//!
//! 提供流畅的 API 装配 LLM、工具与分类器，构建出不可变的 ReviewWorkflow。
//! 提供方与工具都是构建参数，同一进程可按不同配置构建多个工作流。

use std::sync::Arc;
use std::time::Duration;

use crate::llm::LlmClient;
use crate::react::DEFAULT_MAX_ITERATIONS;
use crate::review::{Classifier, LlmClassifier, NegativeReplyStrategy};
use crate::tools::{Tool, ToolExecutor, ToolRegistry};
use crate::workflow::ReviewWorkflow;

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// 工作流构建器
pub struct WorkflowBuilder {
    llm: Arc<dyn LlmClient>,
    classifier: Option<Arc<dyn Classifier>>,
    registry: ToolRegistry,
    max_iterations: usize,
    tool_timeout: Duration,
}

impl WorkflowBuilder {
    /// 以回复与分类共用的 LLM 创建构建器
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            classifier: None,
            registry: ToolRegistry::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// 替换默认的 LLM 分类器
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 注册一个工具
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.registry.register_arc(tool);
        self
    }

    /// 整体替换工具注册表
    pub fn tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn build(self) -> ReviewWorkflow {
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(LlmClassifier::new(self.llm.clone())));
        if self.registry.is_empty() {
            tracing::warn!("workflow built without tools, negative replies will not consult the manual");
        }
        tracing::info!(tools = ?self.registry.tool_names(), max_iterations = self.max_iterations, "workflow built");
        let executor = Arc::new(ToolExecutor::with_timeout(self.registry, self.tool_timeout));
        let negative =
            NegativeReplyStrategy::new(self.llm, executor).with_max_iterations(self.max_iterations);
        ReviewWorkflow::new(classifier, negative)
    }
}
