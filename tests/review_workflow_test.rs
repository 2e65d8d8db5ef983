//! 评论回复工作流集成测试：分类 -> 路由 -> 策略 -> 说明书检索的端到端行为

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use review_agent::config::AppConfig;
use review_agent::knowledge::{ChunkingConfig, KnowledgeBase};
use review_agent::llm::{EmbeddingProvider, HashEmbedder, MockLlmClient};
use review_agent::review::{
    Classifier, Emotion, Quality, ReviewAssessment, StrategyId, StubClassifier, DEFAULT_REPLY,
    POSITIVE_REPLY, REASSURANCE_REPLY,
};
use review_agent::tools::{ReadInstructionsTool, NO_MATCH};
use review_agent::workflow::{WorkflowBuilder, WorkflowEvent};
use review_agent::{ReviewAgent, ReviewError};

const MANUAL: &str = "更换内刀头：先关闭电源，按下释放键取下刀网，再逆时针旋转取出内刀头，装入新刀头后顺时针拧紧。\n\n\
充电说明：使用原装充电器充电，指示灯常亮表示充满，首次使用前请充电八小时。\n\n\
清洁保养：每次使用后取下刀网，用随附的毛刷清除胡须碎屑，不要用水冲洗电机部分。";

const NEGATIVE_REVIEW: &str = "这个产品太差了，我不知道怎么更换内刀头！请帮我看看说明书。";
const TOOL_CALL: &str = r#"{"tool": "read_instructions", "args": {"user_review": "不知道怎么更换内刀头"}}"#;

struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, String> {
        Err("embedding service unreachable".to_string())
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

fn write_manual(dir: &Path) -> PathBuf {
    let path = dir.join("manual.txt");
    std::fs::write(&path, MANUAL).unwrap();
    path
}

fn knowledge(dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::new(write_manual(dir), dir.join("emb"), embedder)
            .with_chunking(ChunkingConfig::new(50, 10)),
    )
}

fn stub(q: Quality, e: Emotion, needs_tool: bool) -> Arc<dyn Classifier> {
    Arc::new(StubClassifier::new(ReviewAssessment::new(q, e, needs_tool)))
}

#[tokio::test]
async fn test_positive_review_gets_canned_reply() {
    let llm = Arc::new(MockLlmClient::new());
    let wf = WorkflowBuilder::new(llm.clone())
        .classifier(stub(Quality::Normal, Emotion::Positive, false))
        .build();

    let outcome = wf.run("质量很好，非常喜欢！", None).await.unwrap();
    assert_eq!(outcome.final_reply, POSITIVE_REPLY);
    assert_eq!(outcome.strategy, StrategyId::PositiveNeutral);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_needs_tool_uses_manual_and_apologises() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(HashEmbedder::default()));
    let llm = Arc::new(MockLlmClient::with_replies([
        TOOL_CALL,
        "亲，非常抱歉给您带来困扰！更换内刀头时请先关闭电源，取下刀网后逆时针旋转取出内刀头，再装入新刀头拧紧即可。",
    ]));
    let wf = WorkflowBuilder::new(llm.clone())
        .classifier(stub(Quality::Normal, Emotion::Negative, true))
        .tool(Arc::new(ReadInstructionsTool::new(kb)))
        .build();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let outcome = wf.run(NEGATIVE_REVIEW, Some(&tx)).await.unwrap();
    drop(tx);

    assert_eq!(outcome.strategy, StrategyId::ToolAugmentedNegative);
    assert!(outcome.final_reply.contains("抱歉"));
    assert_ne!(outcome.final_reply, POSITIVE_REPLY);
    assert_ne!(outcome.final_reply, DEFAULT_REPLY);
    assert_ne!(outcome.final_reply, REASSURANCE_REPLY);

    // 第二次模型调用看到了两段说明书内容
    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    let observation = &requests[1].last().unwrap().content;
    assert!(observation.contains("文档1："));
    assert!(observation.contains("文档2："));
    assert!(!observation.contains(NO_MATCH));

    let mut saw_tool_call = false;
    let mut saw_failure = false;
    while let Some(ev) = rx.recv().await {
        match ev {
            WorkflowEvent::ToolCall { tool, .. } => {
                assert_eq!(tool, "read_instructions");
                saw_tool_call = true;
            }
            WorkflowEvent::ToolFailure { .. } => saw_failure = true,
            _ => {}
        }
    }
    assert!(saw_tool_call);
    assert!(!saw_failure);

    // 首次检索时构建并持久化了索引
    assert!(dir.path().join("emb").join("index.json").exists());
}

#[tokio::test]
async fn test_retrieval_failure_still_replies() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(FailingEmbedder));
    let llm = Arc::new(MockLlmClient::with_replies([
        TOOL_CALL,
        "亲，非常抱歉给您带来不好的体验，我们的客服会尽快联系您协助处理。",
    ]));
    let wf = WorkflowBuilder::new(llm.clone())
        .classifier(stub(Quality::Normal, Emotion::Negative, true))
        .tool(Arc::new(ReadInstructionsTool::new(kb)))
        .build();

    let reply = wf.invoke(NEGATIVE_REVIEW).await.unwrap();
    assert!(!reply.is_empty());
    assert!(reply.contains("抱歉"));
    // 失败的构建不会留下索引
    assert!(!dir.path().join("emb").exists());
}

#[tokio::test]
async fn test_retrieval_failure_with_empty_model_reply_uses_reassurance() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(FailingEmbedder));
    let llm = Arc::new(MockLlmClient::with_replies([TOOL_CALL, "   "]));
    let wf = WorkflowBuilder::new(llm)
        .classifier(stub(Quality::Normal, Emotion::Negative, true))
        .tool(Arc::new(ReadInstructionsTool::new(kb)))
        .build();

    assert_eq!(wf.invoke(NEGATIVE_REVIEW).await.unwrap(), REASSURANCE_REPLY);
}

#[tokio::test]
async fn test_retrieval_outage_with_persistent_tool_requests_still_replies() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(FailingEmbedder));
    let llm = Arc::new(MockLlmClient::with_replies([TOOL_CALL; 8]));
    let wf = WorkflowBuilder::new(llm.clone())
        .classifier(stub(Quality::Normal, Emotion::Negative, true))
        .tool(Arc::new(ReadInstructionsTool::new(kb)))
        .build();

    assert_eq!(wf.invoke(NEGATIVE_REVIEW).await.unwrap(), REASSURANCE_REPLY);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_default_quality_gets_default_reply() {
    let wf = WorkflowBuilder::new(Arc::new(MockLlmClient::new()))
        .classifier(stub(Quality::Default, Emotion::Neutral, false))
        .build();
    assert_eq!(wf.invoke("此用户未填写评价内容").await.unwrap(), DEFAULT_REPLY);
}

#[tokio::test]
async fn test_identical_inputs_route_identically() {
    let wf = WorkflowBuilder::new(Arc::new(MockLlmClient::new()))
        .classifier(stub(Quality::Normal, Emotion::Neutral, false))
        .build();
    let first = wf.run("一般般吧", None).await.unwrap();
    let second = wf.run("一般般吧", None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_loop_exceeded_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(HashEmbedder::default()));
    let llm = Arc::new(MockLlmClient::with_replies([TOOL_CALL, TOOL_CALL, TOOL_CALL]));
    let wf = WorkflowBuilder::new(llm)
        .classifier(stub(Quality::Normal, Emotion::Negative, true))
        .tool(Arc::new(ReadInstructionsTool::new(kb)))
        .max_iterations(2)
        .build();

    let err = wf.invoke(NEGATIVE_REVIEW).await.unwrap_err();
    assert!(matches!(err, ReviewError::AgentLoopExceeded(2)));
}

#[tokio::test]
async fn test_agent_end_to_end_with_llm_classifier() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(HashEmbedder::default()));
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"quality": "normal", "emotion": "negative", "key_issues": ["不知道怎么更换内刀头"], "needs_tool": true}"#,
        TOOL_CALL,
        "亲，非常抱歉！请先关闭电源，取下刀网后逆时针旋转即可取出内刀头。",
    ]));
    let agent = ReviewAgent::with_components(llm.clone(), kb, &AppConfig::default());

    assert!(agent.prepare().await.unwrap() >= 2);
    let outcome = agent.process_review(NEGATIVE_REVIEW).await.unwrap();
    assert_eq!(outcome.strategy, StrategyId::ToolAugmentedNegative);
    assert_eq!(outcome.assessment.key_issues, vec!["不知道怎么更换内刀头".to_string()]);
    assert!(outcome.final_reply.contains("内刀头"));
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn test_agent_schema_violation_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let kb = knowledge(dir.path(), Arc::new(HashEmbedder::default()));
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"quality": "normal", "emotion": "negative"}"#,
    ]));
    let agent = ReviewAgent::with_components(llm, kb, &AppConfig::default());

    let err = agent.process_review("差评").await.unwrap_err();
    assert!(matches!(err, ReviewError::SchemaViolation(_)));
}
