//! 说明书检索工具（read_instructions）
//!
//! 在说明书向量索引上做最近邻检索，固定取前 2 个块，按「文档N：内容」加空行拼接返回；
//! 无匹配时返回固定提示而不是空串。只有索引不可用 / 后端失败才返回 Err。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ReviewError;
use crate::knowledge::{KnowledgeBase, RetrievalResult};
use crate::tools::Tool;

pub const READ_INSTRUCTIONS: &str = "read_instructions";
/// 每次检索返回的块数
pub const TOP_K: usize = 2;
/// 无匹配时的固定返回
pub const NO_MATCH: &str = "在说明书中未找到相关内容。";

/// 将检索结果拼接为工具输出
pub fn format_matches(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return NO_MATCH.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("文档{}：{}\n\n", i + 1, r.chunk.text))
        .collect()
}

pub struct ReadInstructionsTool {
    knowledge: Arc<KnowledgeBase>,
}

impl ReadInstructionsTool {
    pub fn new(knowledge: Arc<KnowledgeBase>) -> Self {
        Self { knowledge }
    }

    /// 以评论 / 问题文本检索说明书
    pub async fn lookup(&self, query: &str) -> Result<String, ReviewError> {
        tracing::info!(query = %query, "searching product manual");
        let results = self.knowledge.search(query, TOP_K).await?;
        tracing::debug!(hits = results.len(), "manual search done");
        Ok(format_matches(&results))
    }
}

#[async_trait]
impl Tool for ReadInstructionsTool {
    fn name(&self) -> &str {
        READ_INSTRUCTIONS
    }

    fn description(&self) -> &str {
        "当用户评论中提到具体产品不会使用的问题时，调用此工具从产品说明书中检索信息并返回相关内容。参数 user_review 为用户的问题或评论原文。"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_review": {
                    "type": "string",
                    "description": "用户的问题或评论原文"
                }
            },
            "required": ["user_review"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("user_review")
            .or_else(|| args.get("query"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| "missing argument: user_review".to_string())?;
        self.lookup(query).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{DocumentChunk, IndexEntry, IndexManifest, VectorStore, INDEX_FORMAT_VERSION};
    use crate::llm::{EmbeddingProvider, HashEmbedder};
    use serde_json::json;

    async fn store_with(texts: &[&str]) -> VectorStore {
        let embedder = HashEmbedder::default();
        let mut entries = Vec::new();
        for (i, t) in texts.iter().enumerate() {
            entries.push(IndexEntry {
                chunk: DocumentChunk {
                    id: format!("manual#{i}"),
                    text: t.to_string(),
                    source: "manual".to_string(),
                    ordinal: i,
                    offset: 0,
                },
                embedding: embedder.embed(t).await.unwrap(),
            });
        }
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: embedder.model_name().to_string(),
            source: "manual".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            created_at: String::new(),
            entries: 0,
        };
        VectorStore::new(manifest, entries)
    }

    #[test]
    fn test_empty_results_return_sentinel() {
        let out = format_matches(&[]);
        assert_eq!(out, NO_MATCH);
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_on_empty_index_returns_sentinel() {
        let kb = KnowledgeBase::from_store(store_with(&[]).await, Arc::new(HashEmbedder::default()));
        let tool = ReadInstructionsTool::new(Arc::new(kb));
        assert_eq!(tool.lookup("怎么换刀头").await.unwrap(), NO_MATCH);
    }

    #[tokio::test]
    async fn test_lookup_returns_two_numbered_chunks() {
        let store = store_with(&[
            "更换内刀头：按下释放按钮取下刀头架。",
            "充电：首次使用前充电一小时。",
            "清洁：用清水冲洗刀头。",
        ])
        .await;
        let kb = KnowledgeBase::from_store(store, Arc::new(HashEmbedder::default()));
        let tool = ReadInstructionsTool::new(Arc::new(kb));

        let out = tool
            .execute(json!({"user_review": "不知道如何更换内刀头"}))
            .await
            .unwrap();
        assert!(out.starts_with("文档1：更换内刀头"));
        assert!(out.contains("\n\n文档2："));
        assert!(!out.contains("文档3："));
        assert!(out.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_error() {
        let kb = KnowledgeBase::from_store(store_with(&[]).await, Arc::new(HashEmbedder::default()));
        let tool = ReadInstructionsTool::new(Arc::new(kb));
        assert!(tool.execute(json!({})).await.is_err());
    }
}
