//! 说明书知识库：加载 → 分块 → 嵌入 → 持久化，以及最近邻检索
//!
//! KnowledgeBase 每个进程构建一次，以 Arc 形式交给检索工具；索引在首次使用时惰性初始化
//! （OnceCell 保证只构建一次，且构建完成前的并发读取会等待而不是重复构建）。

pub mod chunker;
pub mod loader;
pub mod store;

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::OnceCell;

use crate::config::KnowledgeSection;
use crate::core::ReviewError;
use crate::llm::EmbeddingProvider;

pub use chunker::{Chunker, ChunkingConfig, DocumentChunk};
pub use loader::{load_document, SourceDocument};
pub use store::{
    IndexEntry, IndexManifest, RetrievalResult, VectorStore, INDEX_FILE, INDEX_FORMAT_VERSION,
};

/// 说明书知识库
pub struct KnowledgeBase {
    source_path: PathBuf,
    index_path: PathBuf,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    /// 建索引时的并发嵌入请求数
    concurrency: usize,
    store: OnceCell<VectorStore>,
}

impl KnowledgeBase {
    pub fn new(
        source_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            index_path: index_path.into(),
            chunker: Chunker::default(),
            embedder,
            concurrency: 4,
            store: OnceCell::new(),
        }
    }

    pub fn from_config(section: &KnowledgeSection, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(&section.source_path, &section.index_path, embedder).with_chunking(
            ChunkingConfig::new(section.chunk_size, section.chunk_overlap),
        )
    }

    /// 直接使用已构建的存储（不读写磁盘）
    pub fn from_store(store: VectorStore, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let kb = Self::new(PathBuf::new(), PathBuf::new(), embedder);
        let _ = kb.store.set(store);
        kb
    }

    pub fn with_chunking(mut self, config: ChunkingConfig) -> Self {
        self.chunker = Chunker::new(config);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 确保索引可用：已加载直接返回；磁盘上有索引则加载；否则从源文档构建并持久化
    pub async fn ensure_ready(&self) -> Result<&VectorStore, ReviewError> {
        self.store.get_or_try_init(|| self.open_or_build()).await
    }

    /// 检索与 query 最相似的前 k 个块
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>, ReviewError> {
        let store = self.ensure_ready().await?;
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(ReviewError::ToolUnavailable)?;
        Ok(store.search(&embedding, k))
    }

    async fn open_or_build(&self) -> Result<VectorStore, ReviewError> {
        if VectorStore::exists(&self.index_path) {
            tracing::info!(path = %self.index_path.display(), "loading knowledge index");
            let dir = self.index_path.clone();
            let store = tokio::task::spawn_blocking(move || VectorStore::load(&dir))
                .await
                .map_err(|e| ReviewError::IndexBuildFailure(e.to_string()))?
                .map_err(ReviewError::IndexBuildFailure)?;
            if store.manifest().embedding_model != self.embedder.model_name() {
                tracing::warn!(
                    index_model = %store.manifest().embedding_model,
                    embedder_model = %self.embedder.model_name(),
                    "knowledge index was built with a different embedding model"
                );
            }
            if store.is_empty() {
                tracing::warn!(path = %self.index_path.display(), "knowledge index is empty, every lookup will miss");
            }
            return Ok(store);
        }

        if VectorStore::is_occupied(&self.index_path) {
            return Err(ReviewError::IndexBuildFailure(format!(
                "{} exists but holds no {}",
                self.index_path.display(),
                INDEX_FILE
            )));
        }

        tracing::info!(
            source = %self.source_path.display(),
            path = %self.index_path.display(),
            "knowledge index not found, building"
        );
        let store = self.build().await?;
        let dir = self.index_path.clone();
        let to_save = store.clone();
        tokio::task::spawn_blocking(move || to_save.save(&dir))
            .await
            .map_err(|e| ReviewError::IndexBuildFailure(e.to_string()))?
            .map_err(ReviewError::IndexBuildFailure)?;
        tracing::info!(entries = store.len(), path = %self.index_path.display(), "knowledge index saved");
        Ok(store)
    }

    /// 加载 → 分块 → 嵌入；任何一步失败都返回 IndexBuildFailure
    async fn build(&self) -> Result<VectorStore, ReviewError> {
        let source = self.source_path.clone();
        let doc = tokio::task::spawn_blocking(move || load_document(&source))
            .await
            .map_err(|e| ReviewError::IndexBuildFailure(e.to_string()))?
            .map_err(ReviewError::IndexBuildFailure)?;

        let chunks = self.chunker.chunk(&doc.source, &doc.text);
        tracing::info!(chunks = chunks.len(), "document chunked");

        let embedder = &self.embedder;
        let entries: Vec<IndexEntry> = stream::iter(chunks)
            .map(|chunk| async move {
                let embedding = embedder
                    .embed(&chunk.text)
                    .await
                    .map_err(|e| ReviewError::IndexBuildFailure(format!("embed {}: {}", chunk.id, e)))?;
                if embedding.is_empty() {
                    return Err(ReviewError::IndexBuildFailure(format!(
                        "empty embedding for {}",
                        chunk.id
                    )));
                }
                Ok(IndexEntry { chunk, embedding })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let config = self.chunker.config();
        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: self.embedder.model_name().to_string(),
            source: doc.source,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            created_at: chrono::Utc::now().to_rfc3339(),
            entries: entries.len(),
        };
        Ok(VectorStore::new(manifest, entries))
    }
}
