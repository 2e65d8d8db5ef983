//! 嵌入 API：供说明书向量索引使用
//!
//! OpenAiEmbedder 调用 OpenAI 兼容的 /embeddings 端点（默认 DashScope 兼容模式 + text-embedding-v3）；
//! HashEmbedder 为本地确定性实现，用于测试与无 Key 运行。

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;

/// DashScope OpenAI 兼容模式端点
pub const DASHSCOPE_COMPATIBLE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-v3";

/// 嵌入提供方：将文本编码为向量；失败时返回错误字符串
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;

    /// 模型标识，写入索引 manifest，用于识别索引由哪个模型生成
    fn model_name(&self) -> &str;
}

/// 使用 async-openai 调用 OpenAI 兼容的 embeddings API
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str) -> Self {
        let config = match base_url {
            Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()
            .map_err(|e| e.to_string())?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;
        response
            .data
            .first()
            .map(|e| e.embedding.clone())
            .ok_or_else(|| "embedding response has no data".to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// 确定性哈希嵌入：字符 bigram 哈希到固定维度后归一化
///
/// 共享字符越多余弦相似度越高，足以让测试中的检索结果可预期。
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, a: char, b: char) -> usize {
        // FNV-1a
        let mut h: u64 = 0xcbf29ce484222325;
        for c in [a, b] {
            for byte in (c as u32).to_le_bytes() {
                h ^= byte as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
        }
        (h % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.is_empty() {
            return Ok(vec![]);
        }
        let mut v = vec![0.0f32; self.dimension];
        if chars.len() == 1 {
            v[self.bucket(chars[0], chars[0])] += 1.0;
        }
        for w in chars.windows(2) {
            v[self.bucket(w[0], w[1])] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn model_name(&self) -> &str {
        "hash-bigram"
    }
}

/// 从配置创建嵌入提供方：provider 为 hash 或没有可用 Key 时退回 HashEmbedder
pub fn create_embedder_from_config(
    provider: &str,
    base_url: Option<&str>,
    model: &str,
) -> Arc<dyn EmbeddingProvider> {
    if provider.eq_ignore_ascii_case("hash") {
        return Arc::new(HashEmbedder::default());
    }
    let key = std::env::var("DASHSCOPE_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|k| !k.is_empty() && k != "sk-placeholder");
    match key {
        Some(key) => {
            let base = base_url.unwrap_or(DASHSCOPE_COMPATIBLE_BASE_URL);
            tracing::info!("Using OpenAI-compatible embeddings ({} @ {})", model, base);
            Arc::new(OpenAiEmbedder::new(Some(base), model, &key))
        }
        None => {
            tracing::warn!("No DASHSCOPE_API_KEY / OPENAI_API_KEY set, using hash embedder");
            Arc::new(HashEmbedder::default())
        }
    }
}
