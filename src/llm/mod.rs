//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）以及嵌入提供方

pub mod deepseek;
pub mod embedding;
pub mod message;
pub mod mock;
pub mod openai;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_BASE_URL, DEEPSEEK_CHAT};
pub use embedding::{
    create_embedder_from_config, EmbeddingProvider, HashEmbedder, OpenAiEmbedder,
    DASHSCOPE_COMPATIBLE_BASE_URL, DEFAULT_EMBEDDING_MODEL,
};
pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;
