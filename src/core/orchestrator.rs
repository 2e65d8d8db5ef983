//! 后端装配：根据配置与环境变量选择 LLM 与嵌入后端
//!
//! 提供方选择是图构建的输入，而不是编译期常量：同一进程内可以用不同配置构建多个工作流。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{
    create_deepseek_client, create_embedder_from_config, EmbeddingProvider, LlmClient,
    MockLlmClient, OpenAiClient, DEEPSEEK_CHAT,
};

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "mock" {
        tracing::info!("Using Mock LLM (configured)");
        return Arc::new(MockLlmClient::new());
    }

    // 有 DeepSeek Key，或配置为 deepseek 且仅有 OpenAI Key 时也走 DeepSeek 兼容端点
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        && provider != "openai"
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";

    if use_deepseek {
        let model = cfg
            .llm
            .deepseek
            .model
            .clone()
            .or_else(|| Some(cfg.llm.model.clone()).filter(|m| !m.is_empty()))
            .unwrap_or_else(|| DEEPSEEK_CHAT.to_string());
        tracing::info!("Using DeepSeek LLM ({})", model);
        Arc::new(create_deepseek_client(Some(&model)))
    } else if use_openai {
        let model = cfg
            .llm
            .openai
            .model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let base = cfg.llm.base_url.as_deref();
        tracing::info!("Using OpenAI LLM ({})", model);
        Arc::new(OpenAiClient::new(
            base,
            &model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock LLM");
        Arc::new(MockLlmClient::new())
    }
}

/// 根据 [embedding] 段创建嵌入后端
pub fn create_embedder(cfg: &AppConfig) -> Arc<dyn EmbeddingProvider> {
    create_embedder_from_config(
        &cfg.embedding.provider,
        cfg.embedding.base_url.as_deref(),
        &cfg.embedding.model,
    )
}
