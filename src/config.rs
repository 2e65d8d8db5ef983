//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REVIEW__*` 覆盖（双下划线表示嵌套，如 `REVIEW__LLM__PROVIDER=openai`）。
//! API Key 不进配置文件，始终从 DEEPSEEK_API_KEY / OPENAI_API_KEY / DASHSCOPE_API_KEY 读取。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub embedding: EmbeddingSection,
    pub knowledge: KnowledgeSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择（deepseek / openai / mock）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub deepseek: LlmModelOverride,
    #[serde(default)]
    pub openai: LlmModelOverride,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            deepseek: LlmModelOverride::default(),
            openai: LlmModelOverride::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelOverride {
    pub model: Option<String>,
}

/// [embedding] 段：嵌入后端（openai 兼容 / hash）
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// 未设置时使用 DashScope 兼容模式端点
    pub base_url: Option<String>,
    /// 建索引时并发嵌入请求数
    #[serde(default = "default_embedding_concurrency")]
    pub concurrency: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: None,
            concurrency: default_embedding_concurrency(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    crate::llm::DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_concurrency() -> usize {
    4
}

/// [knowledge] 段：说明书源文件与持久化索引目录
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeSection {
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for KnowledgeSection {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            index_path: default_index_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("ES.pdf")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("emb")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

/// [agent] 段：负面回复策略的工具调用循环
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// 单次回复允许的最大模型调用次数，超出视为 AgentLoopExceeded
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> usize {
    8
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// 从 config 目录加载配置，环境变量 REVIEW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REVIEW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("REVIEW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
