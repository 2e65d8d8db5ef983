//! 文档分块：按字符计数的递归分隔符切分
//!
//! 目标块大小与重叠都以字符（而非字节）计，对中文说明书 UTF-8 安全。
//! 优先在段落、换行、中文句号等分隔符处断开；分隔符位置过早时退回下一级分隔符，全部不合适则硬切。

use serde::{Deserialize, Serialize};

/// 文档块：文本片段及其来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// 块 ID（`{source}#{ordinal}`）
    pub id: String,
    pub text: String,
    /// 来源文档路径
    pub source: String,
    /// 在来源文档中的序号
    pub ordinal: usize,
    /// 在来源文档中的字符偏移
    pub offset: usize,
}

/// 分块策略
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// 目标块大小（字符数）
    pub chunk_size: usize,
    /// 块之间的重叠（字符数）
    pub chunk_overlap: usize,
    /// 分隔符优先级（从高到低）
    pub separators: Vec<String>,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Default::default()
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: ["\n\n", "\n", "。", "！", "？", "；", ". ", "! ", "? ", " "]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        let mut config = config;
        config.chunk_size = config.chunk_size.max(1);
        // 重叠不小于块大小时无法前进
        if config.chunk_overlap >= config.chunk_size {
            config.chunk_overlap = config.chunk_size / 2;
        }
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// 将文档分割为块
    pub fn chunk(&self, source: &str, text: &str) -> Vec<DocumentChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = self.find_break(&chars, start);

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                let ordinal = chunks.len();
                let leading = piece.chars().count() - piece.trim_start().chars().count();
                chunks.push(DocumentChunk {
                    id: format!("{}#{}", source, ordinal),
                    text: trimmed.to_string(),
                    source: source.to_string(),
                    ordinal,
                    offset: start + leading,
                });
            }

            if end >= total {
                break;
            }
            let next = end.saturating_sub(self.config.chunk_overlap);
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// 计算从 start 开始的块结束位置（不含）
    fn find_break(&self, chars: &[char], start: usize) -> usize {
        let total = chars.len();
        let hard_end = (start + self.config.chunk_size).min(total);
        if hard_end == total {
            return total;
        }

        // 断点至少落在块的后半段，避免产生过碎的块
        let min_end = start + self.config.chunk_size / 2;
        let window: String = chars[start..hard_end].iter().collect();
        for sep in &self.config.separators {
            if let Some(pos) = window.rfind(sep.as_str()) {
                let end = start + window[..pos].chars().count() + sep.chars().count();
                if end > min_end {
                    return end;
                }
            }
        }
        hard_end
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}
