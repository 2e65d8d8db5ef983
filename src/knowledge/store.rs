//! 向量存储：内存中的 (chunk, embedding) 列表 + 余弦相似度检索，可持久化到索引目录
//!
//! 索引目录布局：`<index_path>/index.json`，内含 manifest 与全部条目。
//! 写入先落到同级临时目录，再整体 rename 到目标路径，失败时不会留下部分索引。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::knowledge::DocumentChunk;

/// 索引文件名
pub const INDEX_FILE: &str = "index.json";
/// 索引格式版本，不兼容的变更需递增
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// 索引元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub source: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// 检索结果
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk: DocumentChunk,
    /// 余弦相似度
    pub score: f32,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

/// 只读向量存储：构建完成后仅供并发检索
#[derive(Debug, Clone)]
pub struct VectorStore {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorStore {
    pub fn new(manifest: IndexManifest, entries: Vec<IndexEntry>) -> Self {
        let mut manifest = manifest;
        manifest.entries = entries.len();
        Self { manifest, entries }
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 返回与查询向量最相似的前 k 个块（按相似度降序）
    pub fn search(&self, query: &[f32], k: usize) -> Vec<RetrievalResult> {
        if query.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &DocumentChunk)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query, &e.embedding), &e.chunk))
            .filter(|(score, _)| !score.is_nan())
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| RetrievalResult {
                chunk: chunk.clone(),
                score,
            })
            .collect()
    }

    /// 索引目录下是否已有持久化索引
    pub fn exists(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    pub fn load(dir: &Path) -> Result<Self, String> {
        let path = dir.join(INDEX_FILE);
        let data = std::fs::read_to_string(&path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        let file: IndexFile = serde_json::from_str(&data)
            .map_err(|e| format!("parse {}: {}", path.display(), e))?;
        if file.manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(format!(
                "unsupported index format version {} (expected {})",
                file.manifest.format_version, INDEX_FORMAT_VERSION
            ));
        }
        Ok(Self::new(file.manifest, file.entries))
    }

    /// dir 已被占用但不是本格式的索引（非空目录且没有 index.json，或是普通文件）
    pub fn is_occupied(dir: &Path) -> bool {
        if !dir.exists() || Self::exists(dir) {
            return false;
        }
        match std::fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_some(),
            Err(_) => true,
        }
    }

    /// 持久化到 dir：先写临时目录再 rename；dir 只能不存在或是空目录
    pub fn save(&self, dir: &Path) -> Result<(), String> {
        if Self::exists(dir) || Self::is_occupied(dir) {
            return Err(format!("{} already exists", dir.display()));
        }
        let staging = staging_dir(dir);
        let result = self.write_into(&staging).and_then(|_| {
            if dir.exists() {
                std::fs::remove_dir(dir).map_err(|e| format!("remove {}: {}", dir.display(), e))?;
            }
            std::fs::rename(&staging, dir)
                .map_err(|e| format!("rename {} -> {}: {}", staging.display(), dir.display(), e))
        });
        if result.is_err() {
            let _ = std::fs::remove_dir_all(&staging);
        }
        result
    }

    fn write_into(&self, staging: &Path) -> Result<(), String> {
        std::fs::create_dir_all(staging)
            .map_err(|e| format!("create {}: {}", staging.display(), e))?;
        let file = IndexFile {
            manifest: self.manifest.clone(),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string(&file).map_err(|e| e.to_string())?;
        let path = staging.join(INDEX_FILE);
        std::fs::write(&path, json).map_err(|e| format!("write {}: {}", path.display(), e))
    }
}

fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!(".{}.building-{}", name, uuid::Uuid::new_v4()))
}

/// 余弦相似度
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ordinal: usize, text: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: DocumentChunk {
                id: format!("m#{ordinal}"),
                text: text.to_string(),
                source: "m".to_string(),
                ordinal,
                offset: ordinal * 10,
            },
            embedding,
        }
    }

    fn manifest() -> IndexManifest {
        IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: "test".to_string(),
            source: "m".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            entries: 0,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity_and_truncates() {
        let store = VectorStore::new(
            manifest(),
            vec![
                entry(0, "far", vec![0.0, 1.0]),
                entry(1, "near", vec![1.0, 0.1]),
                entry(2, "mid", vec![1.0, 1.0]),
            ],
        );
        assert_eq!(store.manifest().entries, 3);

        let hits = store.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "near");
        assert_eq!(hits[1].chunk.text, "mid");
    }

    #[test]
    fn test_search_empty_store_or_query() {
        let store = VectorStore::new(manifest(), vec![]);
        assert!(store.search(&[1.0], 2).is_empty());
        let store = VectorStore::new(manifest(), vec![entry(0, "x", vec![1.0])]);
        assert!(store.search(&[], 2).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("emb");
        let store = VectorStore::new(manifest(), vec![entry(0, "刀头", vec![0.5, 0.5])]);

        assert!(!VectorStore::exists(&index_dir));
        store.save(&index_dir).unwrap();
        assert!(VectorStore::exists(&index_dir));

        let loaded = VectorStore::load(&index_dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.manifest(), store.manifest());

        // 不留临时目录
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("building"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_refuses_occupied_dir() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("emb");
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join("index.faiss"), b"faiss").unwrap();

        assert!(VectorStore::is_occupied(&index_dir));
        let store = VectorStore::new(manifest(), vec![]);
        assert!(store.save(&index_dir).is_err());
        assert!(index_dir.join("index.faiss").exists());
    }

    #[test]
    fn test_save_into_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("emb");
        std::fs::create_dir_all(&index_dir).unwrap();

        assert!(!VectorStore::is_occupied(&index_dir));
        let store = VectorStore::new(manifest(), vec![entry(0, "刀头", vec![1.0])]);
        store.save(&index_dir).unwrap();
        assert_eq!(VectorStore::load(&index_dir).unwrap().len(), 1);

        // 已有索引时不覆盖
        assert!(store.save(&index_dir).is_err());
    }
}
