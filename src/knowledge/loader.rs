//! 说明书加载：PDF 通过 pdf-extract 抽取文本，其它扩展名按 UTF-8 文本读取

use std::path::Path;

/// 已加载的源文档
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// 来源标识（文件路径）
    pub source: String,
    pub text: String,
}

/// 读取源文档；文件缺失、无法解析或抽取结果为空时返回错误
pub fn load_document(path: &Path) -> Result<SourceDocument, String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path)
                .map_err(|e| format!("read {}: {}", path.display(), e))?;
            pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| format!("extract pdf {}: {}", path.display(), e))?
        }
        _ => std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?,
    };

    if text.trim().is_empty() {
        return Err(format!("{} contains no extractable text", path.display()));
    }

    tracing::debug!(source = %path.display(), chars = text.chars().count(), "document loaded");
    Ok(SourceDocument {
        source: path.display().to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_text_manual() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.txt");
        std::fs::write(&path, "更换内刀头：按下释放按钮。").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.text, "更换内刀头：按下释放按钮。");
        assert!(doc.source.ends_with("manual.txt"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_document(&dir.path().join("ES.pdf")).is_err());
    }

    #[test]
    fn test_blank_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, " \n ").unwrap();
        assert!(load_document(&path).is_err());
    }
}
