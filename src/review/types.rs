//! 评论领域类型：原始输入与分类结果

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 一次请求的原始评论文本（不可变）
///
/// 空白输入属于调用方错误，这里不做校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput(String);

impl ReviewInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// 评论质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 正常评论
    Normal,
    /// 系统默认好评、无实际内容的评论
    Default,
}

/// 情感倾向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[serde(alias = "正面")]
    Positive,
    #[serde(alias = "负面")]
    Negative,
    #[serde(alias = "中性")]
    Neutral,
}

impl Quality {
    pub const ALL: [Quality; 2] = [Quality::Normal, Quality::Default];
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Positive, Emotion::Negative, Emotion::Neutral];
}

/// 分类器的结构化输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewAssessment {
    /// 是否是正常评论，或者是默认的回复内容：normal 或 default
    pub quality: Quality,
    /// 情感倾向：positive、negative、neutral 之一
    pub emotion: Emotion,
    /// 评论中用户对产品不会使用的关键信息，按出现顺序排列，可以为空列表
    #[serde(alias = "key_information")]
    pub key_issues: Vec<String>,
    /// 评论是否需要调用工具查询说明书才能回答（用户描述了具体的使用问题时为 true）
    #[serde(alias = "require_tool_use")]
    pub needs_tool: bool,
}

impl ReviewAssessment {
    pub fn new(quality: Quality, emotion: Emotion, needs_tool: bool) -> Self {
        Self {
            quality,
            emotion,
            key_issues: Vec::new(),
            needs_tool,
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.key_issues.push(issue.into());
        self
    }
}
