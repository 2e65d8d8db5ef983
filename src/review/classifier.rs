//! 评论分类器
//!
//! LlmClassifier 把 ReviewAssessment 的 JSON Schema（schemars 生成）放进 system prompt，
//! 从模型回复中取出 JSON 对象并严格反序列化；任何不符合结构的输出都是 SchemaViolation，不做兜底。
//! StubClassifier 返回固定结果，供路由与策略测试使用。

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use schemars::schema_for;

use crate::core::ReviewError;
use crate::llm::{LlmClient, Message};
use crate::review::{ReviewAssessment, ReviewInput};

/// 分类能力
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, review: &ReviewInput) -> Result<ReviewAssessment, ReviewError>;
}

const CLASSIFIER_INSTRUCTIONS: &str = "你是电商平台的评论分析助手。请分析用户的商品评价，只输出一个符合下面 JSON Schema 的 JSON 对象，不要输出任何其它文字。\n\
字段要求：\n\
- quality：是否是正常评论，或者是系统默认的回复内容（如“此用户未填写评价内容”），只能是 normal 或 default\n\
- emotion：情感倾向，只能是 positive、negative、neutral 之一\n\
- key_issues：提取评价里用户对产品不会用的关键信息，字符串列表，没有则为空列表\n\
- needs_tool：用户是否描述了具体的产品使用问题、需要查询说明书才能回答，true 或 false";

fn json_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("static regex is valid")
    })
}

/// 从模型输出中取出 JSON 对象文本：优先 ``` 代码块，其次首个 `{` 到最后一个 `}`
pub fn extract_json_object(output: &str) -> Option<&str> {
    if let Some(caps) = json_block_regex().captures(output) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (start < end).then(|| &output[start..=end])
}

/// 解析分类输出；缺字段、枚举越界、不是 JSON 都返回 SchemaViolation
pub fn parse_assessment(output: &str) -> Result<ReviewAssessment, ReviewError> {
    let json = extract_json_object(output).ok_or_else(|| {
        ReviewError::SchemaViolation(format!("no JSON object in classifier output: {}", output.trim()))
    })?;
    serde_json::from_str(json).map_err(|e| ReviewError::SchemaViolation(format!("{}: {}", e, json)))
}

/// 基于 LLM 的分类器
pub struct LlmClassifier {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let schema = serde_json::to_string_pretty(&schema_for!(ReviewAssessment)).unwrap_or_default();
        Self {
            llm,
            system_prompt: format!("{}\n\nJSON Schema:\n{}", CLASSIFIER_INSTRUCTIONS, schema),
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, review: &ReviewInput) -> Result<ReviewAssessment, ReviewError> {
        let messages = [
            Message::system(self.system_prompt.clone()),
            Message::user(review.text().to_string()),
        ];
        let output = self.llm.complete(&messages).await.map_err(ReviewError::Llm)?;
        let assessment = parse_assessment(&output)?;
        tracing::debug!(?assessment, "review classified");
        Ok(assessment)
    }
}

/// 固定结果的分类器
#[derive(Debug, Clone)]
pub struct StubClassifier {
    assessment: ReviewAssessment,
}

impl StubClassifier {
    pub fn new(assessment: ReviewAssessment) -> Self {
        Self { assessment }
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, _review: &ReviewInput) -> Result<ReviewAssessment, ReviewError> {
        Ok(self.assessment.clone())
    }
}
