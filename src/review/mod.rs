//! 评论领域：输入与分类结果、分类器、路由、回复策略

pub mod classifier;
pub mod router;
pub mod strategy;
pub mod types;

pub use classifier::{parse_assessment, Classifier, LlmClassifier, StubClassifier};
pub use router::{route, StrategyId};
pub use strategy::{
    default_reply, positive_reply, NegativeReplyStrategy, DEFAULT_REPLY, POSITIVE_REPLY,
    REASSURANCE_REPLY,
};
pub use types::{Emotion, Quality, ReviewAssessment, ReviewInput};
