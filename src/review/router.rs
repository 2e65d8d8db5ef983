//! 路由：分类结果 -> 回复策略（纯函数，按顺序首个命中生效）
//!
//! 1. needs_tool 为真 -> 负面回复（带工具），不看 quality / emotion
//! 2. quality 为 default -> 默认回复
//! 3. emotion 为 negative -> 负面回复（是否调用工具由策略自己决定）
//! 4. 其它 -> 正面/中性回复

use std::fmt;

use serde::Serialize;

use crate::review::{Emotion, Quality, ReviewAssessment};

/// 回复策略标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    ToolAugmentedNegative,
    PositiveNeutral,
    Default,
}

impl StrategyId {
    /// 图中对应的节点名
    pub fn node_name(&self) -> &'static str {
        match self {
            StrategyId::ToolAugmentedNegative => "generate_negative_reply",
            StrategyId::PositiveNeutral => "generate_positive_reply",
            StrategyId::Default => "generate_default_reply",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

pub fn route(assessment: &ReviewAssessment) -> StrategyId {
    if assessment.needs_tool {
        return StrategyId::ToolAugmentedNegative;
    }
    if assessment.quality == Quality::Default {
        return StrategyId::Default;
    }
    if assessment.emotion == Emotion::Negative {
        return StrategyId::ToolAugmentedNegative;
    }
    StrategyId::PositiveNeutral
}
