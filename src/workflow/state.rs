//! 单次调用的工作流状态（typestate）
//!
//! Start -> Classified -> Replied -> End。每次转移消费上一个状态并只补充一个字段，
//! 已写入的字段没有可变访问途径，回复也只能写入一次。

use crate::review::{ReviewAssessment, ReviewInput, StrategyId};

/// 阶段名，用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Start,
    Classified,
    Replied,
    End,
}

#[derive(Debug)]
pub struct Start;

#[derive(Debug)]
pub struct Classified {
    assessment: ReviewAssessment,
}

#[derive(Debug)]
pub struct Replied {
    assessment: ReviewAssessment,
    strategy: StrategyId,
    reply: String,
}

#[derive(Debug)]
pub struct WorkflowState<S> {
    input: ReviewInput,
    stage: S,
}

/// 调用结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub final_reply: String,
    pub strategy: StrategyId,
    pub assessment: ReviewAssessment,
}

impl<S> WorkflowState<S> {
    pub fn input(&self) -> &ReviewInput {
        &self.input
    }
}

impl WorkflowState<Start> {
    pub fn new(input: ReviewInput) -> Self {
        Self { input, stage: Start }
    }

    pub fn phase(&self) -> WorkflowPhase {
        WorkflowPhase::Start
    }

    pub fn classified(self, assessment: ReviewAssessment) -> WorkflowState<Classified> {
        WorkflowState {
            input: self.input,
            stage: Classified { assessment },
        }
    }
}

impl WorkflowState<Classified> {
    pub fn phase(&self) -> WorkflowPhase {
        WorkflowPhase::Classified
    }

    pub fn assessment(&self) -> &ReviewAssessment {
        &self.stage.assessment
    }

    pub fn replied(self, strategy: StrategyId, reply: String) -> WorkflowState<Replied> {
        WorkflowState {
            input: self.input,
            stage: Replied {
                assessment: self.stage.assessment,
                strategy,
                reply,
            },
        }
    }
}

impl WorkflowState<Replied> {
    pub fn phase(&self) -> WorkflowPhase {
        WorkflowPhase::Replied
    }

    pub fn reply(&self) -> &str {
        &self.stage.reply
    }

    pub fn strategy(&self) -> StrategyId {
        self.stage.strategy
    }

    /// 进入 End：销毁状态并交出结果
    pub fn finish(self) -> ReviewOutcome {
        ReviewOutcome {
            final_reply: self.stage.reply,
            strategy: self.stage.strategy,
            assessment: self.stage.assessment,
        }
    }
}
