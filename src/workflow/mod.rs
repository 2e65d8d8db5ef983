//! 评论回复工作流：typestate 状态、图调度、构建器与过程事件

pub mod builder;
pub mod events;
pub mod graph;
pub mod state;

pub use builder::WorkflowBuilder;
pub use events::{send_event, EventSink, WorkflowEvent};
pub use graph::{ReviewWorkflow, ANALYZE_NODE};
pub use state::{ReviewOutcome, WorkflowPhase, WorkflowState};
