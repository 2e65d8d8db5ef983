//! 核心层：错误与恢复、后端装配

pub mod error;
pub mod orchestrator;
pub mod recovery;

pub use error::{RecoveryAction, ReviewError};
pub use orchestrator::{create_embedder, create_llm_from_config};
pub use recovery::RecoveryEngine;
