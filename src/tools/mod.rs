//! 工具箱：工具 trait 与注册表、带超时与审计日志的执行器、说明书检索工具

pub mod executor;
pub mod read_instructions;
pub mod registry;
pub mod schema;

pub use executor::ToolExecutor;
pub use read_instructions::{format_matches, ReadInstructionsTool, NO_MATCH, READ_INSTRUCTIONS, TOP_K};
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;
