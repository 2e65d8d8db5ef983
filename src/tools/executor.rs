//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args) 在超时内调用工具，
//! 未注册 / 超时 / 失败分别转为 ReviewError（UnknownTool / ToolTimeout / ToolUnavailable）；
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::ReviewError;
use crate::tools::{Tool, ToolRegistry};

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self::with_timeout(registry, Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(registry: ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn execute(&self, tool_name: &str, args: serde_json::Value) -> Result<String, ReviewError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| ReviewError::UnknownTool(tool_name.to_string()))?;

        let start = Instant::now();
        let args_preview = args_preview(&args);
        let result = timeout(self.timeout, tool.execute(args)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(ReviewError::ToolUnavailable(e)),
            Err(_) => Err(ReviewError::ToolTimeout(tool_name.to_string())),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Slow;

    #[async_trait]
    impl Tool for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "sleeps"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn execute(&self, _args: Value) -> Result<String, String> {
            Err("backend down".to_string())
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(Slow);
        registry.register(Broken);
        ToolExecutor::with_timeout(registry, Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = executor().execute("search", json!({})).await.unwrap_err();
        assert!(matches!(err, ReviewError::UnknownTool(name) if name == "search"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = executor().execute("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, ReviewError::ToolTimeout(_)));
    }

    #[tokio::test]
    async fn test_failure_maps_to_tool_unavailable() {
        let err = executor().execute("broken", json!({})).await.unwrap_err();
        assert!(matches!(err, ReviewError::ToolUnavailable(msg) if msg == "backend down"));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = json!({"user_review": "差".repeat(500)});
        assert!(args_preview(&long).ends_with("..."));
    }
}
