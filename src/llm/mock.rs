//! Mock LLM 客户端（用于测试与无 Key 运行，无需 API）
//!
//! 按顺序返回预置回复；预置回复用完后回显最后一条 User 消息。每次请求的消息都会被记录，便于断言 prompt 内容。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, Role};

/// Mock 客户端：脚本化回复 + 请求记录
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定回复
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for r in replies {
            mock.push_reply(r);
        }
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(Ok(reply.into()));
        }
    }

    /// 下一次调用返回错误（模拟后端故障）
    pub fn push_error(&self, err: impl Into<String>) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(Err(err.into()));
        }
    }

    /// 已收到的请求数
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// 所有请求的消息快照
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(messages.to_vec());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(reply) = scripted {
            return reply;
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {last_user}"))
    }
}
