//! Mock 远程 Agent（用于测试，无需 FOI 服务）
//!
//! ask 按顺序返回预置回复，队列为空时回显提示词；记录每次调用，便于断言请求顺序。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::RemoteError;
use crate::remote::{Owner, RemoteAgent};

/// Mock 记录的一次调用
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    Create { agent: String, system_prompt: String },
    Ask { agent: String, prompt: String },
    Delete { agent: String },
}

#[derive(Debug, Default)]
pub struct MockRemoteAgent {
    replies: Mutex<VecDeque<Result<String, RemoteError>>>,
    create_result: Mutex<Option<RemoteError>>,
    delete_result: Mutex<Option<RemoteError>>,
    calls: Mutex<Vec<MockCall>>,
    hang: bool,
}

impl MockRemoteAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有请求永不返回（测试超时）
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// 追加一个 ask 回复
    pub fn push_reply(&self, reply: Result<String, RemoteError>) {
        lock(&self.replies).push_back(reply);
    }

    pub fn fail_create(&self, err: RemoteError) {
        *lock(&self.create_result) = Some(err);
    }

    pub fn fail_delete(&self, err: RemoteError) {
        *lock(&self.delete_result) = Some(err);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    async fn maybe_hang(&self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteAgent for MockRemoteAgent {
    async fn create(&self, _owner: &Owner, agent: &str, system_prompt: &str) -> Result<(), RemoteError> {
        self.record(MockCall::Create {
            agent: agent.to_string(),
            system_prompt: system_prompt.to_string(),
        });
        self.maybe_hang().await;
        match lock(&self.create_result).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn ask(&self, _owner: &Owner, agent: &str, prompt: &str) -> Result<String, RemoteError> {
        self.record(MockCall::Ask {
            agent: agent.to_string(),
            prompt: prompt.to_string(),
        });
        self.maybe_hang().await;
        let scripted = lock(&self.replies).pop_front();
        scripted.unwrap_or_else(|| Ok(format!("Echo from Mock: {}", prompt)))
    }

    async fn delete(&self, _owner: &Owner, agent: &str) -> Result<(), RemoteError> {
        self.record(MockCall::Delete {
            agent: agent.to_string(),
        });
        self.maybe_hang().await;
        match lock(&self.delete_result).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_echo() {
        let mock = MockRemoteAgent::new();
        mock.push_reply(Err(RemoteError::Network("down".to_string())));
        let owner = Owner::new("prof", "ana");

        assert!(mock.ask(&owner, "Tutor", "a").await.is_err());
        assert_eq!(mock.ask(&owner, "Tutor", "b").await.unwrap(), "Echo from Mock: b");
        assert_eq!(mock.calls().len(), 2);
    }
}
