//! 远程 Agent 客户端抽象
//!
//! 所有后端（HTTP / Mock）实现 RemoteAgent：create、ask、delete 三种单次请求，不重试。
//! TimedRemoteAgent 为任意实现的每次请求加上超时。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::RemoteError;

/// 请求身份：create 需要老师（owner）与玩家，ask / delete 只用玩家
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub teacher: String,
    pub user: String,
}

impl Owner {
    pub fn new(teacher: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            teacher: teacher.into(),
            user: user.into(),
        }
    }
}

/// 远程对话 Agent 服务
#[async_trait]
pub trait RemoteAgent: Send + Sync {
    /// 在服务端注册 Agent，system_prompt 作为其初始上下文
    async fn create(&self, owner: &Owner, agent: &str, system_prompt: &str) -> Result<(), RemoteError>;

    /// 向 Agent 提问，返回回复文本
    async fn ask(&self, owner: &Owner, agent: &str, prompt: &str) -> Result<String, RemoteError>;

    /// 删除 Agent；调用方把失败当作可记录、非致命
    async fn delete(&self, owner: &Owner, agent: &str) -> Result<(), RemoteError>;
}

/// 超时包装：超时返回 RemoteError::Timeout
pub struct TimedRemoteAgent {
    inner: Arc<dyn RemoteAgent>,
    timeout: Duration,
}

impl TimedRemoteAgent {
    pub fn new(inner: Arc<dyn RemoteAgent>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn expired(&self) -> RemoteError {
        RemoteError::Timeout(self.timeout)
    }
}

#[async_trait]
impl RemoteAgent for TimedRemoteAgent {
    async fn create(&self, owner: &Owner, agent: &str, system_prompt: &str) -> Result<(), RemoteError> {
        tokio::time::timeout(self.timeout, self.inner.create(owner, agent, system_prompt))
            .await
            .map_err(|_| self.expired())?
    }

    async fn ask(&self, owner: &Owner, agent: &str, prompt: &str) -> Result<String, RemoteError> {
        tokio::time::timeout(self.timeout, self.inner.ask(owner, agent, prompt))
            .await
            .map_err(|_| self.expired())?
    }

    async fn delete(&self, owner: &Owner, agent: &str) -> Result<(), RemoteError> {
        tokio::time::timeout(self.timeout, self.inner.delete(owner, agent))
            .await
            .map_err(|_| self.expired())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockRemoteAgent;

    #[tokio::test]
    async fn test_timeout_on_hanging_agent() {
        let agent = TimedRemoteAgent::new(
            Arc::new(MockRemoteAgent::hanging()),
            Duration::from_millis(20),
        );
        let owner = Owner::new("prof", "ana");
        let err = agent.ask(&owner, "Tutor", "hi").await.unwrap_err();
        assert_eq!(err, RemoteError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_passthrough_when_fast() {
        let mock = MockRemoteAgent::new();
        mock.push_reply(Ok("4".to_string()));
        let agent = TimedRemoteAgent::new(Arc::new(mock), Duration::from_secs(5));
        let owner = Owner::new("prof", "ana");
        assert_eq!(agent.ask(&owner, "Tutor", "2+2?").await.unwrap(), "4");
    }
}
