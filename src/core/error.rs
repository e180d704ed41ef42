//! 错误类型：远程 Agent 调用错误与插件命令错误
//!
//! RemoteError 由 RemoteAgent 各实现返回；编排器遇到 ask 失败时转入 Error 阶段并释放调用方。
//! CommandError 由命令解析与 AgentRuntime::dispatch 返回，不会启动任何交互。

use std::time::Duration;

use thiserror::Error;

/// 远程 Agent 服务调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// 传输层失败、非 2xx 状态或无法解析的响应信封
    #[error("Network error: {0}")]
    Network(String),

    /// 信封解析成功但 status 不是 "success"，携带服务端给出的 message / response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 请求在配置的时限内没有完成
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// 插件命令解析 / 分发失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// 参数不足，携带用法说明
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// 变量槽已被另一个进行中的交互占用
    #[error("Slot {0} is held by interaction {1}")]
    SlotBusy(u32, u64),
}
