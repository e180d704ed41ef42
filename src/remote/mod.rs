//! 远程层：FOI Agent 服务客户端抽象与实现（HTTP / Mock / 超时包装）

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpAgentClient;
pub use mock::{MockCall, MockRemoteAgent};
pub use traits::{Owner, RemoteAgent, TimedRemoteAgent};
