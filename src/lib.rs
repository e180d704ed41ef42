//! FOI Agent - 为回合制游戏宿主提供远程 AI Agent 对话与测验
//!
//! 模块划分：
//! - **agent**: AgentRuntime，解析插件命令并驱动交互
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 交互状态机、WaitGate、会话注册表、帧调度、错误类型
//! - **dialogue**: 命令解析、变量替换、文本换行、判题结果解析
//! - **host**: 宿主抽象（消息窗口 / 输入框 / 变量表）与控制台、内存实现
//! - **observability**: tracing 日志初始化
//! - **remote**: FOI REST 客户端抽象与实现（HTTP / Mock / 超时包装）

pub mod agent;
pub mod config;
pub mod core;
pub mod dialogue;
pub mod host;
pub mod observability;
pub mod remote;

pub use agent::AgentRuntime;
