//! 对话层：插件命令解析、消息换行、判题结果解析

pub mod command;
pub mod verdict;
pub mod wrap;

pub use command::{parse_command, substitute_variables, PluginCommand};
pub use verdict::{Verdict, VerdictParser, NO_FEEDBACK, UNREADABLE_VERDICT};
pub use wrap::{wrap_text, DEFAULT_WRAP_WIDTH};
