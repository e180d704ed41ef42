//! 宿主协作方接口：消息窗口、模态输入框、变量表
//!
//! 编排器只通过这三个 trait 与宿主交互；宿主每帧调用一次 AgentRuntime::tick。
//! - MemoryHost：内存实现，供测试与无界面场景
//! - ConsoleHost：控制台实现，供 foi-agent 二进制

pub mod console;
pub mod memory;

use std::fmt;

pub use console::ConsoleHost;
pub use memory::MemoryHost;

/// 变量槽编号（对应宿主变量表的下标）
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 变量槽中的值
///
/// `Pending` 是「尚未作答」的哨兵；输入框与远程回复只会产生 `Text`，因此哨兵不会与真实数据冲突。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SlotValue {
    #[default]
    Empty,
    Pending,
    Text(String),
    Number(i64),
    Bool(bool),
}

impl SlotValue {
    pub fn is_pending(&self) -> bool {
        matches!(self, SlotValue::Pending)
    }

    /// 文本形式（用于拼接提示词）；Empty / Pending 为空串
    pub fn as_text(&self) -> String {
        match self {
            SlotValue::Empty | SlotValue::Pending => String::new(),
            SlotValue::Text(s) => s.clone(),
            SlotValue::Number(n) => n.to_string(),
            SlotValue::Bool(b) => b.to_string(),
        }
    }
}

/// 消息窗口：逐行显示文本，用户未读完前报告 busy
pub trait MessageSurface {
    /// 设置下一批消息使用的头像
    fn set_face(&mut self, image: &str, index: u32);

    fn enqueue_line(&mut self, text: &str);

    fn is_busy(&self) -> bool;
}

/// 模态输入框：打开后收集一行文本写入绑定的变量槽，随后关闭
pub trait InputSurface {
    fn open(&mut self, slot: SlotId, label: &str);

    fn is_open(&self) -> bool;
}

/// 变量表：步骤之间唯一的通信通道
pub trait VariableStore {
    fn get(&self, slot: SlotId) -> SlotValue;

    fn set(&mut self, slot: SlotId, value: SlotValue);
}

/// 编排器需要的完整宿主能力
pub trait Host: MessageSurface + InputSurface + VariableStore {}

impl<T: MessageSurface + InputSurface + VariableStore + ?Sized> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_distinct_from_text() {
        assert!(SlotValue::Pending.is_pending());
        assert!(!SlotValue::Text("Pending".to_string()).is_pending());
        assert!(!SlotValue::Text(String::new()).is_pending());
    }

    #[test]
    fn test_as_text() {
        assert_eq!(SlotValue::Number(7).as_text(), "7");
        assert_eq!(SlotValue::Bool(true).as_text(), "true");
        assert_eq!(SlotValue::Pending.as_text(), "");
    }
}
