//! 内存宿主（用于测试与无界面运行，无需真实游戏窗口）
//!
//! 记录所有显示过的行；未 dismiss 的行使消息窗口保持 busy；submit 模拟用户在输入框中回车。

use std::collections::HashMap;

use crate::host::{InputSurface, MessageSurface, SlotId, SlotValue, VariableStore};

#[derive(Debug, Default)]
pub struct MemoryHost {
    lines: Vec<String>,
    unread: usize,
    face: Option<(String, u32)>,
    input: Option<(SlotId, String)>,
    vars: HashMap<SlotId, SlotValue>,
    auto_dismiss: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// 消息一经显示即视为已读，窗口从不 busy
    pub fn with_auto_dismiss(mut self) -> Self {
        self.auto_dismiss = true;
        self
    }

    /// 用户关闭消息窗口
    pub fn dismiss(&mut self) {
        self.unread = 0;
    }

    /// 在打开的输入框中提交文本；输入框未打开时返回 false
    pub fn submit(&mut self, text: &str) -> bool {
        match self.input.take() {
            Some((slot, _)) => {
                self.vars.insert(slot, SlotValue::Text(text.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn face(&self) -> Option<(&str, u32)> {
        self.face.as_ref().map(|(image, index)| (image.as_str(), *index))
    }

    /// 当前打开的输入框：(绑定槽, 标签)
    pub fn input(&self) -> Option<(SlotId, &str)> {
        self.input.as_ref().map(|(slot, label)| (*slot, label.as_str()))
    }
}

impl MessageSurface for MemoryHost {
    fn set_face(&mut self, image: &str, index: u32) {
        self.face = Some((image.to_string(), index));
    }

    fn enqueue_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
        self.unread += 1;
    }

    fn is_busy(&self) -> bool {
        !self.auto_dismiss && self.unread > 0
    }
}

impl InputSurface for MemoryHost {
    fn open(&mut self, slot: SlotId, label: &str) {
        self.input = Some((slot, label.to_string()));
    }

    fn is_open(&self) -> bool {
        self.input.is_some()
    }
}

impl VariableStore for MemoryHost {
    fn get(&self, slot: SlotId) -> SlotValue {
        self.vars.get(&slot).cloned().unwrap_or_default()
    }

    fn set(&mut self, slot: SlotId, value: SlotValue) {
        self.vars.insert(slot, value);
    }
}
