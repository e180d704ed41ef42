//! 控制台宿主：把消息窗口、输入框与变量表映射到标准输入输出
//!
//! stdin 的每一行按优先级消费：输入框打开时作为答案；消息窗口 busy 时作为「翻页」；否则作为插件命令返回给调用方。
//! `\c[n]` 颜色码在打印时去除。

use std::collections::HashMap;
use std::io::Write;

use regex::Regex;

use crate::host::{InputSurface, MessageSurface, SlotId, SlotValue, VariableStore};

pub struct ConsoleHost {
    awaiting_dismiss: bool,
    input: Option<SlotId>,
    vars: HashMap<SlotId, SlotValue>,
    color_code: Regex,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self {
            awaiting_dismiss: false,
            input: None,
            vars: HashMap::new(),
            // 字面量正则，不会失败
            color_code: Regex::new(r"\\c\[\d+\]").expect("valid color code pattern"),
        }
    }

    /// 消费一行 stdin；未被消息窗口或输入框吃掉的行原样返回（视为命令）
    pub fn feed(&mut self, line: &str) -> Option<String> {
        if let Some(slot) = self.input.take() {
            self.vars.insert(slot, SlotValue::Text(line.trim().to_string()));
            return None;
        }
        if self.awaiting_dismiss {
            self.awaiting_dismiss = false;
            return None;
        }
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    /// 是否有交互在等 stdin（翻页或作答）
    pub fn needs_input(&self) -> bool {
        self.awaiting_dismiss || self.input.is_some()
    }

    fn render(&self, text: &str) -> String {
        self.color_code.replace_all(text, "").into_owned()
    }
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSurface for ConsoleHost {
    fn set_face(&mut self, image: &str, index: u32) {
        tracing::debug!(image = %image, index, "face");
    }

    fn enqueue_line(&mut self, text: &str) {
        println!("  {}", self.render(text));
        self.awaiting_dismiss = true;
    }

    fn is_busy(&self) -> bool {
        self.awaiting_dismiss
    }
}

impl InputSurface for ConsoleHost {
    fn open(&mut self, slot: SlotId, label: &str) {
        print!("{} > ", label);
        let _ = std::io::stdout().flush();
        self.input = Some(slot);
    }

    fn is_open(&self) -> bool {
        self.input.is_some()
    }
}

impl VariableStore for ConsoleHost {
    fn get(&self, slot: SlotId) -> SlotValue {
        self.vars.get(&slot).cloned().unwrap_or_default()
    }

    fn set(&mut self, slot: SlotId, value: SlotValue) {
        self.vars.insert(slot, value);
    }
}
