//! 会话注册表：Agent 显示信息与进行中的交互
//!
//! 首次 create / ask 引用某个 Agent 时登记其头像，delete 时清除；
//! 进行中交互按 ID 保存快照，用于查询阶段与检查变量槽是否被占用。

use std::collections::HashMap;

use crate::core::{InteractionId, InteractionSnapshot};
use crate::host::SlotId;

/// Agent 的显示信息
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub face_image: String,
    pub face_index: u32,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, face_image: impl Into<String>, face_index: u32) -> Self {
        Self {
            name: name.into(),
            face_image: face_image.into(),
            face_index,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    agents: HashMap<String, AgentProfile>,
    pending: HashMap<InteractionId, InteractionSnapshot>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记或覆盖 Agent 显示信息
    pub fn register_agent(&mut self, profile: AgentProfile) {
        tracing::debug!(agent = %profile.name, face = %profile.face_image, index = profile.face_index, "register agent");
        self.agents.insert(profile.name.clone(), profile);
    }

    /// 已登记则返回现有信息，否则以默认头像登记
    pub fn ensure_agent(&mut self, name: &str, face_image: &str, face_index: u32) -> &AgentProfile {
        self.agents
            .entry(name.to_string())
            .or_insert_with(|| AgentProfile::new(name, face_image, face_index))
    }

    pub fn lookup(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.get(name)
    }

    /// 清除 Agent；未登记时为空操作
    pub fn forget(&mut self, name: &str) -> Option<AgentProfile> {
        self.agents.remove(name)
    }

    /// 新增或更新进行中交互的快照
    pub fn track(&mut self, snapshot: InteractionSnapshot) {
        self.pending.insert(snapshot.id, snapshot);
    }

    pub fn untrack(&mut self, id: InteractionId) -> Option<InteractionSnapshot> {
        self.pending.remove(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 占用该变量槽的进行中交互
    pub fn slot_holder(&self, slot: SlotId) -> Option<InteractionId> {
        self.pending
            .values()
            .find(|s| s.slots.map(|q| q.holds(slot)).unwrap_or(false))
            .map(|s| s.id)
    }
}
