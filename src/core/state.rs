//! 交互状态定义：阶段、交互 ID、进行中交互的快照
//!
//! 编排器维护完整状态；SessionRegistry 只保存轻量快照，用于查询进行中的交互与变量槽占用。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::host::SlotId;

/// 交互 ID（进程内单调递增）
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InteractionId(u64);

static NEXT_INTERACTION_ID: AtomicU64 = AtomicU64::new(1);

impl Default for InteractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionId {
    pub fn new() -> Self {
        Self(NEXT_INTERACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InteractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 交互阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionPhase {
    Asking,
    DisplayingQuestion,
    AwaitingAnswer,
    Verifying,
    DisplayingFeedback,
    Done,
    Error,
}

impl InteractionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, InteractionPhase::Done | InteractionPhase::Error)
    }
}

/// 测验交互绑定的两个变量槽
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSlots {
    /// 原始答案写入处
    pub answer: SlotId,
    /// 通过 / 未通过写入处
    pub verdict: SlotId,
}

impl QuizSlots {
    pub fn holds(&self, slot: SlotId) -> bool {
        self.answer == slot || self.verdict == slot
    }
}

/// 进行中交互的快照
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionSnapshot {
    pub id: InteractionId,
    pub agent: String,
    pub phase: InteractionPhase,
    pub slots: Option<QuizSlots>,
}
