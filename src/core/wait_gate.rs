//! WaitGate：协作式挂起原语
//!
//! 宿主循环不能阻塞线程，只能「每帧回来看一次」。enter 挂起持有者；宿主每帧调用一次 poll，
//! 条件成立时恢复并返回 true；release 无条件恢复，用于错误路径，重复调用无副作用。
//! 每次 enter 至多对应一次恢复。

use crate::core::InteractionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Runnable,
    Suspended,
}

#[derive(Debug)]
pub struct WaitGate {
    owner: Option<InteractionId>,
    state: GateState,
    resumes: u32,
}

impl Default for WaitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitGate {
    pub fn new() -> Self {
        Self {
            owner: None,
            state: GateState::Runnable,
            resumes: 0,
        }
    }

    /// 挂起持有者；已挂起时只更新持有者
    pub fn enter(&mut self, owner: InteractionId) {
        if self.state == GateState::Suspended {
            tracing::debug!(owner = %owner, "wait gate entered while already suspended");
        }
        self.owner = Some(owner);
        self.state = GateState::Suspended;
    }

    /// 每帧调用一次：未挂起时直接返回 true；条件成立则恢复并返回 true，否则等待下一帧
    pub fn poll(&mut self, condition: impl FnOnce() -> bool) -> bool {
        match self.state {
            GateState::Runnable => true,
            GateState::Suspended => {
                if condition() {
                    self.resume();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// 无条件恢复；返回本次调用是否真的恢复了持有者
    pub fn release(&mut self) -> bool {
        match self.state {
            GateState::Runnable => false,
            GateState::Suspended => {
                self.resume();
                true
            }
        }
    }

    fn resume(&mut self) {
        self.state = GateState::Runnable;
        self.resumes += 1;
    }

    pub fn is_suspended(&self) -> bool {
        self.state == GateState::Suspended
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn owner(&self) -> Option<InteractionId> {
        self.owner
    }

    /// 累计恢复次数
    pub fn resumes(&self) -> u32 {
        self.resumes
    }
}
