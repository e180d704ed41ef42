//! 帧调度：宿主每帧调用一次 tick，推进所有进行中的交互
//!
//! 交互之间互不排序；结束（Done / Error）的交互在当帧移出并从 SessionRegistry 注销。

use crate::core::{
    InteractionId, InteractionOrchestrator, InteractionPhase, RemoteError, SessionRegistry,
};
use crate::dialogue::Verdict;
use crate::host::Host;

/// 交互结束时交给宿主的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub id: InteractionId,
    pub agent: String,
    pub phase: InteractionPhase,
    /// 测验中显示给玩家的题目（查询交互为回复文本）
    pub question: Option<String>,
    pub answer: Option<String>,
    pub verdict: Option<Verdict>,
    pub error: Option<RemoteError>,
}

impl InteractionOutcome {
    fn from_orchestrator(orch: &InteractionOrchestrator) -> Self {
        Self {
            id: orch.id(),
            agent: orch.interaction().agent_name.clone(),
            phase: orch.phase(),
            question: orch.question().map(str::to_string),
            answer: orch.answer().map(str::to_string),
            verdict: orch.verdict().cloned(),
            error: orch.error().cloned(),
        }
    }
}

#[derive(Default)]
pub struct TickScheduler {
    active: Vec<InteractionOrchestrator>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记并启动交互（需在 tokio 运行时内调用）
    pub fn submit(&mut self, mut orch: InteractionOrchestrator, registry: &mut SessionRegistry) -> InteractionId {
        orch.start();
        registry.track(orch.snapshot());
        let id = orch.id();
        self.active.push(orch);
        id
    }

    /// 推进一帧，返回本帧结束的交互
    pub fn tick(&mut self, host: &mut dyn Host, registry: &mut SessionRegistry) -> Vec<InteractionOutcome> {
        for orch in self.active.iter_mut() {
            orch.step(host, registry);
            registry.track(orch.snapshot());
        }
        self.collect_finished(registry)
    }

    /// 终止所有进行中的交互（宿主退出时）
    pub fn abort_all(
        &mut self,
        host: &mut dyn Host,
        registry: &mut SessionRegistry,
        reason: &str,
    ) -> Vec<InteractionOutcome> {
        for orch in self.active.iter_mut() {
            orch.abort(host, reason);
        }
        self.collect_finished(registry)
    }

    fn collect_finished(&mut self, registry: &mut SessionRegistry) -> Vec<InteractionOutcome> {
        let mut finished = Vec::new();
        self.active.retain(|orch| {
            if orch.phase().is_terminal() {
                registry.untrack(orch.id());
                tracing::info!(
                    interaction = %orch.id(),
                    agent = %orch.interaction().agent_name,
                    phase = ?orch.phase(),
                    "interaction finished"
                );
                finished.push(InteractionOutcome::from_orchestrator(orch));
                false
            } else {
                true
            }
        });
        finished
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn get(&self, id: InteractionId) -> Option<&InteractionOrchestrator> {
        self.active.iter().find(|o| o.id() == id)
    }

    /// 调用方是否仍在等待该交互
    pub fn is_waiting(&self, id: InteractionId) -> bool {
        self.get(id).map(|o| o.is_caller_suspended()).unwrap_or(false)
    }
}
