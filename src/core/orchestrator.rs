//! 交互编排器：单个交互的状态机
//!
//! Asking -> DisplayingQuestion -> AwaitingAnswer -> Verifying -> DisplayingFeedback -> Done，
//! 任意阶段可转入 Error。查询交互（无变量槽）在问题显示完后直接 Done。
//!
//! 宿主每帧调用一次 step：网络请求在 tokio 任务中执行，结果经 oneshot 送回并在某一帧被取走恰好一次；
//! 显示、作答、判题之间的等待全部由 WaitGate 轮询完成，从不阻塞宿主循环。
//! 调用方从 start 起挂起，到 Done / Error 时恰好恢复一次。

use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::core::{
    InteractionId, InteractionPhase, InteractionSnapshot, QuizSlots, RemoteError, SessionRegistry,
    WaitGate,
};
use crate::dialogue::{wrap_text, Verdict, VerdictParser};
use crate::host::{Host, SlotValue};
use crate::remote::{Owner, RemoteAgent};

/// ask 失败时显示给玩家的诊断行
pub const AGENT_UNAVAILABLE: &str = "The agent could not answer right now.";

/// 编排参数（来自 [display] 与 [quiz] 配置）
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub wrap_width: usize,
    pub name_color: u32,
    pub elicitation_prompt: String,
    pub verification_template: String,
    pub input_label: String,
    pub verdict_parser: VerdictParser,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            wrap_width: cfg.display.wrap_width.max(1),
            name_color: cfg.display.name_color,
            elicitation_prompt: cfg.quiz.elicitation_prompt.clone(),
            verification_template: cfg.quiz.verification_template.clone(),
            input_label: cfg.quiz.input_label.clone(),
            verdict_parser: VerdictParser::new(cfg.quiz.pass_token.clone()),
        }
    }

    /// 填充判题模板：{pass_token}、{question}、{answer}
    ///
    /// 只扫描模板本身一遍；题目与作答中的花括号原样保留。
    pub fn verification_prompt(&self, question: &str, answer: &str) -> String {
        placeholder_pattern()
            .replace_all(&self.verification_template, |caps: &Captures| match &caps[1] {
                "question" => question.to_string(),
                "answer" => answer.to_string(),
                _ => self.verdict_parser.pass_token().to_string(),
            })
            .into_owned()
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{(question|answer|pass_token)\}").expect("valid placeholder pattern")
    })
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 一次问答 / 测验交互
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub id: InteractionId,
    pub agent_name: String,
    /// 第一次 ask 使用的提示词
    pub prompt: String,
    /// None 表示只提问并显示回复
    pub slots: Option<QuizSlots>,
}

impl Interaction {
    pub fn query(agent_name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: InteractionId::new(),
            agent_name: agent_name.into(),
            prompt: prompt.into(),
            slots: None,
        }
    }

    pub fn quiz(agent_name: impl Into<String>, elicitation_prompt: impl Into<String>, slots: QuizSlots) -> Self {
        Self {
            id: InteractionId::new(),
            agent_name: agent_name.into(),
            prompt: elicitation_prompt.into(),
            slots: Some(slots),
        }
    }
}

/// 进行中的一次 ask：回复通道与执行它的任务
struct InFlight {
    reply: oneshot::Receiver<Result<String, RemoteError>>,
    task: JoinHandle<()>,
}

pub struct InteractionOrchestrator {
    interaction: Interaction,
    phase: InteractionPhase,
    settings: Arc<OrchestratorSettings>,
    remote: Arc<dyn RemoteAgent>,
    owner: Owner,
    /// 发起命令的调用方
    caller: WaitGate,
    /// 当前步骤的等待
    gate: WaitGate,
    in_flight: Option<InFlight>,
    question: Option<String>,
    answer: Option<String>,
    verdict: Option<Verdict>,
    error: Option<RemoteError>,
}

impl InteractionOrchestrator {
    pub fn new(
        interaction: Interaction,
        remote: Arc<dyn RemoteAgent>,
        owner: Owner,
        settings: Arc<OrchestratorSettings>,
    ) -> Self {
        Self {
            interaction,
            phase: InteractionPhase::Asking,
            settings,
            remote,
            owner,
            caller: WaitGate::new(),
            gate: WaitGate::new(),
            in_flight: None,
            question: None,
            answer: None,
            verdict: None,
            error: None,
        }
    }

    /// 挂起调用方并发出第一次 ask（需在 tokio 运行时内调用）
    pub fn start(&mut self) {
        let id = self.interaction.id;
        self.caller.enter(id);
        tracing::info!(
            interaction = %id,
            agent = %self.interaction.agent_name,
            quiz = self.interaction.slots.is_some(),
            "interaction started"
        );
        let prompt = self.interaction.prompt.clone();
        self.spawn_ask(prompt);
    }

    /// 推进一帧，返回推进后的阶段
    pub fn step(&mut self, host: &mut dyn Host, registry: &SessionRegistry) -> InteractionPhase {
        match self.phase {
            InteractionPhase::Asking => match self.take_reply() {
                None => {}
                Some(Ok(question)) => {
                    self.transition(InteractionPhase::DisplayingQuestion);
                    self.show(host, registry, &question);
                    self.question = Some(question);
                    self.gate.enter(self.interaction.id);
                }
                Some(Err(err)) => self.fail(host, registry, err),
            },
            InteractionPhase::DisplayingQuestion => {
                if self.gate.poll(|| !host.is_busy()) {
                    match self.interaction.slots {
                        None => self.finish(),
                        Some(slots) => {
                            self.transition(InteractionPhase::AwaitingAnswer);
                            host.set(slots.answer, SlotValue::Pending);
                            host.open(slots.answer, &self.settings.input_label);
                            self.gate.enter(self.interaction.id);
                        }
                    }
                }
            }
            InteractionPhase::AwaitingAnswer => {
                let Some(slots) = self.interaction.slots else {
                    return self.phase;
                };
                let answered = self
                    .gate
                    .poll(|| !host.get(slots.answer).is_pending() && !host.is_open());
                if answered {
                    let answer = host.get(slots.answer).as_text();
                    self.transition(InteractionPhase::Verifying);
                    host.set(slots.verdict, SlotValue::Pending);
                    let question = self.question.as_deref().unwrap_or_default();
                    let prompt = self.settings.verification_prompt(question, &answer);
                    self.answer = Some(answer);
                    self.spawn_ask(prompt);
                }
            }
            InteractionPhase::Verifying => {
                let Some(slots) = self.interaction.slots else {
                    return self.phase;
                };
                match self.take_reply() {
                    None => {}
                    Some(Ok(raw)) => {
                        let verdict = self.settings.verdict_parser.parse(&raw);
                        tracing::info!(
                            interaction = %self.interaction.id,
                            agent = %self.interaction.agent_name,
                            passed = verdict.passed,
                            "verdict"
                        );
                        self.transition(InteractionPhase::DisplayingFeedback);
                        host.set(slots.verdict, SlotValue::Bool(verdict.passed));
                        self.show(host, registry, &verdict.feedback);
                        self.verdict = Some(verdict);
                        self.gate.enter(self.interaction.id);
                    }
                    Some(Err(err)) => {
                        host.set(slots.verdict, SlotValue::Bool(false));
                        self.verdict = Some(Verdict::failed(AGENT_UNAVAILABLE));
                        self.fail(host, registry, err);
                    }
                }
            }
            InteractionPhase::DisplayingFeedback => {
                let Some(slots) = self.interaction.slots else {
                    return self.phase;
                };
                let settled = self
                    .gate
                    .poll(|| !host.is_busy() && !host.get(slots.verdict).is_pending());
                if settled {
                    self.finish();
                }
            }
            InteractionPhase::Done | InteractionPhase::Error => {}
        }
        self.phase
    }

    /// 外部终止（如宿主退出）：转入 Error 并释放调用方；已结束时为空操作
    pub fn abort(&mut self, host: &mut dyn Host, reason: &str) {
        if self.phase.is_terminal() {
            return;
        }
        tracing::warn!(
            interaction = %self.interaction.id,
            agent = %self.interaction.agent_name,
            phase = ?self.phase,
            reason = %reason,
            "interaction aborted"
        );
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
        if let Some(slots) = self.interaction.slots {
            if host.get(slots.verdict).is_pending() {
                host.set(slots.verdict, SlotValue::Bool(false));
            }
        }
        self.gate.release();
        self.transition(InteractionPhase::Error);
        self.resume_caller();
    }

    fn fail(&mut self, host: &mut dyn Host, registry: &SessionRegistry, err: RemoteError) {
        tracing::warn!(
            interaction = %self.interaction.id,
            agent = %self.interaction.agent_name,
            phase = ?self.phase,
            error = %err,
            "interaction failed"
        );
        self.show(host, registry, AGENT_UNAVAILABLE);
        self.error = Some(err);
        self.gate.release();
        self.transition(InteractionPhase::Error);
        self.resume_caller();
    }

    fn finish(&mut self) {
        self.gate.release();
        self.transition(InteractionPhase::Done);
        self.resume_caller();
    }

    fn resume_caller(&mut self) {
        if !self.caller.release() {
            tracing::warn!(interaction = %self.interaction.id, "caller was not suspended");
        }
    }

    fn transition(&mut self, to: InteractionPhase) {
        tracing::debug!(
            interaction = %self.interaction.id,
            from = ?self.phase,
            to = ?to,
            "transition"
        );
        self.phase = to;
    }

    /// 头像与名字行（已登记时）后接换行后的正文
    fn show(&self, host: &mut dyn Host, registry: &SessionRegistry, text: &str) {
        if let Some(profile) = registry.lookup(&self.interaction.agent_name) {
            host.set_face(&profile.face_image, profile.face_index);
            host.enqueue_line(&format!("\\c[{}]{}:\\c[0]", self.settings.name_color, profile.name));
        }
        for line in wrap_text(text, self.settings.wrap_width) {
            host.enqueue_line(&line);
        }
    }

    fn spawn_ask(&mut self, prompt: String) {
        debug_assert!(self.in_flight.is_none(), "one request in flight per interaction");
        let (tx, rx) = oneshot::channel();
        let remote = Arc::clone(&self.remote);
        let owner = self.owner.clone();
        let agent = self.interaction.agent_name.clone();
        let id = self.interaction.id;
        let task = tokio::spawn(async move {
            tracing::debug!(interaction = %id, agent = %agent, "ask");
            let result = remote.ask(&owner, &agent, &prompt).await;
            let _ = tx.send(result);
        });
        self.in_flight = Some(InFlight { reply: rx, task });
    }

    fn take_reply(&mut self) -> Option<Result<String, RemoteError>> {
        let in_flight = self.in_flight.as_mut()?;
        match in_flight.reply.try_recv() {
            Ok(result) => {
                self.in_flight = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.in_flight = None;
                Some(Err(RemoteError::Network(
                    "request task ended without a reply".to_string(),
                )))
            }
        }
    }

    pub fn id(&self) -> InteractionId {
        self.interaction.id
    }

    pub fn phase(&self) -> InteractionPhase {
        self.phase
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn error(&self) -> Option<&RemoteError> {
        self.error.as_ref()
    }

    pub fn is_caller_suspended(&self) -> bool {
        self.caller.is_suspended()
    }

    /// 调用方被恢复的次数（正常为 0 或 1）
    pub fn caller_resumes(&self) -> u32 {
        self.caller.resumes()
    }

    pub fn snapshot(&self) -> InteractionSnapshot {
        InteractionSnapshot {
            id: self.interaction.id,
            agent: self.interaction.agent_name.clone(),
            phase: self.phase,
            slots: self.interaction.slots,
        }
    }
}
