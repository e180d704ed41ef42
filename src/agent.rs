//! Agent 运行时
//!
//! 把配置、远程客户端、SessionRegistry 与 TickScheduler 组装在一起，供任意宿主使用：
//! dispatch 执行一行插件命令（create / delete 在后台完成，query / quiz 启动交互），
//! tick 由宿主每帧调用一次。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{
    AgentProfile, CommandError, Interaction, InteractionId, InteractionOrchestrator,
    InteractionOutcome, OrchestratorSettings, QuizSlots, RemoteError, SessionRegistry,
    TickScheduler,
};
use crate::dialogue::{parse_command, substitute_variables, PluginCommand};
use crate::host::Host;
use crate::remote::{HttpAgentClient, Owner, RemoteAgent, TimedRemoteAgent};

pub struct AgentRuntime {
    settings: Arc<OrchestratorSettings>,
    remote: Arc<dyn RemoteAgent>,
    owner: Owner,
    default_face: (String, u32),
    registry: SessionRegistry,
    scheduler: TickScheduler,
}

impl AgentRuntime {
    /// 使用 HTTP 客户端连接 [server].base_url，每次请求受 [timeouts].request 限制
    pub fn from_config(cfg: &AppConfig) -> Result<Self, RemoteError> {
        let http = HttpAgentClient::new(&cfg.server.base_url, cfg.timeouts.request)?;
        let remote = TimedRemoteAgent::new(
            Arc::new(http),
            Duration::from_secs(cfg.timeouts.request),
        );
        tracing::info!(
            base_url = %cfg.server.base_url,
            user = %cfg.player.username,
            teacher = %cfg.player.teacher,
            "FOI agent runtime"
        );
        Ok(Self::new(Arc::new(remote), cfg))
    }

    pub fn new(remote: Arc<dyn RemoteAgent>, cfg: &AppConfig) -> Self {
        Self {
            settings: Arc::new(OrchestratorSettings::from_config(cfg)),
            remote,
            owner: Owner::new(cfg.player.teacher.clone(), cfg.player.username.clone()),
            default_face: (
                cfg.display.default_face_image.clone(),
                cfg.display.default_face_index,
            ),
            registry: SessionRegistry::new(),
            scheduler: TickScheduler::new(),
        }
    }

    /// 解析并执行一行命令；启动了交互时返回其 ID
    pub fn dispatch(&mut self, line: &str, host: &mut dyn Host) -> Result<Option<InteractionId>, CommandError> {
        let command = parse_command(line)?;
        self.execute(command, host)
    }

    pub fn execute(
        &mut self,
        command: PluginCommand,
        host: &mut dyn Host,
    ) -> Result<Option<InteractionId>, CommandError> {
        tracing::debug!(agent = %command.agent_name(), command = ?command, "execute");
        match command {
            PluginCommand::NewAgent { name, face, prompt } => {
                let (image, index) = face.unwrap_or_else(|| self.default_face.clone());
                self.registry
                    .register_agent(AgentProfile::new(name.clone(), image, index));
                self.spawn_create(name, prompt);
                Ok(None)
            }
            PluginCommand::Query { name, prompt } => {
                let prompt = substitute_variables(&prompt, &*host);
                self.ensure_agent(&name);
                let interaction = Interaction::query(name, prompt);
                Ok(Some(self.submit(interaction)))
            }
            PluginCommand::Quiz {
                name,
                answer_slot,
                verdict_slot,
            } => {
                for slot in [answer_slot, verdict_slot] {
                    if let Some(holder) = self.registry.slot_holder(slot) {
                        return Err(CommandError::SlotBusy(slot.0, holder.as_u64()));
                    }
                }
                self.ensure_agent(&name);
                let slots = QuizSlots {
                    answer: answer_slot,
                    verdict: verdict_slot,
                };
                let interaction =
                    Interaction::quiz(name, self.settings.elicitation_prompt.clone(), slots);
                Ok(Some(self.submit(interaction)))
            }
            PluginCommand::Delete { name } => {
                self.registry.forget(&name);
                self.spawn_delete(name);
                Ok(None)
            }
        }
    }

    /// 宿主每帧调用一次
    pub fn tick(&mut self, host: &mut dyn Host) -> Vec<InteractionOutcome> {
        self.scheduler.tick(host, &mut self.registry)
    }

    /// 宿主退出：终止所有进行中的交互并释放其调用方
    pub fn shutdown(&mut self, host: &mut dyn Host) -> Vec<InteractionOutcome> {
        self.scheduler
            .abort_all(host, &mut self.registry, "host shutting down")
    }

    /// 登记并创建 Agent，等待服务端结果
    pub async fn create_agent(
        &mut self,
        name: &str,
        face: Option<(String, u32)>,
        system_prompt: &str,
    ) -> Result<(), RemoteError> {
        let (image, index) = face.unwrap_or_else(|| self.default_face.clone());
        self.registry.register_agent(AgentProfile::new(name, image, index));
        self.remote
            .create(&self.owner, name, system_prompt)
            .await
            .inspect_err(|e| tracing::error!(agent = %name, error = %e, "failed to create agent"))
    }

    /// 清除登记并删除服务端 Agent；本地未登记时同样发出请求
    pub async fn delete_agent(&mut self, name: &str) -> Result<(), RemoteError> {
        self.registry.forget(name);
        self.remote
            .delete(&self.owner, name)
            .await
            .inspect_err(|e| tracing::error!(agent = %name, error = %e, "failed to delete agent"))
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// 调用方是否仍在等待该交互
    pub fn is_waiting(&self, id: InteractionId) -> bool {
        self.scheduler.is_waiting(id)
    }

    fn ensure_agent(&mut self, name: &str) {
        let (image, index) = &self.default_face;
        self.registry.ensure_agent(name, image, *index);
    }

    fn submit(&mut self, interaction: Interaction) -> InteractionId {
        let orch = InteractionOrchestrator::new(
            interaction,
            Arc::clone(&self.remote),
            self.owner.clone(),
            Arc::clone(&self.settings),
        );
        self.scheduler.submit(orch, &mut self.registry)
    }

    fn spawn_create(&self, name: String, prompt: String) {
        let remote = Arc::clone(&self.remote);
        let owner = self.owner.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.create(&owner, &name, &prompt).await {
                tracing::error!(agent = %name, error = %e, "failed to create agent");
            }
        });
    }

    fn spawn_delete(&self, name: String) {
        let remote = Arc::clone(&self.remote);
        let owner = self.owner.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.delete(&owner, &name).await {
                tracing::error!(agent = %name, error = %e, "failed to delete agent");
            }
        });
    }
}
