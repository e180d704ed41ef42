//! 核心编排层：错误、交互状态、WaitGate、会话注册表、交互状态机、帧调度

pub mod error;
pub mod orchestrator;
pub mod scheduler;
pub mod session_registry;
pub mod state;
pub mod wait_gate;

pub use error::{CommandError, RemoteError};
pub use orchestrator::{Interaction, InteractionOrchestrator, OrchestratorSettings, AGENT_UNAVAILABLE};
pub use scheduler::{InteractionOutcome, TickScheduler};
pub use session_registry::{AgentProfile, SessionRegistry};
pub use state::{InteractionId, InteractionPhase, InteractionSnapshot, QuizSlots};
pub use wait_gate::{GateState, WaitGate};
