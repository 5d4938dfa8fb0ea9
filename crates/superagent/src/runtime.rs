//! Wires every subsystem into one runtime (spec §1 overview, §5
//! concurrency model): the event bus is the only channel agents
//! communicate over, matching spec §9's "agents know only the bus".
//! Grounded on the teacher's top-level agent assembly in
//! `agent/src/agent.rs`'s constructor, which wires provider registry,
//! session store, and tool registry the same way.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use superagent_agents::{ExecutorAgent, MemoryAgent, MonitorAgent, Orchestrator, PlannerAgent};
use superagent_events::{AgentEvent, EventBus, EventHandler, EventType};
use superagent_executor::{SnapshotManager, ToolRegistry, TransactionalExecutor};
use superagent_memory::AdaptiveMemory;
#[cfg(feature = "reqwest-client")]
use superagent_providers::HttpAdapter;
use superagent_providers::ProviderRouter;
use superagent_protocol::NdjsonWriter;
use superagent_ux::UxStateMachine;

use crate::config::RuntimeConfig;
use crate::error::SuperAgentError;

/// The assembled SuperAgent execution core. Every field is an `Arc` so
/// the runtime can be cloned cheaply into agent constructors and handed
/// out to callers (e.g. a CLI event loop) without a shared lock around
/// the whole struct.
pub struct Runtime {
    pub bus: Arc<EventBus>,
    pub router: Arc<ProviderRouter>,
    pub memory: Arc<AdaptiveMemory>,
    pub tools: Arc<ToolRegistry>,
    pub snapshots: Arc<SnapshotManager>,
    pub executor: Arc<TransactionalExecutor>,
    pub orchestrator: Arc<Orchestrator>,
    pub monitor: Arc<MonitorAgent>,
    pub ux: Arc<UxStateMachine>,
    pub model: String,
}

impl Runtime {
    /// Builds the full dependency graph from a [`RuntimeConfig`]: provider
    /// router (populated from `[[provider]]` tables using the
    /// OpenAI-compatible [`HttpAdapter`]), bus, memory, tool registry,
    /// snapshot manager, transactional executor, the four specialist
    /// agents plus orchestrator, and the UX state machine -- then
    /// subscribes each agent to the bus events it handles (spec §4.2 "one
    /// handler per event type, registered once").
    pub fn new(config: RuntimeConfig) -> Result<Arc<Self>, SuperAgentError> {
        let bus = Arc::new(EventBus::new());

        let mut router = ProviderRouter::new();
        #[cfg(feature = "reqwest-client")]
        for provider in &config.providers {
            let provider_config = provider.to_provider_config();
            let base_url = provider.base_url.clone().unwrap_or_default();
            let mut adapter = HttpAdapter::new(
                provider.name.clone(),
                base_url,
                Duration::from_secs(provider.timeout_secs),
            );
            if let Some(key) = &provider.api_key {
                adapter = adapter.with_api_key(key.clone());
            }
            router.register(provider_config, Arc::new(adapter));
        }
        let router = Arc::new(router);

        let memory = Arc::new(AdaptiveMemory::new(config.memory.to_memory_config()));
        let tools = Arc::new(ToolRegistry::new());
        let snapshots =
            Arc::new(SnapshotManager::new(config.executor.worktree.clone(), config.executor.snapshots_enabled));
        let executor = Arc::new(TransactionalExecutor::new(tools.clone(), snapshots.clone()));

        let orchestrator = Orchestrator::new(bus.clone(), memory.clone());

        let planner = Arc::new(PlannerAgent::new(router.clone(), bus.clone(), config.model.clone()));
        bus.subscribe(EventType::PlanRequested, planner.clone() as Arc<dyn EventHandler>);

        let executor_agent = Arc::new(
            ExecutorAgent::new(router.clone(), executor.clone(), bus.clone(), config.model.clone())
                .with_max_parallel_steps(config.executor.max_parallel_steps),
        );
        bus.subscribe(EventType::PlanReady, executor_agent.clone() as Arc<dyn EventHandler>);

        let memory_agent = Arc::new(MemoryAgent::new(memory.clone(), bus.clone()));
        bus.subscribe(EventType::StepCompleted, memory_agent.clone() as Arc<dyn EventHandler>);
        bus.subscribe(EventType::ContextRequested, memory_agent.clone() as Arc<dyn EventHandler>);

        let monitor = Arc::new(MonitorAgent::new());
        monitor.subscribe_all(&bus);

        let ux = Arc::new(UxStateMachine::new(
            router.clone(),
            bus.clone(),
            memory.clone(),
            snapshots.clone(),
            config.ux.model.clone(),
        ));

        log::info!(
            "runtime assembled: {} provider(s) registered, model={}",
            config.providers.len(),
            config.model
        );

        Ok(Arc::new(Self {
            bus,
            router,
            memory,
            tools,
            snapshots,
            executor,
            orchestrator,
            monitor,
            ux,
            model: config.model,
        }))
    }

    /// Spawns a task that drains the bus's broadcast stream into `sink` as
    /// headless NDJSON (spec §6), filtering internal orchestration events.
    /// Returns the inner sink once the bus (and every publisher clone) is
    /// dropped.
    pub fn spawn_ndjson_writer<W>(&self, sink: W) -> JoinHandle<Result<W, SuperAgentError>>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let events: broadcast::Receiver<AgentEvent> = self.bus.subscribe_stream();
        tokio::spawn(async move { NdjsonWriter::new(sink).run(events).await.map_err(SuperAgentError::from) })
    }
}
