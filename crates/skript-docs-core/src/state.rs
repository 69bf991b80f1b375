use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use skript_docs_client::DEFAULT_PROVIDER_TIMEOUT;
use skript_docs_providers::ProviderRegistry;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    preferences::GuildPreferences,
    session::{SearchSession, SessionState},
    surface::{ComponentInteraction, InteractionSurface},
};

/// Idle time after which a search session disables its controls.
pub const DEFAULT_INTERACTION_TIMEOUT: Duration = Duration::from_secs(300);

const SESSION_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bounds each provider call.
    pub provider: Duration,
    /// Session idle timeout.
    pub interaction: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER_TIMEOUT,
            interaction: DEFAULT_INTERACTION_TIMEOUT,
        }
    }
}

/// Process-wide state shared by every command and session.
#[derive(Clone)]
pub struct BotContext {
    pub registry: ProviderRegistry,
    pub preferences: GuildPreferences,
    pub timeouts: Timeouts,
    pub sessions: Arc<SessionRegistry>,
}

impl BotContext {
    pub fn new(preferences: GuildPreferences, timeouts: Timeouts) -> Self {
        Self {
            registry: preferences.registry().clone(),
            preferences,
            timeouts,
            sessions: Arc::new(SessionRegistry::default()),
        }
    }
}

/// Live sessions keyed by the id of the interaction that opened them.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    senders: DashMap<String, mpsc::Sender<ComponentInteraction>>,
}

impl SessionRegistry {
    /// Registers `session` and drives it on its own task until it closes.
    pub fn launch(
        self: &Arc<Self>,
        interaction_id: impl Into<String>,
        session: SearchSession,
        surface: Arc<dyn InteractionSurface>,
    ) -> JoinHandle<SessionState> {
        let interaction_id = interaction_id.into();
        let (sender, receiver) = mpsc::channel(SESSION_QUEUE_DEPTH);
        self.senders.insert(interaction_id.clone(), sender);

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let state = session.drive(surface, receiver).await;
            registry.senders.remove(&interaction_id);
            debug!(
                target: "skript_docs_session",
                interaction = %interaction_id,
                state = ?state,
                "session released"
            );
            state
        })
    }

    /// Forwards `interaction` to its session without waiting.
    ///
    /// Returns `false` when no live session owns it or its inbox is full; the
    /// interaction is dropped in both cases.
    pub fn dispatch(&self, interaction_id: &str, interaction: ComponentInteraction) -> bool {
        let Some(sender) = self
            .senders
            .get(interaction_id)
            .map(|entry| entry.value().clone())
        else {
            return false;
        };
        match sender.try_send(interaction) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    target: "skript_docs_session",
                    interaction = %interaction_id,
                    control = %dropped.control,
                    "session inbox full, dropping interaction"
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn contains(&self, interaction_id: &str) -> bool {
        self.senders.contains_key(interaction_id)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Drops every session's inbox so their drivers stop after the current transition.
    pub fn close_all(&self) {
        self.senders.clear();
    }
}
