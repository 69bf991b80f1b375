#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use skript_docs_client::{
    types::{DocumentationElement, ProviderId, Query, SyntaxType, UserId},
    ContractViolation, ProviderError,
};
use skript_docs_core::{
    session::{SearchSession, SessionSeed},
    surface::{ComponentInteraction, ControlId, InteractionSurface, Message, Participant},
};
use skript_docs_providers::{DocumentationProvider, SharedProvider};

pub fn element(provider: &str, id: &str, name: &str) -> DocumentationElement {
    DocumentationElement {
        id: id.to_string(),
        provider: ProviderId::new(provider),
        name: name.to_string(),
        description: format!("Gives an item to {name}"),
        patterns: vec![format!("{} %itemtypes% to %players%", name.to_lowercase())],
        examples: None,
        required_addon: Some("Skript".to_string()),
        required_addon_version: None,
        required_minecraft_version: None,
        syntax_type: SyntaxType::Effect,
        required_plugins: None,
        return_type: None,
        event_values: None,
        cancellable: None,
        link: None,
    }
}

pub struct StubProvider {
    name: String,
    names: Vec<String>,
    delay: Duration,
    pub searches: AtomicUsize,
    pub enrichments: AtomicUsize,
}

impl StubProvider {
    pub fn returning(name: &str, names: &[&str]) -> Arc<Self> {
        Arc::new(Self::build(name, names, Duration::ZERO))
    }

    /// Provider whose enrichment takes `delay`.
    pub fn slow(name: &str, names: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(name, names, delay))
    }

    fn build(name: &str, names: &[&str], delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            names: names.iter().map(ToString::to_string).collect(),
            delay,
            searches: AtomicUsize::new(0),
            enrichments: AtomicUsize::new(0),
        }
    }

    pub fn elements(&self) -> Vec<DocumentationElement> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, item)| element(&self.name, &index.to_string(), item))
            .collect()
    }
}

#[async_trait]
impl DocumentationProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn icon_url(&self) -> Option<&str> {
        Some("https://example.invalid/icon.png")
    }

    async fn search(&self, _query: &Query) -> Result<Vec<DocumentationElement>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self.elements())
    }

    async fn enrich(&self, element: &mut DocumentationElement) -> Result<(), ProviderError> {
        ContractViolation::check(&self.name, &element.provider, &element.id)?;
        if element.examples.is_none() {
            self.enrichments.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            element.examples = Some(vec![format!("{} diamond to player", element.name.to_lowercase())]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Respond(Message),
    Edit(Message),
    Delete,
    Send(Message),
}

/// Surface that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<Recorded>>,
    reject_channel_sends: AtomicBool,
}

impl RecordingSurface {
    /// Fails every `send_to_channel` until `accept_channel_sends` is called.
    pub fn rejecting_channel_sends() -> Self {
        let surface = Self::default();
        surface.reject_channel_sends.store(true, Ordering::SeqCst);
        surface
    }

    pub fn accept_channel_sends(&self) {
        self.reject_channel_sends.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_edit(&self) -> Option<Message> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Recorded::Edit(message) => Some(message),
            _ => None,
        })
    }

    pub fn sent(&self) -> Vec<Message> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Recorded::Send(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> bool {
        self.calls().contains(&Recorded::Delete)
    }

    fn record(&self, call: Recorded) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InteractionSurface for RecordingSurface {
    async fn respond(&self, message: Message) -> Result<()> {
        self.record(Recorded::Respond(message));
        Ok(())
    }

    async fn edit_original(&self, message: Message) -> Result<()> {
        self.record(Recorded::Edit(message));
        Ok(())
    }

    async fn delete_original(&self) -> Result<()> {
        self.record(Recorded::Delete);
        Ok(())
    }

    async fn send_to_channel(&self, message: Message) -> Result<()> {
        if self.reject_channel_sends.load(Ordering::SeqCst) {
            anyhow::bail!("missing permission to post in channel");
        }
        self.record(Recorded::Send(message));
        Ok(())
    }
}

pub fn participant(id: u64, name: &str) -> Participant {
    Participant {
        id: UserId(id),
        display_name: name.to_string(),
    }
}

pub fn click(control: ControlId, values: &[&str]) -> ComponentInteraction {
    ComponentInteraction {
        control,
        values: values.iter().map(ToString::to_string).collect(),
        user: participant(1, "Alice"),
    }
}

/// Seed over `providers` with their combined results in provider order.
pub fn seed(providers: &[Arc<StubProvider>]) -> SessionSeed {
    let shared: Vec<SharedProvider> = providers
        .iter()
        .map(|provider| Arc::clone(provider) as SharedProvider)
        .collect();
    SessionSeed {
        query: Query::new("give"),
        available: shared.clone(),
        enabled: shared,
        results: providers.iter().flat_map(|provider| provider.elements()).collect(),
        enforce_sources: false,
        supports_replies: true,
        recipients: vec![participant(2, "Bob")],
        reply_target: None,
        provider_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(300),
    }
}

pub async fn open(providers: &[Arc<StubProvider>]) -> SearchSession {
    SearchSession::start(seed(providers)).await
}

/// Context over an in-memory store with `providers` registered under their keys.
pub fn context(providers: &[(&str, Arc<StubProvider>)]) -> skript_docs_core::state::BotContext {
    use skript_docs_core::{
        preferences::{GuildPreferences, MemoryConfigStore},
        state::{BotContext, Timeouts},
    };
    use skript_docs_providers::ProviderRegistry;

    let mut registry = ProviderRegistry::new();
    for (key, provider) in providers {
        registry
            .register(*key, Arc::clone(provider) as SharedProvider)
            .unwrap();
    }
    let preferences = GuildPreferences::new(Arc::new(MemoryConfigStore::new()), registry);
    BotContext::new(preferences, Timeouts::default())
}
