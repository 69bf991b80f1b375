//! Interactive selection over one search's results.
//!
//! A [`SearchSession`] owns the working view of a single `docs` invocation.
//! Transitions only write to the session after their last provider call has
//! returned, so dropping a transition part-way (idle timeout) leaves the last
//! published view intact.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use skript_docs_client::types::{DocumentationElement, Query, UserId};
use skript_docs_providers::{
    CombinedDocumentationProvider, DocumentationProvider, SharedProvider, MAX_SELECT_OPTION_COUNT,
};
use tokio::{
    sync::mpsc,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    render::{element_option, render_element},
    surface::{
        Button, ButtonStyle, Component, ComponentInteraction, ControlId, Embed,
        InteractionSurface, Message, Participant, SelectMenu, SelectOption,
    },
    text::{escape_markdown, join_english_or},
};

const NO_RESULTS_LABEL: &str = "No results";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initial,
    ElementChosen,
    ProvidersRefined,
    ReplyTargetChosen,
    Confirmed,
    Cancelled,
    TimedOut,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled | Self::TimedOut)
    }
}

/// Everything needed to open a session.
#[derive(Clone)]
pub struct SessionSeed {
    pub query: Query,
    /// Providers the user may pick from when refining.
    pub available: Vec<SharedProvider>,
    /// Providers that produced `results`.
    pub enabled: Vec<SharedProvider>,
    pub results: Vec<DocumentationElement>,
    pub enforce_sources: bool,
    pub supports_replies: bool,
    pub recipients: Vec<Participant>,
    pub reply_target: Option<UserId>,
    pub provider_timeout: Duration,
    pub idle_timeout: Duration,
}

pub struct SearchSession {
    query: Query,
    available: Vec<SharedProvider>,
    combined: CombinedDocumentationProvider,
    results: Vec<DocumentationElement>,
    selected: Option<usize>,
    panel: Option<Embed>,
    notice: Option<String>,
    reply_target: Option<UserId>,
    recipients: Vec<Participant>,
    supports_replies: bool,
    enforce_sources: bool,
    idle_timeout: Duration,
    state: SessionState,
}

impl SearchSession {
    /// Opens a session with the first result selected and its panel rendered.
    pub async fn start(seed: SessionSeed) -> Self {
        let combined =
            CombinedDocumentationProvider::new(seed.enabled).with_timeout(seed.provider_timeout);
        let mut results = seed.results;
        results.truncate(MAX_SELECT_OPTION_COUNT - 1);
        let mut session = Self {
            query: seed.query,
            available: seed.available,
            combined,
            results,
            selected: None,
            panel: None,
            notice: None,
            reply_target: seed.reply_target,
            recipients: seed.recipients,
            supports_replies: seed.supports_replies,
            enforce_sources: seed.enforce_sources,
            idle_timeout: seed.idle_timeout,
            state: SessionState::Initial,
        };

        if session.results.is_empty() {
            session.notice = Some(format!(
                "No results found for {} on {}",
                escape_markdown(session.query.as_str()),
                join_english_or(&session.combined.provider_names())
            ));
        } else {
            session.focus(0).await;
        }
        session
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn results(&self) -> &[DocumentationElement] {
        &self.results
    }

    pub fn selected(&self) -> Option<&DocumentationElement> {
        self.selected.and_then(|index| self.results.get(index))
    }

    pub fn reply_target(&self) -> Option<UserId> {
        self.reply_target
    }

    pub fn enabled_provider_names(&self) -> Vec<&str> {
        self.combined.provider_names()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Current working view. Every control is disabled once the session timed out.
    pub fn message(&self) -> Message {
        let mut components = self.components();
        if self.state == SessionState::TimedOut {
            components.iter_mut().for_each(Component::disable);
        }
        Message {
            content: self.notice.clone(),
            embeds: self.panel.iter().cloned().collect(),
            components,
        }
    }

    /// Applies one user interaction. Sessions in a terminal state ignore everything.
    pub async fn handle(
        &mut self,
        interaction: ComponentInteraction,
        surface: &dyn InteractionSurface,
    ) -> Result<()> {
        if self.state.is_terminal() {
            debug!(
                target: "skript_docs_session",
                state = ?self.state,
                control = %interaction.control,
                "ignoring interaction on closed session"
            );
            return Ok(());
        }

        match interaction.control {
            ControlId::Results => self.choose_element(&interaction.values, surface).await,
            ControlId::Sources => self.refine_sources(&interaction.values, surface).await,
            ControlId::ReplyTarget => {
                self.choose_reply_target(&interaction.values);
                Ok(())
            }
            ControlId::Confirm => self.confirm(&interaction.user, surface).await,
            ControlId::Cancel => self.cancel(surface).await,
        }
    }

    /// Disables every control and leaves the last view in place.
    pub async fn expire(&mut self, surface: &dyn InteractionSurface) -> Result<()> {
        self.state = SessionState::TimedOut;
        info!(target: "skript_docs_session", query = %self.query, "search session timed out");
        surface.edit_original(self.message()).await
    }

    /// Runs the session until it reaches a terminal state or `events` closes.
    ///
    /// The idle deadline restarts on every received interaction and also
    /// bounds the transition that interaction triggers.
    pub async fn drive(
        mut self,
        surface: Arc<dyn InteractionSurface>,
        mut events: mpsc::Receiver<ComponentInteraction>,
    ) -> SessionState {
        let mut deadline = Instant::now() + self.idle_timeout;
        while !self.state.is_terminal() {
            let received = tokio::select! {
                event = events.recv() => event,
                () = sleep_until(deadline) => {
                    self.expire_logged(surface.as_ref()).await;
                    break;
                }
            };
            let Some(interaction) = received else {
                debug!(target: "skript_docs_session", query = %self.query, "session channel closed");
                break;
            };
            deadline = Instant::now() + self.idle_timeout;

            let outcome = if matches!(interaction.control, ControlId::Confirm | ControlId::Cancel) {
                Some(self.handle(interaction, surface.as_ref()).await)
            } else {
                tokio::select! {
                    outcome = self.handle(interaction, surface.as_ref()) => Some(outcome),
                    () = sleep_until(deadline) => None,
                }
            };

            match outcome {
                Some(Ok(())) => {}
                Some(Err(error)) => warn!(
                    target: "skript_docs_session",
                    error = %error,
                    "failed to update interaction"
                ),
                None => self.expire_logged(surface.as_ref()).await,
            }
        }
        self.state
    }

    async fn expire_logged(&mut self, surface: &dyn InteractionSurface) {
        if let Err(error) = self.expire(surface).await {
            warn!(
                target: "skript_docs_session",
                error = %error,
                "failed to disable timed out session"
            );
        }
    }

    async fn choose_element(
        &mut self,
        values: &[String],
        surface: &dyn InteractionSurface,
    ) -> Result<()> {
        let Some(value) = values.first() else {
            return Ok(());
        };
        let Some(index) = self
            .results
            .iter()
            .position(|element| element.global_key() == *value)
        else {
            debug!(target: "skript_docs_session", value = %value, "ignoring unknown result");
            return Ok(());
        };

        self.focus(index).await;
        self.state = SessionState::ElementChosen;
        debug!(target: "skript_docs_session", element = %value, "element chosen");
        surface.edit_original(self.message()).await
    }

    async fn refine_sources(
        &mut self,
        values: &[String],
        surface: &dyn InteractionSurface,
    ) -> Result<()> {
        if self.enforce_sources {
            debug!(target: "skript_docs_session", "sources are enforced, ignoring refine");
            return Ok(());
        }
        let enabled: Vec<SharedProvider> = self
            .available
            .iter()
            .filter(|provider| values.iter().any(|value| value == provider.name()))
            .cloned()
            .collect();
        if enabled.is_empty() {
            debug!(target: "skript_docs_session", "ignoring empty source selection");
            return Ok(());
        }

        let combined = CombinedDocumentationProvider::new(enabled.clone())
            .with_timeout(self.combined.timeout());
        let results = match combined.search(&self.query).await {
            Ok(results) => results,
            Err(error) => {
                warn!(target: "skript_docs_session", error = %error, "refined search failed");
                Vec::new()
            }
        };

        let mut refined = Self::start(SessionSeed {
            query: self.query.clone(),
            available: self.available.clone(),
            enabled,
            results,
            enforce_sources: self.enforce_sources,
            supports_replies: self.supports_replies,
            recipients: self.recipients.clone(),
            reply_target: self.reply_target,
            provider_timeout: self.combined.timeout(),
            idle_timeout: self.idle_timeout,
        })
        .await;
        refined.state = SessionState::ProvidersRefined;
        *self = refined;

        debug!(
            target: "skript_docs_session",
            providers = ?self.combined.provider_names(),
            results = self.results.len(),
            "sources refined"
        );
        surface.edit_original(self.message()).await
    }

    fn choose_reply_target(&mut self, values: &[String]) {
        if !self.offers_reply_target() {
            return;
        }
        self.reply_target = match values.first() {
            None => None,
            Some(raw) => {
                let candidate = raw
                    .parse::<u64>()
                    .ok()
                    .map(UserId)
                    .filter(|id| self.recipients.iter().any(|participant| participant.id == *id));
                let Some(id) = candidate else {
                    debug!(target: "skript_docs_session", value = %raw, "ignoring unknown recipient");
                    return;
                };
                Some(id)
            }
        };
        self.state = SessionState::ReplyTargetChosen;
        debug!(target: "skript_docs_session", reply_target = ?self.reply_target, "reply target chosen");
    }

    async fn confirm(&mut self, user: &Participant, surface: &dyn InteractionSurface) -> Result<()> {
        if self.results.is_empty() {
            return Ok(());
        }

        let content = self.reply_target.map(|target| {
            format!(
                "Hey <@{target}>, {} thought this might help you!",
                user.display_name
            )
        });
        let published = Message {
            content,
            embeds: self.panel.iter().cloned().collect(),
            components: Vec::new(),
        };
        // The session stays open until the panel is actually published.
        surface.send_to_channel(published).await?;
        self.state = SessionState::Confirmed;
        info!(
            target: "skript_docs_session",
            query = %self.query,
            element = ?self.selected().map(DocumentationElement::global_key),
            "search session confirmed"
        );
        surface.delete_original().await
    }

    async fn cancel(&mut self, surface: &dyn InteractionSurface) -> Result<()> {
        self.state = SessionState::Cancelled;
        info!(target: "skript_docs_session", query = %self.query, "search session cancelled");
        surface.delete_original().await
    }

    /// Selects `index`, enriching the element first if it has not been yet.
    async fn focus(&mut self, index: usize) {
        let Some(element) = self.results.get(index) else {
            return;
        };
        let mut element = element.clone();
        self.enrich(&mut element).await;

        let panel = render_element(&element, self.icon_url(&element));
        self.results[index] = element;
        self.selected = Some(index);
        self.panel = Some(panel);
        self.notice = None;
    }

    async fn enrich(&self, element: &mut DocumentationElement) {
        let timeout = self.combined.timeout();
        match tokio::time::timeout(timeout, self.combined.enrich(element)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(
                target: "skript_docs_session",
                provider = %element.provider,
                error = %error,
                "failed to enrich element, showing patterns"
            ),
            Err(_) => warn!(
                target: "skript_docs_session",
                provider = %element.provider,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "enrichment timed out, showing patterns"
            ),
        }
    }

    fn icon_url(&self, element: &DocumentationElement) -> Option<&str> {
        self.available
            .iter()
            .find(|provider| provider.name() == element.provider.as_str())
            .and_then(|provider| provider.icon_url())
    }

    fn offers_reply_target(&self) -> bool {
        self.supports_replies && !self.recipients.is_empty()
    }

    fn components(&self) -> Vec<Component> {
        let empty = self.results.is_empty();
        let mut components = vec![Component::Select(self.results_menu())];
        if self.offers_reply_target() {
            components.push(Component::Select(self.reply_menu()));
        }
        if !self.enforce_sources {
            components.push(Component::Select(self.sources_menu()));
        }
        components.push(Component::Button(Button {
            control: ControlId::Confirm,
            label: "Confirm".to_string(),
            style: ButtonStyle::Success,
            disabled: empty,
        }));
        components.push(Component::Button(Button {
            control: ControlId::Cancel,
            label: "Cancel".to_string(),
            style: ButtonStyle::Danger,
            disabled: false,
        }));
        components
    }

    fn results_menu(&self) -> SelectMenu {
        let options = if self.results.is_empty() {
            vec![SelectOption {
                label: NO_RESULTS_LABEL.to_string(),
                value: NO_RESULTS_LABEL.to_string(),
                emoji: None,
                default: false,
            }]
        } else {
            self.results
                .iter()
                .enumerate()
                .map(|(index, element)| element_option(element, self.selected == Some(index)))
                .collect()
        };
        SelectMenu {
            control: ControlId::Results,
            placeholder: "Results".to_string(),
            min_values: 1,
            max_values: 1,
            options,
            disabled: self.results.is_empty(),
        }
    }

    fn reply_menu(&self) -> SelectMenu {
        SelectMenu {
            control: ControlId::ReplyTarget,
            placeholder: "Who is this for?".to_string(),
            min_values: 0,
            max_values: 1,
            options: self
                .recipients
                .iter()
                .map(|participant| SelectOption {
                    label: participant.display_name.clone(),
                    value: participant.id.to_string(),
                    emoji: None,
                    default: self.reply_target == Some(participant.id),
                })
                .collect(),
            disabled: false,
        }
    }

    fn sources_menu(&self) -> SelectMenu {
        let enabled = self.combined.provider_names();
        SelectMenu {
            control: ControlId::Sources,
            placeholder: "Sources".to_string(),
            min_values: 1,
            max_values: self.available.len(),
            options: self
                .available
                .iter()
                .map(|provider| SelectOption {
                    label: provider.name().to_string(),
                    value: provider.name().to_string(),
                    emoji: None,
                    default: enabled.contains(&provider.name()),
                })
                .collect(),
            disabled: false,
        }
    }
}
