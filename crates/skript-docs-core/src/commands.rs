use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use skript_docs_client::types::{GuildConfig, GuildId, Query};
use skript_docs_providers::{CombinedDocumentationProvider, DocumentationProvider};
use tracing::{debug, info, instrument};

use crate::{
    preferences::SourcesUpdate,
    session::{SearchSession, SessionSeed},
    state::BotContext,
    surface::Participant,
    text::{escape_markdown, join_english_and},
};

/// Slash commands the bot understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Command {
    Docs { query: String },
    GetSources,
    SetSources { sources: String },
    SetSourcesEnforced { enforced: bool },
}

impl Command {
    pub fn requires_administrator(&self) -> bool {
        !matches!(self, Self::Docs { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Docs { .. } => "docs",
            Self::GetSources => "get-sources",
            Self::SetSources { .. } => "set-sources",
            Self::SetSourcesEnforced { .. } => "set-sources-enforced",
        }
    }
}

/// Who ran a command and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub user: Participant,
    /// Whether the invoking member holds the administrator permission.
    #[serde(default)]
    pub administrator: bool,
    /// Whether the channel accepts messages addressed to another member.
    #[serde(default)]
    pub supports_replies: bool,
    /// Recent speakers in the channel, offered as reply targets.
    #[serde(default)]
    pub recent_participants: Vec<Participant>,
}

/// What the gateway sends back for a command.
pub enum CommandReply {
    /// A plain ephemeral reply.
    Text(String),
    /// An interactive session whose first view is the reply.
    Session(Box<SearchSession>),
}

impl CommandReply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Session(_) => None,
        }
    }
}

#[instrument(name = "commands.execute", skip_all, fields(command = command.name()))]
pub async fn execute(
    context: &BotContext,
    invocation: &Invocation,
    command: Command,
) -> Result<CommandReply> {
    if command.requires_administrator() && !invocation.administrator {
        debug!(target: "skript_docs_commands", user = %invocation.user.id, "administrator check failed");
        return Ok(CommandReply::Text(
            "You need the Administrator permission to use this command".to_string(),
        ));
    }

    let preferences = &context.preferences;
    let reply = match (command, invocation.guild_id) {
        (Command::Docs { query }, _) => return docs(context, invocation, Query::new(query)).await,
        (_, None) => "This command can only be used in a server".to_string(),
        (Command::GetSources, Some(guild)) => {
            match preferences.config(guild).await?.preferred_providers {
                Some(sources) => format!("Sources are set to {}", join_english_and(&sources)),
                None => "No sources are set".to_string(),
            }
        }
        (Command::SetSources { sources }, Some(guild)) => {
            match preferences.set_sources(guild, &sources).await? {
                SourcesUpdate::Reset => "Sources reset to default".to_string(),
                SourcesUpdate::Updated(_) => "Sources set successfully".to_string(),
                SourcesUpdate::UnknownSource(key) => {
                    format!("No such source {}", escape_markdown(&key))
                }
            }
        }
        (Command::SetSourcesEnforced { enforced }, Some(guild)) => {
            preferences.set_enforced(guild, enforced).await?;
            if enforced {
                "Sources are now enforced".to_string()
            } else {
                "Sources are now not enforced".to_string()
            }
        }
    };
    info!(target: "skript_docs_commands", reply = %reply, "administrative command handled");
    Ok(CommandReply::Text(reply))
}

async fn docs(context: &BotContext, invocation: &Invocation, query: Query) -> Result<CommandReply> {
    let config = match invocation.guild_id {
        Some(guild) => context
            .preferences
            .config(guild)
            .await
            .context("failed to load guild config")?,
        None => GuildConfig::default(),
    };
    let providers = context.preferences.active_providers(&config);

    let combined = CombinedDocumentationProvider::new(providers.clone())
        .with_timeout(context.timeouts.provider);
    let results = combined.search(&query).await?;
    info!(
        target: "skript_docs_commands",
        query = %query,
        results = results.len(),
        providers = ?combined.provider_names(),
        "docs search completed"
    );

    if results.is_empty() {
        return Ok(CommandReply::Text(format!(
            "No results found for {}",
            escape_markdown(query.as_str())
        )));
    }

    let session = SearchSession::start(SessionSeed {
        query,
        available: providers.clone(),
        enabled: providers,
        results,
        enforce_sources: config.enforces_preferred_providers(),
        supports_replies: invocation.supports_replies,
        recipients: invocation
            .recent_participants
            .iter()
            .filter(|participant| participant.id != invocation.user.id)
            .cloned()
            .collect(),
        reply_target: None,
        provider_timeout: context.timeouts.provider,
        idle_timeout: context.timeouts.interaction,
    })
    .await;
    Ok(CommandReply::Session(Box::new(session)))
}
