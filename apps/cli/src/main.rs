use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use indicatif::ProgressBar;
use output::{OutputFormat, Renderer};
use progress::spinner;
use serde::Serialize;
use skript_docs_bot::{prepare, serve_until_interrupted, Settings};
use skript_docs_client::types::{GuildConfig, GuildId, Query, UserId};
use skript_docs_core::{
    commands::{self, Command as BotCommand, CommandReply, Invocation},
    session::{SearchSession, SessionSeed},
    state::BotContext,
    surface::{Embed, Participant},
};
use skript_docs_providers::{CombinedDocumentationProvider, DocumentationProvider};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "skript-docs",
    version,
    about = "Search Skript documentation and manage the documentation bot from the shell."
)]
struct Cli {
    /// Settings file (TOML, JSON or YAML). `SKRIPT_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "markdown")]
    format: OutputFormat,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running tasks.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Run the bot gateway over STDIO (JSON lines).
    Serve,
    /// Search every active source and show the best match.
    Search {
        query: String,
        /// Source keys to search instead of the guild preference (comma separated).
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
        /// Apply this guild's stored source preference.
        #[arg(long)]
        guild: Option<u64>,
    },
    /// List registered documentation sources.
    Providers,
    /// Read or change a guild's source preferences.
    Sources {
        #[command(subcommand)]
        command: SourcesCommand,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand, Clone)]
enum SourcesCommand {
    /// Show the preferred sources of a guild.
    Get {
        #[arg(long)]
        guild: u64,
    },
    /// Set preferred sources (comma separated keys) or `default`.
    Set {
        #[arg(long)]
        guild: u64,
        sources: String,
    },
    /// Toggle whether members may change sources per search.
    Enforce {
        #[arg(long)]
        guild: u64,
        #[arg(action = clap::ArgAction::Set)]
        enforced: bool,
    },
}

#[derive(Clone, Debug, Serialize)]
struct ProviderRow {
    key: String,
    name: String,
}

#[derive(Clone, Debug, Serialize)]
struct ResultRow {
    key: String,
    name: String,
    kind: &'static str,
    provider: String,
}

#[derive(Clone, Debug, Serialize)]
struct SearchReport {
    query: String,
    sources: Vec<String>,
    results: Vec<ResultRow>,
    detail: Option<Embed>,
    notice: Option<String>,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    if let Command::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "skript-docs", &mut std::io::stdout());
        return Ok(());
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.headless = !matches!(cli.command, Command::Serve);
    let runtime = prepare(settings).await?;
    let context = runtime.context();
    let renderer = Renderer::new(cli.format);

    match &cli.command {
        Command::Serve => serve_until_interrupted(&runtime).await,
        Command::Completions { .. } => Ok(()),
        Command::Search {
            query,
            sources,
            guild,
        } => handle_search(&cli, &renderer, &context, query, sources, *guild).await,
        Command::Providers => {
            if cli.quiet {
                return Ok(());
            }
            let rows: Vec<ProviderRow> = context
                .registry
                .keys()
                .filter_map(|key| {
                    context.registry.get(key).map(|provider| ProviderRow {
                        key: key.to_string(),
                        name: provider.name().to_string(),
                    })
                })
                .collect();
            renderer.providers(&rows)
        }
        Command::Sources { command } => {
            handle_sources_command(command.clone(), &cli, &renderer, &context).await
        }
    }
}

async fn handle_search(
    cli: &Cli,
    renderer: &Renderer,
    context: &Arc<BotContext>,
    query: &str,
    sources: &[String],
    guild: Option<u64>,
) -> Result<()> {
    let config = match guild {
        Some(id) => context.preferences.config(GuildId(id)).await?,
        None => GuildConfig::default(),
    };
    let providers = if sources.is_empty() {
        context.preferences.active_providers(&config)
    } else {
        let selected = context.registry.select(sources);
        if selected.is_empty() {
            bail!("none of the sources {sources:?} are registered");
        }
        selected
    };
    if providers.is_empty() {
        bail!("no documentation sources are configured");
    }

    let query = Query::new(query);
    let combined = CombinedDocumentationProvider::new(providers.clone())
        .with_timeout(context.timeouts.provider);
    let spinner = spinner(cli.progress_enabled(), format!("Searching for `{query}`..."));
    let results = match combined.search(&query).await {
        Ok(results) => results,
        Err(error) => {
            finish_spinner(spinner, None);
            return Err(anyhow!(error).context("search failed"));
        }
    };
    finish_spinner(spinner, Some(format!("Found {} results", results.len())));

    let session = SearchSession::start(SessionSeed {
        query: query.clone(),
        available: providers.clone(),
        enabled: providers,
        results,
        enforce_sources: config.enforces_preferred_providers(),
        supports_replies: false,
        recipients: Vec::new(),
        reply_target: None,
        provider_timeout: context.timeouts.provider,
        idle_timeout: context.timeouts.interaction,
    })
    .await;
    info!(
        target: "skript_docs_cli",
        query = %query,
        results = session.results().len(),
        "search completed"
    );

    if cli.quiet {
        return Ok(());
    }
    let message = session.message();
    let report = SearchReport {
        query: query.to_string(),
        sources: session
            .enabled_provider_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        results: session
            .results()
            .iter()
            .map(|element| ResultRow {
                key: element.global_key(),
                name: element.detailed_name(),
                kind: element.syntax_type.label(),
                provider: element.provider.to_string(),
            })
            .collect(),
        detail: message.embeds.into_iter().next(),
        notice: message.content,
    };
    renderer.search(&report)
}

async fn handle_sources_command(
    command: SourcesCommand,
    cli: &Cli,
    renderer: &Renderer,
    context: &BotContext,
) -> Result<()> {
    let (guild, command) = match command {
        SourcesCommand::Get { guild } => (guild, BotCommand::GetSources),
        SourcesCommand::Set { guild, sources } => (guild, BotCommand::SetSources { sources }),
        SourcesCommand::Enforce { guild, enforced } => {
            (guild, BotCommand::SetSourcesEnforced { enforced })
        }
    };
    let invocation = Invocation {
        guild_id: Some(GuildId(guild)),
        user: Participant {
            id: UserId(0),
            display_name: "skript-docs".to_string(),
        },
        administrator: true,
        supports_replies: false,
        recent_participants: Vec::new(),
    };

    let reply = match commands::execute(context, &invocation, command).await? {
        CommandReply::Text(text) => text,
        CommandReply::Session(_) => bail!("unexpected interactive reply"),
    };
    if cli.quiet {
        return Ok(());
    }
    renderer.reply(&reply)
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,skript_docs_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    if let Some(progress) = spinner {
        if let Some(msg) = message {
            progress.finish_with_message(msg);
        } else {
            progress.finish_and_clear();
        }
    }
}

mod output {
    use std::fmt::Write;

    use anyhow::Result;
    use clap::ValueEnum;
    use serde_json::{self, json};
    use skript_docs_core::surface::Embed;

    use crate::{ProviderRow, SearchReport};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Json,
        Markdown,
        Table,
    }

    #[derive(Copy, Clone, Debug)]
    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn reply(&self, text: &str) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "reply": text }))?);
                }
                OutputFormat::Markdown | OutputFormat::Table => println!("{text}"),
            }
            Ok(())
        }

        pub fn providers(&self, rows: &[ProviderRow]) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "sources": rows }))?);
                }
                OutputFormat::Markdown => {
                    println!("| Key | Source |");
                    println!("| --- | --- |");
                    for row in rows {
                        println!("| `{}` | {} |", row.key, row.name);
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = rows
                        .iter()
                        .map(|row| vec![row.key.clone(), row.name.clone()])
                        .collect();
                    render_table(&["Key", "Source"], &rows);
                }
            }
            Ok(())
        }

        pub fn search(&self, report: &SearchReport) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(report)?);
                }
                OutputFormat::Markdown => {
                    if let Some(notice) = &report.notice {
                        println!("{notice}");
                        return Ok(());
                    }
                    println!("| # | Result | Type | Source |");
                    println!("| ---: | --- | --- | --- |");
                    for (index, row) in report.results.iter().enumerate() {
                        println!(
                            "| {} | {} | {} | {} |",
                            index + 1,
                            row.name,
                            row.kind,
                            row.provider
                        );
                    }
                    if let Some(detail) = &report.detail {
                        println!();
                        print!("{}", embed_markdown(detail));
                    }
                }
                OutputFormat::Table => {
                    if let Some(notice) = &report.notice {
                        println!("{notice}");
                        return Ok(());
                    }
                    let rows: Vec<Vec<String>> = report
                        .results
                        .iter()
                        .map(|row| {
                            vec![
                                truncate(&row.name, 60),
                                row.kind.to_string(),
                                row.provider.clone(),
                            ]
                        })
                        .collect();
                    render_table(&["Result", "Type", "Source"], &rows);
                }
            }
            Ok(())
        }
    }

    fn embed_markdown(embed: &Embed) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "## {}", embed.title);
        if let Some(url) = &embed.url {
            let _ = writeln!(out, "<{url}>");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", embed.description);
        for field in &embed.fields {
            let _ = writeln!(out);
            let _ = writeln!(out, "**{}**", field.name);
            let _ = writeln!(out, "{}", field.value);
        }
        if let Some(footer) = &embed.footer {
            let _ = writeln!(out);
            let _ = writeln!(out, "_{}_", footer.text);
        }
        out
    }

    fn render_table(headers: &[&str], rows: &[Vec<String>]) {
        if rows.is_empty() {
            println!("(no entries)");
            return;
        }

        let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        fn render_line(columns: &[&str], widths: &[usize]) -> String {
            let mut line = String::new();
            for (idx, value) in columns.iter().enumerate() {
                let width = widths[idx];
                let _ = write!(line, "| {value:width$} ");
            }
            line.push('|');
            line
        }

        println!("{}", render_line(headers, &widths));
        let separator: String = widths
            .iter()
            .map(|width| format!("|{:-^1$}", "", width + 2))
            .collect();
        println!("{separator}|");

        for row in rows {
            let cols: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", render_line(&cols, &widths));
        }
    }

    fn truncate(value: &str, max: usize) -> String {
        if value.chars().count() <= max {
            value.to_string()
        } else {
            let mut truncated = value
                .chars()
                .take(max.saturating_sub(1))
                .collect::<String>();
            truncated.push('…');
            truncated
        }
    }

    #[cfg(test)]
    mod tests {
        use skript_docs_core::surface::{EmbedField, EmbedFooter};

        use super::*;

        #[test]
        fn embed_renders_as_markdown_section() {
            let embed = Embed {
                title: "Give".to_string(),
                description: "Gives an item.".to_string(),
                colour: 0x3498DB,
                url: None,
                fields: vec![EmbedField {
                    name: "Pattern".to_string(),
                    value: "```vb\ngive %itemtypes% to %players%\n```".to_string(),
                    inline: false,
                }],
                footer: Some(EmbedFooter {
                    text: "Documentation provided by Skript Hub".to_string(),
                    icon_url: None,
                }),
            };

            let rendered = embed_markdown(&embed);

            assert!(rendered.starts_with("## Give\n\nGives an item.\n"));
            assert!(rendered.contains("**Pattern**\n```vb\n"));
            assert!(rendered.ends_with("_Documentation provided by Skript Hub_\n"));
        }

        #[test]
        fn truncation_counts_characters() {
            assert_eq!(truncate("héllo", 10), "héllo");
            assert_eq!(truncate("héllo world", 5), "héll…");
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}
