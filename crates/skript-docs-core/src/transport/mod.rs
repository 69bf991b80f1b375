pub mod frames;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use frames::{GatewayError, InboundFrame, OutboundFrame};

use crate::{
    commands::{self, Command, CommandReply, Invocation},
    state::BotContext,
    surface::{InteractionSurface, Message},
};

const OUTBOUND_QUEUE_DEPTH: usize = 64;
const COMMAND_FAILED: &str = "Something went wrong while handling this command";

/// Serves the JSON-lines gateway on stdin/stdout until stdin closes or `shutdown` fires.
pub async fn serve_stdio(context: Arc<BotContext>, shutdown: CancellationToken) -> Result<()> {
    serve(context, BufReader::new(io::stdin()), io::stdout(), shutdown).await
}

pub async fn serve<R, W>(
    context: Arc<BotContext>,
    reader: R,
    writer: W,
    shutdown: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, inbox) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
    let writer_task = tokio::spawn(write_frames(writer, inbox));

    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => {
                info!(target: "skript_docs_transport", "shutdown requested");
                break;
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            info!(target: "skript_docs_transport", "STDIO closed; shutting down");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        debug!(target: "skript_docs_transport", frame = line.trim());
        match InboundFrame::parse(&line) {
            Ok(frame) => route(&context, frame, &outbound, &shutdown),
            Err(error) => {
                warn!(target: "skript_docs_transport", error = %error, "Failed to parse frame");
            }
        }
    }

    shutdown.cancel();
    context.sessions.close_all();
    drop(outbound);
    writer_task.await??;
    Ok(())
}

fn route(
    context: &Arc<BotContext>,
    frame: InboundFrame,
    outbound: &mpsc::Sender<OutboundFrame>,
    shutdown: &CancellationToken,
) {
    match frame {
        InboundFrame::Command {
            interaction_id,
            invocation,
            command,
        } => {
            let context = Arc::clone(context);
            let surface = Arc::new(GatewaySurface::new(interaction_id.clone(), outbound.clone()));
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                run_command(&context, interaction_id, &invocation, command, surface, &shutdown)
                    .await;
            });
        }
        InboundFrame::Component {
            interaction_id,
            interaction,
        } => {
            if !context.sessions.dispatch(&interaction_id, interaction) {
                debug!(
                    target: "skript_docs_transport",
                    interaction = %interaction_id,
                    "ignoring component for unknown, closed or busy session"
                );
            }
        }
    }
}

async fn run_command(
    context: &BotContext,
    interaction_id: String,
    invocation: &Invocation,
    command: Command,
    surface: Arc<GatewaySurface>,
    shutdown: &CancellationToken,
) {
    let message = match commands::execute(context, invocation, command).await {
        Ok(CommandReply::Text(text)) => Message::text(text),
        Ok(CommandReply::Session(session)) => {
            let message = session.message();
            if shutdown.is_cancelled() {
                debug!(target: "skript_docs_transport", "not opening session during shutdown");
            } else {
                context
                    .sessions
                    .launch(interaction_id, *session, surface.clone());
            }
            message
        }
        Err(error) => {
            warn!(target: "skript_docs_transport", error = %error, "command failed");
            Message::text(COMMAND_FAILED)
        }
    };

    if let Err(error) = surface.respond(message).await {
        warn!(target: "skript_docs_transport", error = %error, "failed to send command reply");
    }
}

async fn write_frames<W>(mut writer: W, mut inbox: mpsc::Receiver<OutboundFrame>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = inbox.recv().await {
        let payload = serde_json::to_string(&frame)?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Surface that turns session output into outbound gateway frames.
#[derive(Debug, Clone)]
pub struct GatewaySurface {
    interaction_id: String,
    outbound: mpsc::Sender<OutboundFrame>,
}

impl GatewaySurface {
    pub fn new(interaction_id: impl Into<String>, outbound: mpsc::Sender<OutboundFrame>) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            outbound,
        }
    }

    async fn emit(&self, frame: OutboundFrame) -> Result<(), GatewayError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| GatewayError::Closed)
    }
}

#[async_trait]
impl InteractionSurface for GatewaySurface {
    async fn respond(&self, message: Message) -> Result<()> {
        self.emit(OutboundFrame::Respond {
            interaction_id: self.interaction_id.clone(),
            message,
        })
        .await?;
        Ok(())
    }

    async fn edit_original(&self, message: Message) -> Result<()> {
        self.emit(OutboundFrame::EditOriginal {
            interaction_id: self.interaction_id.clone(),
            message,
        })
        .await?;
        Ok(())
    }

    async fn delete_original(&self) -> Result<()> {
        self.emit(OutboundFrame::DeleteOriginal {
            interaction_id: self.interaction_id.clone(),
        })
        .await?;
        Ok(())
    }

    async fn send_to_channel(&self, message: Message) -> Result<()> {
        self.emit(OutboundFrame::SendChannel {
            interaction_id: self.interaction_id.clone(),
            message,
        })
        .await?;
        Ok(())
    }
}
