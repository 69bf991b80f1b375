mod support;

use std::sync::Arc;

use serde_json::json;
use skript_docs_core::{
    surface::ControlId,
    transport::{serve, OutboundFrame},
};
use support::{context, StubProvider};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

async fn next_frame<R: io::AsyncBufRead + Unpin>(lines: &mut io::Lines<R>) -> OutboundFrame {
    let line = lines.next_line().await.unwrap().expect("frame");
    serde_json::from_str(&line).unwrap()
}

fn docs_frame(interaction_id: &str, query: &str) -> String {
    let frame = json!({
        "type": "command",
        "interaction_id": interaction_id,
        "invocation": {
            "guild_id": 7,
            "user": {"id": 1, "display_name": "Alice"}
        },
        "command": {"name": "docs", "query": query}
    });
    format!("{frame}\n")
}

#[tokio::test]
async fn docs_command_opens_a_session_that_can_be_cancelled() {
    let ctx = Arc::new(context(&[(
        "skripthub",
        StubProvider::returning("Skript Hub", &["Give"]),
    )]));
    let (client, server) = io::duplex(64 * 1024);
    let (server_read, server_write) = io::split(server);
    let (client_read, mut client_write) = io::split(client);
    let shutdown = CancellationToken::new();
    let gateway = tokio::spawn(serve(
        ctx.clone(),
        BufReader::new(server_read),
        server_write,
        shutdown.clone(),
    ));
    let mut lines = BufReader::new(client_read).lines();

    client_write.write_all(b"not a frame\n").await.unwrap();
    client_write
        .write_all(docs_frame("i-1", "give").as_bytes())
        .await
        .unwrap();

    let OutboundFrame::Respond {
        interaction_id,
        message,
    } = next_frame(&mut lines).await
    else {
        panic!("expected a response frame");
    };
    assert_eq!(interaction_id, "i-1");
    assert_eq!(message.embeds[0].title, "Give");
    assert!(message.component(ControlId::Confirm).is_some());
    assert!(ctx.sessions.contains("i-1"));

    let cancel = json!({
        "type": "component",
        "interaction_id": "i-1",
        "interaction": {
            "control": "cancel",
            "user": {"id": 1, "display_name": "Alice"}
        }
    });
    client_write
        .write_all(format!("{cancel}\n").as_bytes())
        .await
        .unwrap();

    assert_eq!(
        next_frame(&mut lines).await,
        OutboundFrame::DeleteOriginal {
            interaction_id: "i-1".to_string()
        }
    );

    drop(client_write);
    gateway.await.unwrap().unwrap();
    assert!(shutdown.is_cancelled());
    assert!(lines.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn empty_search_replies_with_plain_text() {
    let ctx = Arc::new(context(&[(
        "skripthub",
        StubProvider::returning("Skript Hub", &[]),
    )]));
    let (client, server) = io::duplex(64 * 1024);
    let (server_read, server_write) = io::split(server);
    let (client_read, mut client_write) = io::split(client);
    let gateway = tokio::spawn(serve(
        ctx.clone(),
        BufReader::new(server_read),
        server_write,
        CancellationToken::new(),
    ));
    let mut lines = BufReader::new(client_read).lines();

    client_write
        .write_all(docs_frame("i-2", "nothing").as_bytes())
        .await
        .unwrap();

    let OutboundFrame::Respond { message, .. } = next_frame(&mut lines).await else {
        panic!("expected a response frame");
    };
    assert_eq!(message.content.as_deref(), Some("No results found for nothing"));
    assert!(message.components.is_empty());
    assert!(ctx.sessions.is_empty());

    drop(client_write);
    gateway.await.unwrap().unwrap();
}

#[tokio::test]
async fn cancellation_stops_the_gateway() {
    let ctx = Arc::new(context(&[]));
    let (_client, server) = io::duplex(1024);
    let (server_read, server_write) = io::split(server);
    let shutdown = CancellationToken::new();
    let gateway = tokio::spawn(serve(
        ctx,
        BufReader::new(server_read),
        server_write,
        shutdown.clone(),
    ));

    shutdown.cancel();

    gateway.await.unwrap().unwrap();
}
