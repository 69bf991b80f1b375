#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use skript_docs_client::{
    types::{DocumentationElement, ProviderId, Query, SyntaxType},
    ContractViolation, ProviderError,
};
use skript_docs_providers::DocumentationProvider;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub fn element(provider: &str, id: &str, addon: &str, name: &str) -> DocumentationElement {
    DocumentationElement {
        id: id.to_string(),
        provider: ProviderId::new(provider),
        name: name.to_string(),
        description: format!("{name} description"),
        patterns: vec![name.to_lowercase()],
        examples: None,
        required_addon: Some(addon.to_string()),
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

/// In-memory provider with scripted results, optional latency and call counters.
pub struct StubProvider {
    name: String,
    results: Option<Vec<DocumentationElement>>,
    delay: Duration,
    pub searches: AtomicUsize,
    pub enrichments: AtomicUsize,
}

impl StubProvider {
    pub fn returning(name: &str, names: &[&str]) -> Self {
        let results = names
            .iter()
            .enumerate()
            .map(|(index, item)| element(name, &index.to_string(), "Skript", item))
            .collect();
        Self {
            name: name.to_string(),
            results: Some(results),
            delay: Duration::ZERO,
            searches: AtomicUsize::new(0),
            enrichments: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            results: None,
            ..Self::returning(name, &[])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
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
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.results
            .clone()
            .ok_or_else(|| ProviderError::unknown_category(&self.name, "broken"))
    }

    async fn enrich(&self, element: &mut DocumentationElement) -> Result<(), ProviderError> {
        ContractViolation::check(&self.name, &element.provider, &element.id)?;
        if element.examples.is_none() {
            self.enrichments.fetch_add(1, Ordering::SeqCst);
            element.examples = Some(vec![format!("{} example", element.name)]);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn ok(path: &'static str, body: serde_json::Value) -> Self {
        Self {
            path,
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(path: &'static str, status: u16) -> Self {
        Self {
            path,
            status,
            body: String::from("{}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub target: String,
    pub raw: String,
}

/// Minimal HTTP/1.1 responder bound to a random local port.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
        let address = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move { respond(socket, &routes, &recorded).await });
            }
        });

        Self {
            base_url: format!("http://{address}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.target.split('?').next() == Some(path))
            .count()
    }
}

async fn respond(mut socket: TcpStream, routes: &[Route], recorded: &Mutex<Vec<RecordedRequest>>) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }

    let raw = String::from_utf8_lossy(&buffer).to_string();
    let target = raw.split_whitespace().nth(1).unwrap_or("/").to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();
    recorded
        .lock()
        .expect("requests lock")
        .push(RecordedRequest { target, raw });

    let (status, body) = routes
        .iter()
        .find(|route| route.path == path)
        .map_or((404, String::from("{}")), |route| (route.status, route.body.clone()));
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
