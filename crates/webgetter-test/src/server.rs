//! Loopback HTTP fixture server.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// Status code.
    pub status: u16,
    /// `Content-Type` header.
    pub content_type: String,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl Fixture {
    /// A `200` response.
    #[must_use]
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_owned(),
            body: body.into(),
        }
    }

    /// Override the status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// A request received by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Method name.
    pub method: String,
    /// Path without the query.
    pub path: String,
    /// Raw query string.
    pub query: Option<String>,
    /// Headers, names lowercased.
    pub headers: Vec<(String, String)>,
    /// Body, lossily decoded.
    pub body: String,
}

impl RecordedRequest {
    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct ServerState {
    fixtures: Mutex<HashMap<String, Fixture>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// HTTP server on `127.0.0.1` serving fixtures by path. Unknown paths get
/// a `404`. Stops when dropped.
#[derive(Debug)]
pub struct FixtureServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl FixtureServer {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());
        let router = Router::new()
            .fallback(serve)
            .with_state(Arc::clone(&state));

        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                tracing::warn!(?err, "fixture server stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    /// Serve `fixture` at `path`.
    #[must_use]
    pub fn with_fixture(self, path: &str, fixture: Fixture) -> Self {
        self.set_fixture(path, fixture);
        self
    }

    /// Serve `fixture` at `path`, replacing any previous one.
    pub fn set_fixture(&self, path: &str, fixture: Fixture) {
        if let Ok(mut guard) = self.state.fixtures.lock() {
            guard.insert(path.to_owned(), fixture);
        }
    }

    /// Absolute URL of `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get received requests.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(recorded);
    }

    let fixture = state
        .fixtures
        .lock()
        .ok()
        .and_then(|g| g.get(uri.path()).cloned());
    match fixture {
        Some(fixture) => {
            let status = StatusCode::from_u16(fixture.status).unwrap_or(StatusCode::OK);
            (
                status,
                [(header::CONTENT_TYPE, fixture.content_type)],
                fixture.body,
            )
                .into_response()
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
