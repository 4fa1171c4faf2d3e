//! In-process stand-ins for the digitization service

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

/// One multipart part as parsed by the server.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// One upload as seen by the server.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub content_type: String,
    pub parts: Vec<ReceivedPart>,
}

impl ReceivedRequest {
    pub fn part(&self, name: &str) -> Option<&ReceivedPart> {
        self.parts.iter().find(|p| p.name == name)
    }
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    delay: Duration,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// Mock digitization endpoint answering every upload with a fixed status and body.
pub struct MockServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockServer {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    /// Like `start`, but every response is held back for `delay`.
    pub async fn start_with_delay(status: u16, body: &str, delay: Duration) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status: StatusCode::from_u16(status).expect("valid status code"),
            body: body.to_string(),
            delay,
            received: received.clone(),
        };

        let app = Router::new()
            .route("/digitize", post(digitize))
            .layer(DefaultBodyLimit::disable())
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server error");
        });

        Self { addr, received }
    }

    pub fn url(&self) -> String {
        format!("http://{}/digitize", self.addr)
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

async fn digitize(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("well-formed multipart body") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.expect("readable part").to_vec();
        parts.push(ReceivedPart {
            name,
            file_name,
            content_type: part_type,
            data,
        });
    }

    state.received.lock().unwrap().push(ReceivedRequest {
        content_type,
        parts,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body.clone(),
    )
}

/// Endpoint on a port nobody listens on.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/digitize")
}

/// Endpoint that answers every connection with bytes that are not HTTP.
pub async fn garbage_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}/digitize")
}
