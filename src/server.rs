//! A small HTTP/1.1 front end for a [`Vocabulary`].
//!
//! Each connection carries exactly one request and is closed after the
//! response. The vocabulary is shared read-only between connection tasks.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::api::{validate_sentence, ApiError};
use crate::config::ServerConfig;
use crate::types::{
    DecodeRequest, DecodeResponse, EncodeResponse, ErrorResponse, HealthResponse, RustTarget,
    SentenceRequest, TokenizeResponse, VersionResponse, VocabResponse,
};
use crate::vocab::Vocabulary;

pub const SERVICE_NAME: &str = "word-level-tokenizer";

const MAX_HEAD_BYTES: usize = 16 * 1024;

// pause after a failed accept so fd exhaustion doesn't spin the loop
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

const ROUTES: &[&str] = &["/health", "/version", "/tokenize", "/encode", "/decode", "/vocab"];

struct ServerState {
    vocab: Arc<Vocabulary>,
    max_body_bytes: usize,
    read_timeout: Duration,
}

pub struct TokenizerServer {
    addr: SocketAddr,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    join_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl TokenizerServer {
    /// Bind according to `config` and start serving in a background task.
    pub async fn start(config: &ServerConfig, vocab: Arc<Vocabulary>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()).await?;
        let addr = listener.local_addr()?;

        info!(%addr, vocab_size = vocab.len(), "tokenizer server listening");

        let state = Arc::new(ServerState {
            vocab,
            max_body_bytes: config.max_body_bytes,
            read_timeout: config.read_timeout,
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join_handle = tokio::spawn(async move {
            run_server(listener, state, shutdown_rx).await;
        });

        Ok(Self {
            addr,
            shutdown_tx: Arc::new(Mutex::new(Some(shutdown_tx))),
            join_handle: Arc::new(Mutex::new(Some(join_handle))),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    /// In-flight connection tasks are left to finish on their own.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            let _ = handle.await;
        }

        info!(addr = %self.addr, "tokenizer server stopped");
    }
}

impl Drop for TokenizerServer {
    fn drop(&mut self) {
        if let Ok(mut tx_opt) = self.shutdown_tx.try_lock() {
            if let Some(tx) = tx_opt.take() {
                let _ = tx.send(());
            }
        }

        if let Ok(mut handle_opt) = self.join_handle.try_lock() {
            if let Some(handle) = handle_opt.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait::async_trait]
trait Acceptor: Send {
    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait::async_trait]
impl Acceptor for TcpListener {
    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Accept until shutdown is signalled. Accept errors (EMFILE, ECONNABORTED,
/// ...) are transient and only delay the next attempt.
async fn run_server<A: Acceptor>(
    mut listener: A,
    state: Arc<ServerState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                break;
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, state).await {
                                warn!(%peer, "connection error: {}", err);
                            }
                        });
                    }
                    Err(err) => {
                        warn!("accept error: {}", err);
                        tokio::select! {
                            biased;
                            _ = &mut shutdown_rx => break,
                            _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
struct HttpResponse {
    status: u16,
    body: Vec<u8>,
    headers: Vec<(&'static str, &'static str)>,
}

impl HttpResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status,
                body,
                headers: vec![("Content-Type", "application/json")],
            },
            Err(err) => {
                error!("failed to serialize response: {}", err);
                Self::error(500, "internal server error")
            }
        }
    }

    fn error(status: u16, detail: impl Into<String>) -> Self {
        let body = serde_json::json!({ "detail": detail.into() }).to_string();
        Self {
            status,
            body: body.into_bytes(),
            headers: vec![("Content-Type", "application/json")],
        }
    }

    fn preflight() -> Self {
        Self {
            status: 204,
            body: Vec::new(),
            headers: vec![
                ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
                ("Access-Control-Allow-Headers", "*"),
            ],
        }
    }

    fn from_api_error(err: &ApiError) -> Self {
        Self::json(
            err.status(),
            &ErrorResponse {
                detail: err.to_string(),
            },
        )
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        _ => "Internal Server Error",
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<ServerState>,
) -> std::io::Result<()> {
    let read = tokio::time::timeout(
        state.read_timeout,
        read_request(&mut stream, state.max_body_bytes),
    )
    .await;

    let request = match read {
        Ok(request) => request?,
        Err(_) => {
            let err = ApiError::RequestTimeout {
                timeout_ms: state.read_timeout.as_millis(),
            };
            debug!("closing idle connection: {}", err);
            return send_response(HttpResponse::from_api_error(&err), &mut stream).await;
        }
    };

    let response = match request {
        Some(request) => {
            let response = match route(&state, &request) {
                Ok(response) => response,
                Err(err) => {
                    debug!(method = %request.method, path = %request.path, "rejected: {}", err);
                    HttpResponse::from_api_error(&err)
                }
            };
            debug!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "handled request"
            );
            response
        }
        None => return Ok(()),
    };

    send_response(response, &mut stream).await
}

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

/// Read one request. Protocol errors are answered here directly, so `Ok(None)`
/// means there is nothing left to route.
async fn read_request(
    stream: &mut TcpStream,
    max_body_bytes: usize,
) -> std::io::Result<Option<Request>> {
    let mut buffer = Vec::new();
    let mut temp = [0u8; 1024];
    let mut head: Option<(usize, ParsedHead)> = None;

    loop {
        let n = stream.read(&mut temp).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&temp[..n]);

        if head.is_none() {
            match find_header_end(&buffer) {
                Some(end) => match parse_request_head(&buffer[..end]) {
                    Ok(parsed) if parsed.content_length > max_body_bytes => {
                        let err = ApiError::PayloadTooLarge {
                            limit: max_body_bytes,
                        };
                        send_response(HttpResponse::from_api_error(&err), stream).await?;
                        return Ok(None);
                    }
                    Ok(parsed) => head = Some((end, parsed)),
                    Err(err) => {
                        send_response(HttpResponse::from_api_error(&err), stream).await?;
                        return Ok(None);
                    }
                },
                None if buffer.len() > MAX_HEAD_BYTES => {
                    let err = ApiError::MalformedRequest("request head too large".to_string());
                    send_response(HttpResponse::from_api_error(&err), stream).await?;
                    return Ok(None);
                }
                None => {}
            }
        }

        if let Some((end, parsed)) = &head {
            if buffer.len() >= end + parsed.content_length {
                break;
            }
        }
    }

    let (end, parsed) = match head {
        Some(head) => head,
        None => return Ok(None),
    };

    let body = match buffer.get(end..end + parsed.content_length) {
        Some(body) => body.to_vec(),
        None => {
            let err = ApiError::MalformedRequest("incomplete request body".to_string());
            send_response(HttpResponse::from_api_error(&err), stream).await?;
            return Ok(None);
        }
    };

    Ok(Some(Request {
        method: parsed.method,
        path: parsed.path,
        body,
    }))
}

fn route(state: &ServerState, request: &Request) -> Result<HttpResponse, ApiError> {
    let vocab = &state.vocab;

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => Ok(HttpResponse::json(
            200,
            &HealthResponse {
                status: "ok".to_string(),
            },
        )),
        ("GET", "/version") => Ok(HttpResponse::json(200, &version_info())),
        ("POST", "/tokenize") => {
            let request: SentenceRequest = parse_body(&request.body)?;
            let sentence = validate_sentence(request.sentence.as_deref())?;
            let encoded = vocab.encode(sentence);
            let decoded = vocab.decode(&encoded);

            Ok(HttpResponse::json(
                200,
                &TokenizeResponse {
                    input_sentence: sentence.to_string(),
                    encoded,
                    decoded,
                    vocab_size: vocab.len(),
                },
            ))
        }
        ("POST", "/encode") => {
            let request: SentenceRequest = parse_body(&request.body)?;
            let sentence = validate_sentence(request.sentence.as_deref())?;

            Ok(HttpResponse::json(
                200,
                &EncodeResponse {
                    input_sentence: sentence.to_string(),
                    encoded: vocab.encode(sentence),
                },
            ))
        }
        ("POST", "/decode") => {
            let request: DecodeRequest = parse_body(&request.body)?;

            Ok(HttpResponse::json(
                200,
                &DecodeResponse {
                    decoded: vocab.decode(&request.ids),
                },
            ))
        }
        ("GET", "/vocab") => Ok(HttpResponse::json(
            200,
            &VocabResponse {
                vocab_size: vocab.len(),
                tokens: vocab.entries(),
            },
        )),
        ("OPTIONS", path) if ROUTES.contains(&path) => Ok(HttpResponse::preflight()),
        (_, path) if ROUTES.contains(&path) => Err(ApiError::MethodNotAllowed),
        _ => Err(ApiError::NotFound),
    }
}

fn parse_body<'a, T: serde::Deserialize<'a>>(body: &'a [u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::InvalidBody(err.to_string()))
}

fn version_info() -> VersionResponse {
    let cwd = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();

    VersionResponse {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rust_target: RustTarget {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        cwd,
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

#[derive(Debug)]
struct ParsedHead {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    content_length: usize,
}

fn parse_request_head(buffer: &[u8]) -> Result<ParsedHead, ApiError> {
    let head = String::from_utf8_lossy(buffer);
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or("");

    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method, target)
        }
        _ => {
            return Err(ApiError::MalformedRequest(format!(
                "bad request line {:?}",
                request_line
            )))
        }
    };

    // query strings are accepted and ignored
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut headers = HashMap::new();
    let mut content_length = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ApiError::MalformedRequest(format!("bad header {:?}", line)))?;

        let key = name.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if key == "content-length" {
            content_length = value
                .parse()
                .map_err(|_| ApiError::MalformedRequest(format!("bad content-length {:?}", value)))?;
        }
        headers.insert(key, value);
    }

    let parsed = ParsedHead {
        method: method.to_string(),
        path,
        headers,
        content_length,
    };

    if parsed
        .headers
        .get("transfer-encoding")
        .is_some_and(|te| te.eq_ignore_ascii_case("chunked"))
    {
        return Err(ApiError::MalformedRequest(
            "chunked request bodies are not supported".to_string(),
        ));
    }

    Ok(parsed)
}

async fn send_response(response: HttpResponse, stream: &mut TcpStream) -> std::io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n",
        response.status,
        reason_phrase(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.shutdown().await
}
