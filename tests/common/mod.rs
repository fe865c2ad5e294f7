#![allow(dead_code)]

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wordtok::config::ServerConfig;
use wordtok::server::TokenizerServer;
use wordtok::Vocabulary;

pub const SAMPLE_SENTENCES: [&str; 3] = ["I love learning NLP", "NLP is fun", "I love Python"];

pub fn sample_vocab() -> Vocabulary {
    Vocabulary::build(SAMPLE_SENTENCES)
}

pub fn test_config() -> ServerConfig {
    ServerConfig::default().with_port(0)
}

pub async fn start_server(config: ServerConfig) -> TokenizerServer {
    TokenizerServer::start(&config, Arc::new(sample_vocab()))
        .await
        .expect("server starts")
}

/// Send a raw request and read until the server closes the connection.
pub async fn raw_exchange(server: &TokenizerServer, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(server.address())
        .await
        .expect("connects");
    stream.write_all(request).await.expect("writes request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("reads response");

    String::from_utf8(response).expect("utf-8 response")
}

pub fn status_of(raw: &str) -> u16 {
    raw.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line")
}

pub fn body_of(raw: &str) -> serde_json::Value {
    let idx = raw
        .find("\r\n\r\n")
        .expect("raw response should contain header terminator");

    serde_json::from_str(&raw[idx + 4..]).expect("response body should deserialize")
}

pub fn post(path: &str, body: &str) -> Vec<u8> {
    format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    )
    .into_bytes()
}
