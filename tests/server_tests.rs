mod common;

use common::{body_of, post, raw_exchange, start_server, status_of, test_config};
use wordtok::client::{ClientError, TokenizerClient};
use wordtok::types::TokenizeResponse;
use wordtok::{Tokenize, UNK_TOKEN};

fn client_for(server: &wordtok::server::TokenizerServer) -> TokenizerClient {
    TokenizerClient::from_base_url(server.base_url()).expect("client builds")
}

#[tokio::test]
async fn health_over_raw_tcp() {
    let server = start_server(test_config()).await;

    let raw = raw_exchange(&server, b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(status_of(&raw), 200);
    assert!(raw.contains("Content-Type: application/json"));
    assert!(raw.contains("Access-Control-Allow-Origin: *"));
    assert_eq!(body_of(&raw), serde_json::json!({ "status": "ok" }));

    server.shutdown().await;
}

#[tokio::test]
async fn tokenize_over_raw_tcp() {
    let server = start_server(test_config()).await;

    let raw = raw_exchange(&server, &post("/tokenize", r#"{"sentence":"I love NLP"}"#)).await;

    assert_eq!(status_of(&raw), 200);
    assert_eq!(
        body_of(&raw),
        serde_json::json!({
            "input_sentence": "I love NLP",
            "encoded": [1, 2, 4],
            "decoded": ["i", "love", "nlp"],
            "vocab_size": 8,
        })
    );

    server.shutdown().await;
}

#[tokio::test]
async fn empty_sentence_is_rejected_with_400() {
    let server = start_server(test_config()).await;

    let raw = raw_exchange(&server, &post("/tokenize", r#"{"sentence":""}"#)).await;
    assert_eq!(status_of(&raw), 400);
    assert_eq!(body_of(&raw)["detail"], "`sentence` must be provided");

    let raw = raw_exchange(&server, &post("/tokenize", "{}")).await;
    assert_eq!(status_of(&raw), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_json_is_unprocessable() {
    let server = start_server(test_config()).await;

    let raw = raw_exchange(&server, &post("/tokenize", "{not json")).await;
    assert_eq!(status_of(&raw), 422);

    server.shutdown().await;
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let server = start_server(test_config().with_max_body_bytes(16)).await;

    let raw = raw_exchange(
        &server,
        b"POST /tokenize HTTP/1.1\r\nHost: localhost\r\nContent-Length: 4096\r\n\r\n",
    )
    .await;
    assert_eq!(status_of(&raw), 413);

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_routes_and_methods() {
    let server = start_server(test_config()).await;

    let raw = raw_exchange(&server, b"GET /nope HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&raw), 404);

    let raw = raw_exchange(&server, b"DELETE /vocab HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&raw), 405);

    let raw = raw_exchange(&server, b"OPTIONS /tokenize HTTP/1.1\r\n\r\n").await;
    assert_eq!(status_of(&raw), 204);
    assert!(raw.contains("Access-Control-Allow-Methods: GET, POST, OPTIONS"));

    let raw = raw_exchange(&server, b"NONSENSE\r\n\r\n").await;
    assert_eq!(status_of(&raw), 400);

    server.shutdown().await;
}

#[tokio::test]
async fn client_round_trip() {
    let server = start_server(test_config()).await;
    let client = client_for(&server);

    assert_eq!(client.health().await.unwrap().status, "ok");

    let version = client.version().await.unwrap();
    assert_eq!(version.service, "word-level-tokenizer");
    assert_eq!(version.version, env!("CARGO_PKG_VERSION"));

    let response = client.tokenize("I enjoy AI").await.unwrap();
    assert_eq!(
        response,
        TokenizeResponse {
            input_sentence: "I enjoy AI".to_string(),
            encoded: vec![1, 0, 0],
            decoded: vec!["i".to_string(), UNK_TOKEN.to_string(), UNK_TOKEN.to_string()],
            vocab_size: 8,
        }
    );

    let encoded = client.encode("python is fun").await.unwrap();
    assert_eq!(encoded.encoded, vec![7, 5, 6]);

    let decoded = client.decode(&[3, 42]).await.unwrap();
    assert_eq!(decoded.decoded, vec!["learning", UNK_TOKEN]);

    let vocab = client.vocab().await.unwrap();
    assert_eq!(vocab.vocab_size, 8);
    assert_eq!(vocab.tokens[0].word, UNK_TOKEN);
    assert_eq!(vocab.tokens[7].word, "python");

    server.shutdown().await;
}

#[tokio::test]
async fn client_surfaces_server_detail() {
    let server = start_server(test_config()).await;
    let client = client_for(&server);

    match client.tokenize("").await {
        Err(ClientError::Status { status, detail }) => {
            assert_eq!(status, 400);
            assert_eq!(detail, "`sentence` must be provided");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn remote_and_local_tokenizers_agree() {
    let server = start_server(test_config()).await;
    let remote = client_for(&server);
    let local = common::sample_vocab();

    let tokenizers: [&dyn Tokenize; 2] = [&remote, &local];
    let mut results = Vec::new();
    for tokenizer in tokenizers {
        results.push(tokenizer.tokenize("NLP is FUN for me").await.unwrap());
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].encoded, vec![4, 5, 6, 0, 0]);

    server.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let server = start_server(test_config()).await;
    let addr = server.address();
    server.shutdown().await;

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn stalled_request_head_is_timed_out() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let config = test_config().with_read_timeout(std::time::Duration::from_millis(200));
    let server = start_server(config).await;

    let mut stream = tokio::net::TcpStream::connect(server.address())
        .await
        .expect("connects");
    stream
        .write_all(b"POST /tokenize HTTP/1.1\r\nHost: x\r\n")
        .await
        .expect("writes partial head");

    let mut response = Vec::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut response),
    )
    .await
    .expect("server closes the idle connection")
    .expect("reads response");

    let raw = String::from_utf8(response).expect("utf-8 response");
    assert_eq!(status_of(&raw), 408);
    assert!(body_of(&raw)["detail"]
        .as_str()
        .is_some_and(|detail| detail.contains("200 ms")));

    server.shutdown().await;
}
