use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{BoxError, Tokenize};
use crate::config::{ClientOptions, ClientOptionsError};
use crate::types::{
    DecodeRequest, DecodeResponse, EncodeResponse, ErrorResponse, HealthResponse,
    SentenceRequest, TokenizeResponse, VersionResponse, VocabResponse,
};
use crate::vocab::TokenId;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Options(#[from] ClientOptionsError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
}

/// HTTP client for a running tokenizer service.
pub struct TokenizerClient {
    pub http_client: reqwest::Client,
    pub options: ClientOptions,
}

impl TokenizerClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_options(ClientOptions::default())
    }

    pub fn from_base_url(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Self::with_options(ClientOptions::from_base_url(base_url)?)
    }

    pub fn with_options(options: ClientOptions) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if options.disable_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            http_client: builder.build()?,
            options,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.options.origin(), path)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("/health").await
    }

    pub async fn version(&self) -> Result<VersionResponse, ClientError> {
        self.get("/version").await
    }

    pub async fn vocab(&self) -> Result<VocabResponse, ClientError> {
        self.get("/vocab").await
    }

    pub async fn tokenize(&self, sentence: &str) -> Result<TokenizeResponse, ClientError> {
        self.post("/tokenize", &SentenceRequest::new(sentence)).await
    }

    pub async fn encode(&self, sentence: &str) -> Result<EncodeResponse, ClientError> {
        self.post("/encode", &SentenceRequest::new(sentence)).await
    }

    pub async fn decode(&self, ids: &[TokenId]) -> Result<DecodeResponse, ClientError> {
        self.post("/decode", &DecodeRequest { ids: ids.to_vec() })
            .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.http_client.get(self.url(path)).send().await?;
        read_json_response(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        read_json_response(response).await
    }
}

async fn read_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&text)
        .map(|err| err.detail)
        .unwrap_or(text);

    Err(ClientError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[async_trait::async_trait]
impl Tokenize for TokenizerClient {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, BoxError> {
        Ok(TokenizerClient::encode(self, sentence).await?.encoded)
    }

    async fn decode(&self, ids: &[TokenId]) -> Result<Vec<String>, BoxError> {
        Ok(TokenizerClient::decode(self, ids).await?.decoded)
    }

    async fn vocab_size(&self) -> Result<usize, BoxError> {
        Ok(self.vocab().await?.vocab_size)
    }

    // one round trip instead of three
    async fn tokenize(&self, sentence: &str) -> Result<TokenizeResponse, BoxError> {
        Ok(TokenizerClient::tokenize(self, sentence).await?)
    }
}
