use crate::types::TokenizeResponse;
use crate::vocab::{TokenId, Vocabulary};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced at the HTTP boundary. The tokenizer itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("`sentence` must be provided")]
    MissingSentence,
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("request not received within {timeout_ms} ms")]
    RequestTimeout { timeout_ms: u128 },
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::MissingSentence | ApiError::MalformedRequest(_) => 400,
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::RequestTimeout { .. } => 408,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::InvalidBody(_) => 422,
        }
    }
}

/// Reject missing or empty sentences before they reach the tokenizer.
/// Whitespace-only input is accepted and encodes to nothing.
pub fn validate_sentence(sentence: Option<&str>) -> Result<&str, ApiError> {
    match sentence {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ApiError::MissingSentence),
    }
}

/// Anything that can turn sentences into IDs and back, whether in-process
/// or over the network.
#[async_trait::async_trait]
pub trait Tokenize: Send + Sync {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, BoxError>;

    async fn decode(&self, ids: &[TokenId]) -> Result<Vec<String>, BoxError>;

    async fn vocab_size(&self) -> Result<usize, BoxError>;

    async fn tokenize(&self, sentence: &str) -> Result<TokenizeResponse, BoxError> {
        let sentence = validate_sentence(Some(sentence))?;
        let encoded = self.encode(sentence).await?;
        let decoded = self.decode(&encoded).await?;

        Ok(TokenizeResponse {
            input_sentence: sentence.to_string(),
            encoded,
            decoded,
            vocab_size: self.vocab_size().await?,
        })
    }
}

#[async_trait::async_trait]
impl Tokenize for Vocabulary {
    async fn encode(&self, sentence: &str) -> Result<Vec<TokenId>, BoxError> {
        Ok(Vocabulary::encode(self, sentence))
    }

    async fn decode(&self, ids: &[TokenId]) -> Result<Vec<String>, BoxError> {
        Ok(Vocabulary::decode(self, ids))
    }

    async fn vocab_size(&self) -> Result<usize, BoxError> {
        Ok(self.len())
    }
}
