use serde::{Deserialize, Serialize};

use crate::vocab::{TokenId, VocabEntry};

/// Body of `/tokenize` and `/encode`. The BPE-era clients send `text`,
/// so both field names are accepted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SentenceRequest {
    #[serde(default, alias = "text", skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
}

impl SentenceRequest {
    pub fn new(sentence: impl Into<String>) -> Self {
        Self {
            sentence: Some(sentence.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodeRequest {
    pub ids: Vec<TokenId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeResponse {
    pub input_sentence: String,
    pub encoded: Vec<TokenId>,
    pub decoded: Vec<String>,
    pub vocab_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub input_sentence: String,
    pub encoded: Vec<TokenId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResponse {
    pub decoded: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabResponse {
    pub vocab_size: usize,
    pub tokens: Vec<VocabEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RustTarget {
    pub os: String,
    pub arch: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub service: String,
    pub version: String,
    pub rust_target: RustTarget,
    pub cwd: String,
}

/// Error body, shaped like FastAPI's so existing clients keep working.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
