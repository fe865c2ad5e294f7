//! Word-level tokenizer with a small JSON-over-HTTP service around it.
//!
//! The vocabulary is built once from a training corpus and is immutable
//! afterwards. Words are lowercased and split on whitespace; unknown words
//! encode to ID 0 and unknown IDs decode to `<UNK>`.

pub mod api;
pub mod client;
pub mod config;
pub mod corpus;
pub mod server;
pub mod types;
pub mod vocab;

pub use api::Tokenize;
pub use vocab::{build_vocab, decode, encode, TokenId, Vocabulary, UNK_ID, UNK_TOKEN};

use config::{ConfigError, ServerConfig};

/// Build the vocabulary the server will use: the configured corpus file if
/// there is one, the built-in corpus otherwise.
pub fn vocabulary_for(config: &ServerConfig) -> Result<Vocabulary, ConfigError> {
    let sentences = match &config.corpus_path {
        Some(path) => corpus::load_corpus(path)?,
        None => corpus::default_corpus(),
    };

    Ok(build_vocab(sentences))
}
