//! Word-level vocabulary.
//!
//! ID 0 is reserved for [`UNK_TOKEN`]. Every other word receives the next
//! free ID in the order it first appears in the training sentences, so the
//! IDs of a vocabulary with `n` entries are exactly `0..n`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub type TokenId = u32;

/// Placeholder emitted for words and IDs the vocabulary doesn't know.
pub const UNK_TOKEN: &str = "<UNK>";
pub const UNK_ID: TokenId = 0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub word: String,
    pub id: TokenId,
}

#[derive(Clone, Debug)]
pub struct Vocabulary {
    word_to_id: FxHashMap<String, TokenId>,
    // id -> word, dense because ids are handed out without gaps
    id_to_word: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from training sentences.
    ///
    /// Sentences are lowercased and split on runs of whitespace. Repeated
    /// words keep the ID of their first occurrence.
    pub fn build<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self {
            word_to_id: FxHashMap::default(),
            id_to_word: Vec::new(),
        };
        vocab.insert(UNK_TOKEN);

        for sentence in sentences {
            let lowered = sentence.as_ref().to_lowercase();
            for word in lowered.split_whitespace() {
                vocab.insert(word);
            }
        }

        vocab
    }

    fn insert(&mut self, word: &str) {
        if self.word_to_id.contains_key(word) {
            return;
        }

        let id = self.id_to_word.len() as TokenId;
        self.word_to_id.insert(word.to_string(), id);
        self.id_to_word.push(word.to_string());
    }

    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_word.is_empty()
    }

    /// Exact lookup; the word is expected to be lowercased already.
    pub fn id_of(&self, word: &str) -> Option<TokenId> {
        self.word_to_id.get(word).copied()
    }

    pub fn word_of(&self, id: TokenId) -> Option<&str> {
        self.id_to_word.get(id as usize).map(String::as_str)
    }

    /// Encode a sentence, one ID per whitespace-delimited word.
    /// Out-of-vocabulary words become [`UNK_ID`].
    pub fn encode(&self, sentence: &str) -> Vec<TokenId> {
        sentence
            .to_lowercase()
            .split_whitespace()
            .map(|word| self.id_of(word).unwrap_or(UNK_ID))
            .collect()
    }

    /// Decode IDs back into words. IDs with no entry become [`UNK_TOKEN`].
    pub fn decode(&self, ids: &[TokenId]) -> Vec<String> {
        ids.iter()
            .map(|&id| self.word_of(id).unwrap_or(UNK_TOKEN).to_string())
            .collect()
    }

    /// Entries in ID order.
    pub fn entries(&self) -> Vec<VocabEntry> {
        self.id_to_word
            .iter()
            .enumerate()
            .map(|(id, word)| VocabEntry {
                word: word.clone(),
                id: id as TokenId,
            })
            .collect()
    }
}

pub fn build_vocab<I, S>(sentences: I) -> Vocabulary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Vocabulary::build(sentences)
}

pub fn encode(sentence: &str, vocab: &Vocabulary) -> Vec<TokenId> {
    vocab.encode(sentence)
}

pub fn decode(ids: &[TokenId], vocab: &Vocabulary) -> Vec<String> {
    vocab.decode(ids)
}
