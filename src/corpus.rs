use std::path::Path;

use crate::config::ConfigError;

/// Sentences the service trains on when no corpus file is configured.
pub const DEFAULT_CORPUS: &[&str] = &["I love learning NLP", "NLP is fun", "I love Python"];

pub fn default_corpus() -> Vec<String> {
    DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect()
}

/// Read a corpus file: one sentence per line, blank lines skipped.
pub fn load_corpus(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CorpusRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_corpus(&content))
}

pub fn parse_corpus(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let corpus = parse_corpus("first line\n\n   \nsecond line\r\n");
        assert_eq!(corpus, vec!["first line", "second line"]);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_corpus(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::CorpusRead { .. }));
    }
}
