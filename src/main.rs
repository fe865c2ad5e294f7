use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use wordtok::config::ServerConfig;
use wordtok::server::TokenizerServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let vocab = wordtok::vocabulary_for(&config)?;
    match &config.corpus_path {
        Some(path) => info!(corpus = %path.display(), vocab_size = vocab.len(), "vocabulary built"),
        None => info!(vocab_size = vocab.len(), "vocabulary built from built-in corpus"),
    }

    let server = TokenizerServer::start(&config, Arc::new(vocab)).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await;

    Ok(())
}
