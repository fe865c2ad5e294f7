use std::path::PathBuf;
use std::time::Duration;

pub const HOST_VAR: &str = "WORDTOK_HOST";
pub const PORT_VAR: &str = "WORDTOK_PORT";
pub const MAX_BODY_VAR: &str = "WORDTOK_MAX_BODY";
pub const CORPUS_VAR: &str = "WORDTOK_CORPUS";
pub const READ_TIMEOUT_VAR: &str = "WORDTOK_READ_TIMEOUT_MS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_BODY: usize = 64 * 1024;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} is not a valid port")]
    InvalidPort { var: &'static str, value: String },
    #[error("invalid {var}: {value:?} is not a positive byte count")]
    InvalidBodyLimit { var: &'static str, value: String },
    #[error("invalid {var}: {value:?} is not a positive number of milliseconds")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("failed to read corpus {path:?}: {source}")]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    /// How long a client may take to send a complete request.
    pub read_timeout: Duration,
    pub corpus_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            corpus_path: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source. Unset or blank
    /// variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = get(HOST_VAR) {
            config.host = host;
        }

        if let Some(port) = get(PORT_VAR) {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_VAR,
                value: port,
            })?;
        }

        if let Some(limit) = get(MAX_BODY_VAR) {
            config.max_body_bytes = match limit.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidBodyLimit {
                        var: MAX_BODY_VAR,
                        value: limit,
                    })
                }
            };
        }

        if let Some(timeout) = get(READ_TIMEOUT_VAR) {
            config.read_timeout = match timeout.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: READ_TIMEOUT_VAR,
                        value: timeout,
                    })
                }
            };
        }

        config.corpus_path = get(CORPUS_VAR).map(PathBuf::from);

        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientOptionsError {
    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base url missing host")]
    MissingHost,
    #[error("base url missing port")]
    MissingPort,
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Where a [`crate::client::TokenizerClient`] sends its requests.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub disable_proxy: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            disable_proxy: true,
        }
    }
}

impl ClientOptions {
    pub fn from_base_url(base_url: impl AsRef<str>) -> Result<Self, ClientOptionsError> {
        let url = url::Url::parse(base_url.as_ref())?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ClientOptionsError::UnsupportedScheme(other.to_string())),
        };

        let host = url
            .host_str()
            .ok_or(ClientOptionsError::MissingHost)?
            .to_string();

        let port = url
            .port_or_known_default()
            .ok_or(ClientOptionsError::MissingPort)?;

        Ok(Self {
            scheme,
            disable_proxy: matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"),
            host,
            port,
        })
    }

    pub fn origin(&self) -> String {
        match (self.scheme, self.port) {
            (Scheme::Https, 443) => format!("https://{}", self.host),
            (Scheme::Http, 80) => format!("http://{}", self.host),
            _ => format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port),
        }
    }
}
