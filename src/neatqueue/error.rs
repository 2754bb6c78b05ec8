use thiserror::Error;

/// Fatal misconfiguration, reported when the client is built.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid NeatQueue base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("NeatQueue base URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),

    #[error("NeatQueue API key is not a valid header value")]
    InvalidCredential,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("NeatQueue API not configured. Please set NEATQUEUE_API_KEY and DISCORD_GUILD_ID.")]
    NotConfigured,
}

/// A single HTTP attempt that never produced a status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Why one candidate endpoint was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandidateFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response is not JSON: {0}")]
    InvalidJson(String),

    #[error("unrecognized response shape")]
    UnrecognizedShape,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no candidate endpoints to try")]
    NoCandidates,

    /// Only the most recent failure is kept.
    #[error("all {attempted} candidate endpoints failed, last error: {last}")]
    Exhausted {
        attempted: usize,
        last: CandidateFailure,
    },

    #[error("probing cancelled")]
    Cancelled,
}
