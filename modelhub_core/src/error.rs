use std::fmt;

/// Semantic classification of a non-success response from the contents API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HttpErrorKind {
    NotFound,
    InvalidCredential,
    AccessDenied,
    Remote,
}

impl HttpErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 => Self::InvalidCredential,
            403 => Self::AccessDenied,
            _ => Self::Remote,
        }
    }
}

/// A non-success response, with enough context to tell the user what to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub status: u16,
    /// The `message` field of the remote error body, empty if there was none.
    pub remote_message: String,
    pub had_credential: bool,
    pub path: String,
}

impl HttpError {
    pub fn new(
        status: u16,
        remote_message: impl Into<String>,
        had_credential: bool,
        path: impl Into<String>,
    ) -> Self {
        Self {
            kind: HttpErrorKind::from_status(status),
            status,
            remote_message: remote_message.into(),
            had_credential,
            path: path.into(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = &self.remote_message;
        match self.kind {
            HttpErrorKind::NotFound if !self.had_credential => write!(
                f,
                "file not found: {} (no auth token; if this is a private repo, sign in first)",
                self.path
            ),
            HttpErrorKind::NotFound => write!(
                f,
                "not found: {} (GitHub says: {msg}; check repo name, branch, and that your token has 'repo' scope)",
                self.path
            ),
            HttpErrorKind::InvalidCredential => write!(f, "invalid GitHub token: {msg}"),
            HttpErrorKind::AccessDenied => write!(f, "access denied: {msg}"),
            HttpErrorKind::Remote => write!(f, "GitHub API error {}: {msg}", self.status),
        }
    }
}

impl std::error::Error for HttpError {}

/// Error type for `modelhub_core`.
///
/// Every variant is terminal for the request that produced it; nothing is
/// retried internally.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("GitHub not configured")]
    NotConfigured,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to reach GitHub API for {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("failed to decode file content for {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("empty config file: {path}")]
    EmptyContent { path: String },

    #[error("config file must contain an array of models ({path}: {detail})")]
    Parse { path: String, detail: String },

    #[error("observability init failed: {0}")]
    O11y(String),
}

impl Error {
    pub fn network(path: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// The HTTP classification, if this error came from a non-success response.
    pub fn http_kind(&self) -> Option<HttpErrorKind> {
        match self {
            Self::Http(e) => Some(e.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
