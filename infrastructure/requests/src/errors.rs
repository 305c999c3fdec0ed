#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request.invalid_header: {name}")]
    InvalidHeader { name: String },
    #[error("request.build: {url}")]
    Build {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request.transport: {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request.body: {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request.encode")]
    Encode(#[source] serde_json::Error),
    /// Non-2xx answer; renders the way callers grep for it in logs.
    #[error("{url}: [{status}] {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
