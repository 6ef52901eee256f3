use snafu::Snafu;

/// HTTP status the backend uses to report that the viewer lost access to a room.
pub const ACCESS_LOST_STATUS: u16 = 403;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("failed to build http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("invalid header value for {header} on `{stage}`"))]
    InvalidHeader {
        stage: &'static str,
        header: &'static str,
        source: reqwest::header::InvalidHeaderValue,
    },
    #[snafu(display("request to {endpoint} failed on `{stage}`: {source}"))]
    Transport {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("{endpoint} answered with status {status} on `{stage}`"))]
    Status {
        stage: &'static str,
        endpoint: String,
        status: u16,
        /// Error code from the `{ "error": .. }` body, when the backend sent one.
        code: Option<String>,
    },
    #[snafu(display("failed to decode {endpoint} payload on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        endpoint: String,
        source: serde_json::Error,
    },
}

impl BackendError {
    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|status| status.as_u16()),
            Self::BuildClient { .. } | Self::InvalidHeader { .. } | Self::Decode { .. } => None,
        }
    }

    pub fn is_access_lost(&self) -> bool {
        self.status() == Some(ACCESS_LOST_STATUS)
    }
}

pub type BackendResult<T> = Result<T, BackendError>;
