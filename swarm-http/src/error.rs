use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Flat label for an [`Error`], used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    InvalidRequest,
    Connect,
    Request,
    Timeout,
    BodyRead,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("unsupported scheme in `{0}` (expected http or https)")]
    UnsupportedScheme(String),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("connection failed: {0}")]
    Connect(#[source] hyper_util::client::legacy::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper_util::client::legacy::Error),

    #[error("no complete response within {0:?}")]
    Timeout(Duration),

    #[error("response body read failed: {0}")]
    BodyRead(#[from] hyper::Error),
}

impl From<hyper_util::client::legacy::Error> for Error {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => ErrorKind::UnsupportedScheme,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Connect(_) => ErrorKind::Connect,
            Self::Request(_) => ErrorKind::Request,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::BodyRead(_) => ErrorKind::BodyRead,
        }
    }

    /// The request never reached the target, or no complete response came back.
    ///
    /// Malformed URLs and headers are caller bugs and return `false`.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connect | ErrorKind::Request | ErrorKind::Timeout | ErrorKind::BodyRead
        )
    }
}
