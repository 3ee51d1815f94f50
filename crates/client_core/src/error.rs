use shared::domain::LocoAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid control server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported control server scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("control server request timed out")]
    Timeout,
    #[error("control server request failed: {0}")]
    Request(reqwest::Error),
    #[error("control server answered {status}: {body}")]
    Status { status: u16, body: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

impl TransportError {
    /// The server answered but has no route for the request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("power is off")]
    PowerOff,
    #[error("no locomotive selected")]
    NoSelection,
    #[error("locomotive {0} is not configured")]
    UnknownLocomotive(LocoAddress),
    #[error("unrecognized power state '{0}'")]
    UnrecognizedPowerState(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Guard rejections are recovered locally and never reach the server.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::PowerOff | Self::NoSelection)
    }
}
