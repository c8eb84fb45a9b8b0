use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExporterError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("bugsnag api returned {status} {reason}: {body}")]
    RemoteApi {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExporterError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::RemoteApi { .. } => "RemoteAPIError",
            Self::Transport(_) => "TransportError",
            Self::Decode(_) => "DecodeError",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteApi { .. } | Self::Transport(_) | Self::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
