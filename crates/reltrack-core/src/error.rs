use reltrack_api::GatewayError;
use reltrack_cache::CacheError;
use thiserror::Error;

/// All the ways a tracker operation can go wrong
#[derive(Error, Debug)]
pub enum Error {
    #[error("Gateway request failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid release ID: {0:?}")]
    InvalidReleaseId(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse failure classes. The UI treats them all the same way (generic
/// notice, busy flag reset) but logs and the CLI exit path tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Never reached the backend
    Transport,
    /// Backend answered with an error
    Backend,
    /// Rejected before any request was made
    Validation,
    /// Config, cache or filesystem trouble on this machine
    Local,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Gateway(e) if e.is_transport() => ErrorKind::Transport,
            Error::Gateway(_) => ErrorKind::Backend,
            Error::InvalidReleaseId(_) => ErrorKind::Validation,
            Error::Cache(_)
            | Error::ConfigError(_)
            | Error::SerializationError(_)
            | Error::IoError(_) => ErrorKind::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let backend = Error::Gateway(GatewayError::Http {
            status: 500,
            body: String::new(),
        });
        assert_eq!(backend.kind(), ErrorKind::Backend);

        let invalid = Error::InvalidReleaseId("abc".into());
        assert_eq!(invalid.kind(), ErrorKind::Validation);
        assert_eq!(invalid.to_string(), "Invalid release ID: \"abc\"");

        let config = Error::ConfigError("nope".into());
        assert_eq!(config.kind(), ErrorKind::Local);
    }
}
