//! Error taxonomy for everything that crosses the studio/service boundary.

use thiserror::Error;

/// Fallback shown when the service gives no usable `detail`.
pub const GENERIC_FAILURE: &str = "Prediction failed. Check the server logs for details.";

/// Fallback shown when the request never reached the service.
pub const UNREACHABLE: &str = "Could not reach the prediction service.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudioError {
    /// Rejected locally, the network was never touched.
    #[error("{0}")]
    Validation(String),

    /// The request could not be sent, or the service answered with a
    /// non-success status. `status` is `None` when no response arrived.
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// Success status but the body did not match the expected shape.
    #[error("{0}")]
    MalformedResponse(String),

    /// An output-root operation failed. Never blocks the predict flow.
    #[error("{0}")]
    Setting(String),
}

impl StudioError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Short state label for the status area.
    pub fn state_label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Missing input",
            Self::Transport { .. } | Self::MalformedResponse(_) => "Error",
            Self::Setting(_) => "Output folder",
        }
    }

    /// Re-scope a transport or parse failure as an output-root failure.
    pub fn into_setting(self) -> Self {
        match self {
            Self::Setting(_) => self,
            other => Self::Setting(other.to_string()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type StudioResult<T> = Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_and_malformed_share_label() {
        let transport = StudioError::transport(Some(400), "Unsupported image format");
        let malformed = StudioError::MalformedResponse("bad body".to_string());
        assert_eq!(transport.state_label(), "Error");
        assert_eq!(malformed.state_label(), "Error");
        assert_eq!(transport.to_string(), "Unsupported image format");
    }

    #[test]
    fn test_into_setting_keeps_message() {
        let err = StudioError::transport(Some(500), "Folder picker is unavailable on this system.")
            .into_setting();
        assert_eq!(
            err,
            StudioError::Setting("Folder picker is unavailable on this system.".to_string())
        );
    }
}
