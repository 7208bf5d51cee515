use super::orchestrator::OperationKind;
use super::transport::TransportError;

/// Broad failure category, for callers that branch on the cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Transport,
    Server,
    NotFound,
    Busy,
}

/// Why a request settled as a failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Missing or invalid input, caught before any network call
    #[error("{0}")]
    Validation(String),
    /// Service unreachable, timed out, or the body could not be read
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-success status, or an error reply from the service
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    /// Successful reply that holds no records
    #[error("{0}")]
    NotFound(String),
    /// A request of this kind is still pending and resubmits are rejected
    #[error("a {0} request is already pending")]
    Busy(OperationKind),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Validation(_) => FailureKind::Validation,
            ClientError::Transport(_) => FailureKind::Transport,
            ClientError::Server { .. } => FailureKind::Server,
            ClientError::NotFound(_) => FailureKind::NotFound,
            ClientError::Busy(_) => FailureKind::Busy,
        }
    }

    /// Message for end users. Transport and server causes collapse into one
    /// generic message; the detailed cause is logged where it happens.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) | ClientError::Server { .. } => {
                "Unable to fetch results from the analysis service.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_server_collapse_for_users() {
        let transport = ClientError::Transport("connection refused".to_string());
        let server = ClientError::Server {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(transport.user_message(), server.user_message());
        assert_ne!(transport.kind(), server.kind());
    }

    #[test]
    fn validation_and_not_found_keep_their_text() {
        let err = ClientError::Validation("Please enter a username.".to_string());
        assert_eq!(err.user_message(), "Please enter a username.");
        let err = ClientError::NotFound("No logs found.".to_string());
        assert_eq!(err.user_message(), "No logs found.");
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn transport_error_converts() {
        let err: ClientError = TransportError::new("timed out").into();
        assert_eq!(err, ClientError::Transport("timed out".to_string()));
    }
}
