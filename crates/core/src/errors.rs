use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("task description must not be empty")]
    EmptyDescription,
    #[error("unknown task status: `{0}`")]
    UnknownStatus(String),
    #[error("unknown team member: `{0}`")]
    UnknownTeamMember(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("upstream failure: {0}")]
    Upstream(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// Transport-facing failure classes. Authentication rejections become 401
/// with no further processing; validation failures are rendered as HTTP 200
/// ephemeral messages so the Slack client shows them. A status change
/// against a missing task id is not an interface error; it renders as a
/// visible ephemeral reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("authentication failed: {message}")]
    AuthenticationFailure { message: String, correlation_id: String },
    #[error("validation failed: {message}")]
    ValidationFailure { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthenticationFailure { .. } => "Unauthorized",
            Self::ValidationFailure { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            ApplicationError::Domain(error) => InterfaceError::ValidationFailure {
                message: error.to_string(),
                correlation_id,
            },
            ApplicationError::Persistence(message) | ApplicationError::Upstream(message) => {
                InterfaceError::Internal { message, correlation_id }
            }
            ApplicationError::Configuration(message) => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}
