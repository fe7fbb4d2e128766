//! Errors raised from lifecycle hooks

/// Error returned by a lifecycle hook.
///
/// Any error from a `saving`, `creating`, `updating` or `deleting` hook
/// cancels the pending write. [`EventError::PropagationStopped`] is the
/// quiet form: the cancellation is logged at info rather than warn.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    /// The model failed a check performed by the hook
    #[error("{}", describe_validation(.attribute, .message))]
    Validation {
        attribute: Option<String>,
        message: String,
    },

    /// The observer itself failed
    #[error("Observer error: {0}")]
    Observer(String),

    #[error("Event propagation stopped: {0}")]
    PropagationStopped(String),
}

fn describe_validation(attribute: &Option<String>, message: &str) -> String {
    match attribute {
        Some(attribute) => format!("Validation failed on '{}': {}", attribute, message),
        None => format!("Validation failed: {}", message),
    }
}

impl EventError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: None,
            message: message.into(),
        }
    }

    /// Validation failure tied to one attribute
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute: Some(attribute.into()),
            message: message.into(),
        }
    }

    pub fn observer(message: impl Into<String>) -> Self {
        Self::Observer(message.into())
    }

    pub fn propagation_stopped(reason: impl Into<String>) -> Self {
        Self::PropagationStopped(reason.into())
    }

    pub fn is_propagation_stopped(&self) -> bool {
        matches!(self, Self::PropagationStopped(_))
    }
}
