//! Error types for the command pipeline.

use thiserror::Error;

/// Type-erased error returned by collaborators (factories, repositories,
/// transaction services).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Discriminant of a [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCommand,
    InvalidEvent,
    Collaborator,
}

/// Errors that can occur while executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command built by the command factory failed its own validity check.
    #[error("invalid command {name}: {details}")]
    InvalidCommand { name: String, details: String },

    /// An event built by the event factory failed its own validity check.
    ///
    /// Nothing from the batch was persisted.
    #[error("invalid event {name}: {details}")]
    InvalidEvent { name: String, details: String },

    /// A collaborator failed. The error is passed through untouched.
    #[error(transparent)]
    Collaborator(#[from] BoxError),
}

impl CommandError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidCommand { .. } => ErrorKind::InvalidCommand,
            CommandError::InvalidEvent { .. } => ErrorKind::InvalidEvent,
            CommandError::Collaborator(_) => ErrorKind::Collaborator,
        }
    }

    /// Returns the collaborator error downcast to `E`, if this is a
    /// collaborator error of that type.
    pub fn collaborator_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            CommandError::Collaborator(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Consumes the error, returning the collaborator error if there is one.
    pub fn into_collaborator(self) -> std::result::Result<BoxError, Self> {
        match self {
            CommandError::Collaborator(err) => Ok(err),
            other => Err(other),
        }
    }
}

/// Result type for command pipeline operations.
pub type Result<T> = std::result::Result<T, CommandError>;
