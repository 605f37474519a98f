use std::time::Duration;

use thiserror::Error;

use crate::{controller::SubmissionState, types::FormField};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field {field} expects a {expected} value")]
    TypeMismatch {
        field: FormField,
        expected: &'static str,
    },
}

/// Fault raised by a collaborator call. The `Display` text is what ends up in
/// the `general` slot of the error report, so it is phrased for end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Unable to reach the server: {0}")]
    Transport(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("The server did not respond within {} seconds", .0.as_secs())]
    TimedOut(Duration),
    #[error("Unexpected response from the server: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("a submission is already in progress (state: {0:?})")]
    SubmissionInFlight(SubmissionState),
    #[error(transparent)]
    Field(#[from] FieldError),
}
