//! Sign-up form validation and the submission state machine that drives an
//! account from user input to creation.
//!
//! The crate has no opinion about presentation. A front end feeds field edits
//! into a [`SubmissionController`], calls [`SubmissionController::on_submit`],
//! and renders the resulting [`ErrorReport`] or success signal. The two network
//! calls behind a submission are reached only through the [`ExistsCheck`] and
//! [`CreateRecord`] traits; [`transport::HttpSignupBackend`] implements both
//! against the HTTP API.

pub mod controller;
pub mod error;
pub mod transport;
pub mod types;
pub mod validation;

pub use controller::{
    CreateOutcome, CreateRecord, EmailCheck, ExistsCheck, NewAccount, SubmissionController,
    SubmissionEvent, SubmissionState, SubmitOutcome, DEFAULT_CALL_TIMEOUT,
};
pub use error::{CollaboratorError, ControllerError, FieldError};
pub use types::{ErrorKey, ErrorReport, FieldValue, FormField, FormFields};
pub use validation::{validate_sign_in, ValidationPolicy, ValidationRuleSet};
