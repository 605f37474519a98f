use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::{CollaboratorError, ControllerError},
    types::{ErrorKey, ErrorReport, FieldValue, FormField, FormFields},
    validation::ValidationRuleSet,
};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const EMAIL_IN_USE_MESSAGE: &str = "Email is already in use";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create account";
pub const CANCELLED_MESSAGE: &str = "Submission was cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    CallingExists,
    CallingCreate,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SubmissionState::Validating
                | SubmissionState::CallingExists
                | SubmissionState::CallingCreate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCheck {
    pub email_exists: bool,
}

/// Settled result of the create call. A rejection is a business answer from
/// the collaborator; transport faults travel as [`CollaboratorError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Rejected { error: Option<String> },
}

/// Validated fields handed to the create collaborator. The password is in
/// cleartext; hashing happens on the other side of the boundary.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl From<&FormFields> for NewAccount {
    fn from(fields: &FormFields) -> Self {
        Self {
            first_name: fields.first_name.trim().to_string(),
            last_name: fields.last_name.trim().to_string(),
            email: fields.email.trim().to_string(),
            password: fields.password.clone(),
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait ExistsCheck: Send + Sync {
    async fn check_email(&self, email: &str) -> Result<EmailCheck, CollaboratorError>;
}

#[async_trait]
pub trait CreateRecord: Send + Sync {
    async fn create_record(&self, account: &NewAccount)
        -> Result<CreateOutcome, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    StateChanged(SubmissionState),
    Succeeded,
    Failed(ErrorReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed(ErrorReport),
}

struct ControllerState {
    fields: FormFields,
    errors: ErrorReport,
    state: SubmissionState,
}

/// Owns the sign-up form and runs one submission attempt at a time:
/// validate, check the email, then create the account.
///
/// All methods take `&self`. The state lock is never held across a
/// collaborator call, so field edits are accepted while a call is pending;
/// they land in the form but not in the attempt already under way.
///
/// Dropping an `on_submit` future before it settles ends the attempt as
/// `Failed` with a `general` cancellation message.
pub struct SubmissionController {
    rules: Arc<ValidationRuleSet>,
    exists_check: Arc<dyn ExistsCheck>,
    create_record: Arc<dyn CreateRecord>,
    call_timeout: Duration,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl SubmissionController {
    pub fn new(
        rules: Arc<ValidationRuleSet>,
        exists_check: Arc<dyn ExistsCheck>,
        create_record: Arc<dyn CreateRecord>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            rules,
            exists_check,
            create_record,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            inner: Mutex::new(ControllerState {
                fields: FormFields::default(),
                errors: ErrorReport::new(),
                state: SubmissionState::Idle,
            }),
            events,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SubmissionState {
        self.lock_state().state
    }

    pub async fn fields(&self) -> FormFields {
        self.lock_state().fields.clone()
    }

    pub async fn errors(&self) -> ErrorReport {
        self.lock_state().errors.clone()
    }

    /// Stores the new value and drops that field's error entry, if any. The
    /// rest of the report is left untouched until the next submit.
    pub async fn on_field_change(
        &self,
        field: FormField,
        value: impl Into<FieldValue>,
    ) -> Result<(), ControllerError> {
        let mut guard = self.lock_state();
        guard.fields.set(field, value.into())?;
        if guard.errors.clear(field) {
            debug!(field = field.as_str(), "cleared field error after edit");
        }
        Ok(())
    }

    pub async fn on_submit(&self) -> Result<SubmitOutcome, ControllerError> {
        let account = {
            let mut guard = self.lock_state();
            if guard.state.is_in_flight() {
                debug!(state = ?guard.state, "ignoring submit while attempt in flight");
                return Err(ControllerError::SubmissionInFlight(guard.state));
            }
            self.transition(&mut guard, SubmissionState::Validating);
            guard.errors = ErrorReport::new();

            let report = self.rules.validate(&guard.fields);
            if !report.is_empty() {
                debug!(fields = report.len(), "sign-up form failed validation");
                return Ok(self.fail_locked(&mut guard, report));
            }

            self.transition(&mut guard, SubmissionState::CallingExists);
            NewAccount::from(&guard.fields)
        };

        // Armed only once the state lock is released; its drop takes the lock.
        let attempt = AttemptGuard::arm(self);
        let outcome = self.call_collaborators(&account).await;
        attempt.disarm();
        Ok(outcome)
    }

    async fn call_collaborators(&self, account: &NewAccount) -> SubmitOutcome {
        match self
            .bounded(self.exists_check.check_email(&account.email))
            .await
        {
            Ok(EmailCheck { email_exists: true }) => {
                let mut report = ErrorReport::new();
                report.push(FormField::Email, EMAIL_IN_USE_MESSAGE);
                return self.fail(report);
            }
            Ok(EmailCheck {
                email_exists: false,
            }) => {}
            Err(err) => {
                warn!(%err, "email existence check failed; blocking account creation");
                return self.fail(ErrorReport::general(err.to_string()));
            }
        }

        {
            let mut guard = self.lock_state();
            self.transition(&mut guard, SubmissionState::CallingCreate);
        }

        match self
            .bounded(self.create_record.create_record(account))
            .await
        {
            Ok(CreateOutcome::Created) => self.succeed(),
            Ok(CreateOutcome::Rejected { error }) => {
                let message = error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| CREATE_FAILED_MESSAGE.to_string());
                warn!(%message, "account creation rejected");
                self.fail(ErrorReport::general(message))
            }
            Err(err) => {
                warn!(%err, "account creation call failed");
                self.fail(ErrorReport::general(err.to_string()))
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, CollaboratorError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or(Err(CollaboratorError::TimedOut(self.call_timeout)))
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn succeed(&self) -> SubmitOutcome {
        let mut guard = self.lock_state();
        guard.fields = FormFields::default();
        guard.errors = ErrorReport::new();
        self.transition(&mut guard, SubmissionState::Succeeded);
        info!("account created");
        let _ = self.events.send(SubmissionEvent::Succeeded);
        SubmitOutcome::Succeeded
    }

    fn fail(&self, report: ErrorReport) -> SubmitOutcome {
        let mut guard = self.lock_state();
        self.fail_locked(&mut guard, report)
    }

    fn fail_locked(&self, guard: &mut ControllerState, report: ErrorReport) -> SubmitOutcome {
        guard.errors = report.clone();
        self.transition(guard, SubmissionState::Failed);
        let keys: Vec<&str> = report.keys().map(ErrorKey::as_str).collect();
        debug!(?keys, "submission failed");
        let _ = self.events.send(SubmissionEvent::Failed(report.clone()));
        SubmitOutcome::Failed(report)
    }

    fn transition(&self, guard: &mut ControllerState, next: SubmissionState) {
        debug!(from = ?guard.state, to = ?next, "submission state transition");
        guard.state = next;
        let _ = self.events.send(SubmissionEvent::StateChanged(next));
    }
}

/// Ends an attempt whose `on_submit` future was dropped mid-call, so the
/// controller never stays in flight without a caller.
struct AttemptGuard<'a> {
    controller: &'a SubmissionController,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    fn arm(controller: &'a SubmissionController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = self.controller.lock_state();
        if guard.state.is_in_flight() {
            warn!(state = ?guard.state, "submission dropped before settling");
            self.controller
                .fail_locked(&mut guard, ErrorReport::general(CANCELLED_MESSAGE));
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
