//! crates/edusync_core/src/controller.rs
//!
//! Wires the step sequencer and the committer together for one onboarding
//! attempt: owns the wizard session, the in-flight busy flag, and the single
//! visible commit error. The principal and the surrounding school session are
//! injected explicitly at construction.

use std::sync::Arc;

use crate::committer::{CommitError, OnboardingCommitter};
use crate::domain::{CommitResult, EmailAddError, Principal, StepPatch};
use crate::ports::SchoolSession;
use crate::validate::StepValidation;
use crate::wizard::{TransitionError, WizardSession, WizardStep};

/// Why a controller action was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("A commit is already in progress")]
    Busy,
    #[error("Onboarding has already finished")]
    Terminal,
    #[error("Completion is only available from the review step")]
    NotAtReview,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Email(#[from] EmailAddError),
    #[error("{0}")]
    Commit(String),
}

/// Drives one wizard session from first step through commit.
pub struct OnboardingController {
    principal: Principal,
    session: WizardSession,
    committer: OnboardingCommitter,
    school_session: Arc<dyn SchoolSession>,
    busy: bool,
    last_error: Option<String>,
}

impl OnboardingController {
    pub fn new(
        principal: Principal,
        committer: OnboardingCommitter,
        school_session: Arc<dyn SchoolSession>,
    ) -> Self {
        Self {
            principal,
            session: WizardSession::new(),
            committer,
            school_session,
            busy: false,
            last_error: None,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn current_step(&self) -> WizardStep {
        self.session.current()
    }

    pub fn progress_percent(&self) -> u8 {
        self.session.progress_percent()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The one visible commit error, replaced on every retry.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn guard_mutable(&self) -> Result<(), ControllerError> {
        if self.busy {
            return Err(ControllerError::Busy);
        }
        if self.session.is_terminal() {
            return Err(ControllerError::Terminal);
        }
        Ok(())
    }

    /// Applies a whole-field patch from the current step's form.
    pub fn patch(&mut self, patch: StepPatch) -> Result<(), ControllerError> {
        self.guard_mutable()?;
        self.session.record_mut().apply(patch);
        Ok(())
    }

    pub fn add_teacher_email(&mut self, email: &str) -> Result<(), ControllerError> {
        self.guard_mutable()?;
        self.session.record_mut().add_teacher_email(email)?;
        Ok(())
    }

    pub fn remove_teacher_email(&mut self, email: &str) -> Result<bool, ControllerError> {
        self.guard_mutable()?;
        Ok(self.session.record_mut().remove_teacher_email(email))
    }

    pub fn validate_current(&self) -> StepValidation {
        self.session.validate_current()
    }

    pub fn next(&mut self) -> Result<WizardStep, ControllerError> {
        self.guard_mutable()?;
        self.last_error = None;
        Ok(self.session.next()?)
    }

    /// Steps backward; a no-op on the first and success steps. Refused while a
    /// commit is in flight.
    pub fn back(&mut self) -> Result<bool, ControllerError> {
        if self.busy {
            return Err(ControllerError::Busy);
        }
        self.last_error = None;
        Ok(self.session.back())
    }

    pub fn skip(&mut self) -> Result<WizardStep, ControllerError> {
        self.guard_mutable()?;
        self.last_error = None;
        Ok(self.session.skip()?)
    }

    /// Runs the commit sequence from the review step.
    ///
    /// On success the commit result is handed to the school session and the
    /// wizard becomes terminal. On fatal failure the wizard stays on review
    /// with the stage's message stored for display, and the user may retry.
    /// Only one commit may be in flight per session.
    pub async fn complete(&mut self) -> Result<CommitResult, ControllerError> {
        if self.busy {
            return Err(ControllerError::Busy);
        }
        if self.session.is_terminal() {
            return Err(ControllerError::Terminal);
        }
        if self.session.current() != WizardStep::Review {
            return Err(ControllerError::NotAtReview);
        }

        self.busy = true;
        self.last_error = None;
        let outcome = self
            .committer
            .commit(&self.principal, self.session.record())
            .await;
        self.busy = false;

        match outcome {
            Ok(result) => {
                self.school_session.adopt(&result);
                // Infallible here: the step was checked above and nothing else
                // mutates it while busy.
                self.session
                    .enter_success()
                    .map_err(ControllerError::Transition)?;
                Ok(result)
            }
            Err(err) => {
                let message = commit_message(err);
                self.last_error = Some(message.clone());
                Err(ControllerError::Commit(message))
            }
        }
    }
}

fn commit_message(err: CommitError) -> String {
    err.to_string()
}

//=========================================================================================
// Tests
//=========================================================================================
