//! crates/edusync_core/src/wizard.rs
//!
//! The onboarding wizard's step identities and the finite-state sequencer that
//! moves one record through them. Transitions are synchronous and mutate only
//! the session-local record; the remote commit lives in `committer`.

use serde::Serialize;

use crate::domain::{OnboardingRecord, StepPatch};
use crate::validate::{self, StepValidation};

/// Total number of steps in the wizard (7 data-entry/review steps + success).
pub const TOTAL_STEPS: u8 = 8;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 8;

/// The eight steps of the onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SchoolName,
    SchoolAddress,
    UnhcrStatus,
    SchoolLogo,
    PrincipalInfo,
    InviteTeachers,
    Review,
    Success,
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::SchoolName
    }
}

impl WizardStep {
    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::SchoolName),
            2 => Some(Self::SchoolAddress),
            3 => Some(Self::UnhcrStatus),
            4 => Some(Self::SchoolLogo),
            5 => Some(Self::PrincipalInfo),
            6 => Some(Self::InviteTeachers),
            7 => Some(Self::Review),
            8 => Some(Self::Success),
            _ => None,
        }
    }

    /// Convert to a 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::SchoolName => 1,
            Self::SchoolAddress => 2,
            Self::UnhcrStatus => 3,
            Self::SchoolLogo => 4,
            Self::PrincipalInfo => 5,
            Self::InviteTeachers => 6,
            Self::Review => 7,
            Self::Success => 8,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::SchoolName => "School Name",
            Self::SchoolAddress => "School Address",
            Self::UnhcrStatus => "UNHCR Status",
            Self::SchoolLogo => "School Logo",
            Self::PrincipalInfo => "Principal Info",
            Self::InviteTeachers => "Invite Teachers",
            Self::Review => "Review",
            Self::Success => "Success",
        }
    }

    /// Steps that may be skipped without passing their validator.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            Self::SchoolAddress | Self::SchoolLogo | Self::InviteTeachers
        )
    }
}

/// Why a requested transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The current step's validator failed; carries the field errors.
    #[error("Current step input is invalid")]
    Invalid(StepValidation),
    /// `next()` was called on the review step; step 8 is only reachable
    /// through a successful commit.
    #[error("The review step is completed by committing, not by advancing")]
    ReviewRequiresCommit,
    /// `skip()` was called on a step that is not optional.
    #[error("This step cannot be skipped")]
    NotSkippable,
    /// The wizard has already reached its success step.
    #[error("The wizard has already finished")]
    Terminal,
}

/// One onboarding attempt: the current step plus the record it accumulates.
///
/// Created when the wizard mounts, dropped when the user leaves or finishes.
/// Nothing here is persisted across restarts.
#[derive(Debug, Default)]
pub struct WizardSession {
    current: WizardStep,
    record: OnboardingRecord,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn record(&self) -> &OnboardingRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut OnboardingRecord {
        &mut self.record
    }

    pub fn is_terminal(&self) -> bool {
        self.current == WizardStep::Success
    }

    /// Progress through the wizard as a whole percentage, shown for steps 1-7.
    pub fn progress_percent(&self) -> u8 {
        (f64::from(self.current.number()) / f64::from(TOTAL_STEPS) * 100.0).round() as u8
    }

    /// Validates the current step's slice of the record.
    pub fn validate_current(&self) -> StepValidation {
        validate::validate_step(self.current, &self.record)
    }

    /// Advances one step if the current step's validator passes.
    ///
    /// The review step never advances this way; completing the wizard goes
    /// through the commit sequence.
    pub fn next(&mut self) -> Result<WizardStep, TransitionError> {
        match self.current {
            WizardStep::Success => return Err(TransitionError::Terminal),
            WizardStep::Review => return Err(TransitionError::ReviewRequiresCommit),
            _ => {}
        }
        let validation = self.validate_current();
        if !validation.valid {
            return Err(TransitionError::Invalid(validation));
        }
        self.current = WizardStep::from_number(self.current.number() + 1)
            .unwrap_or(WizardStep::Review);
        Ok(self.current)
    }

    /// Moves one step backward. A no-op on the first step and on the success
    /// step; returns whether the index actually moved.
    pub fn back(&mut self) -> bool {
        let n = self.current.number();
        if n <= MIN_STEP || n >= MAX_STEP {
            return false;
        }
        // n is in 2..=7 here, so the predecessor always exists.
        self.current = WizardStep::from_number(n - 1).unwrap_or(WizardStep::SchoolName);
        true
    }

    /// Skips an optional step, force-writing that step's empty default into
    /// the record and advancing without validation.
    pub fn skip(&mut self) -> Result<WizardStep, TransitionError> {
        if self.current == WizardStep::Success {
            return Err(TransitionError::Terminal);
        }
        if !self.current.is_optional() {
            return Err(TransitionError::NotSkippable);
        }
        match self.current {
            WizardStep::SchoolAddress => self.record.apply(StepPatch::SchoolAddress(String::new())),
            WizardStep::SchoolLogo => self.record.apply(StepPatch::Logo(None)),
            WizardStep::InviteTeachers => self.record.clear_teacher_emails(),
            _ => unreachable!("only optional steps reach here"),
        }
        self.current = WizardStep::from_number(self.current.number() + 1)
            .unwrap_or(WizardStep::Review);
        Ok(self.current)
    }

    /// Enters the terminal success step. Only the controller calls this, and
    /// only after the commit sequence succeeded from the review step.
    pub(crate) fn enter_success(&mut self) -> Result<(), TransitionError> {
        if self.current != WizardStep::Review {
            return Err(TransitionError::ReviewRequiresCommit);
        }
        self.current = WizardStep::Success;
        Ok(())
    }
}

//=========================================================================================
// Tests
//=========================================================================================
