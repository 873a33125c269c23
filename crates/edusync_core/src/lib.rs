pub mod committer;
pub mod controller;
pub mod domain;
pub mod ports;
pub mod validate;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testsupport;

pub use committer::{CommitError, OnboardingCommitter};
pub use controller::{ControllerError, OnboardingController};
pub use domain::{
    AuthSession, CommitResult, EmailAddError, Invitation, LogoAsset, OnboardingRecord, Principal,
    Profile, School, StepPatch, UserCredentials,
};
pub use ports::{
    AssetStore, CredentialStore, InvitationSender, PortError, PortResult, SchoolDirectory,
    SchoolSession,
};
pub use validate::{check_logo_file, StepValidation};
pub use wizard::{TransitionError, WizardSession, WizardStep, TOTAL_STEPS};
