pub mod auth;
pub mod dashboard;
pub mod middleware;
pub mod onboarding;
pub mod state;

#[cfg(test)]
pub(crate) mod testsupport;

// Re-export the pieces the server binary wires together.
pub use dashboard::ApiDoc;
pub use middleware::require_auth;
