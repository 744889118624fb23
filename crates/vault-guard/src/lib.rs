//! # vault-guard
//!
//! Protective policy layer for docvault: upload screening, rate limiting,
//! login lockout, the violation log and the background sweeper.
//!
//! Services are constructed explicitly and shared through `Arc`, so tests and
//! tenants get isolated instances.

pub mod login_guard;
pub mod policy;
pub mod rate_limit;
pub mod sweeper;
pub mod validator;
pub mod violations;

pub use login_guard::{LoginDecision, LoginGuard};
pub use policy::{validate_policy, PolicyHandle};
pub use rate_limit::{RateDecision, RateLimiter};
pub use sweeper::{SweepReport, Sweeper, SweeperHandle};
pub use validator::{Finding, SecurityValidator, ValidationOutcome};
pub use violations::ViolationRecorder;
