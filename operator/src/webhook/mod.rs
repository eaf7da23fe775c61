//! Admission-time defaulting for Head resources.
//!
//! Only the defaulting logic lives here; serving it over HTTPS is left to
//! the admission plumbing of the deployment.

pub mod head_defaulter;

pub use head_defaulter::{Defaulted, HeadDefaulter};
