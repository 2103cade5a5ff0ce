//! notarun - concurrent macOS notarization
//!
//! Submits artifacts to the notarization service, polls until each request
//! reaches a verdict, fails items whose log lists unsuppressed issues, and
//! staples tickets onto the ones that passed.

pub mod config;
pub mod error;
pub mod issues;
pub mod logs;
pub mod notarize;
pub mod notary;
pub mod staple;
pub mod types;
