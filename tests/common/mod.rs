//! Common test utilities for notarun tests

pub mod fixtures;
pub mod mock_notary;

// Re-exports for convenience - not all test binaries use all exports
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_notary::{InfoStep, MockNotary, SubmitStep};
