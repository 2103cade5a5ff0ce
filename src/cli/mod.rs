//! CLI command implementations

mod notarize;
mod progress;
mod style;

pub use notarize::run_notarize;
pub use progress::{CliProgress, status_prefixes};
