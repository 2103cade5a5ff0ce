//! Single-shot submission

use crate::error::Result;
use crate::notarize::cancellable;
use crate::notary::NotaryService;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Submit one artifact, exactly once
///
/// Holds no state; serializing submissions is the caller's job.
pub async fn submit(
    service: &dyn NotaryService,
    file: &Path,
    bundle_id: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    match cancellable(cancel, service.submit(file, bundle_id)).await {
        Ok(request_id) => {
            info!(file = %file.display(), request_id, "notarization request submitted");
            Ok(request_id)
        }
        Err(e) => {
            warn!(file = %file.display(), error = %e, "notarization submission failed");
            Err(e)
        }
    }
}
