//! Blank canvas creation.

use tracing::{error, info};

use crate::document::DocumentSpec;
use crate::host::{DocumentId, Host, HostError};
use crate::notify::Notifier;

pub const CANVAS_COMMAND_NAME: &str = "Create Favicon Canvas";

/// Create a blank document and make it active.
///
/// Failures are logged and shown as a single alert, then returned.
pub async fn create_canvas(
    host: &dyn Host,
    notifier: &dyn Notifier,
    spec: &DocumentSpec,
) -> Result<DocumentId, HostError> {
    let result = async {
        let scope = host.acquire_modal(CANVAS_COMMAND_NAME).await?;
        host.create_document(&scope, spec).await
    }
    .await;

    match result {
        Ok(id) => {
            info!(document = %id, "Canvas created successfully");
            Ok(id)
        }
        Err(err) => {
            error!(error = %err, "Failed to create canvas");
            notifier.show_alert(&format!("Failed to create canvas: {err}"));
            Err(err)
        }
    }
}
