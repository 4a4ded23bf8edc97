use leaflet_core::handlers::{Request, Response};
use leaflet_core::sync::SyncDirection;

use crate::commands::common::AppContext;
use crate::error::CliError;

pub async fn run_sync(direction: SyncDirection, app: &AppContext) -> Result<(), CliError> {
    if !app.is_sync_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    match app.dispatch(Request::Sync { direction }).await? {
        Response::SyncFinished {
            result: true,
            data: Some(report),
            ..
        } => {
            println!(
                "Sync completed: pushed {}, inserted {}, updated {}, skipped {}",
                report.pushed, report.applied.inserted, report.applied.updated, report.applied.skipped
            );
            Ok(())
        }
        Response::SyncFinished { error, .. } => Err(CliError::Request {
            event: "user - sync".to_string(),
            error: error.unwrap_or_default(),
        }),
        _ => Ok(()),
    }
}
