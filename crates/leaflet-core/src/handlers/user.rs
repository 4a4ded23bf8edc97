use std::sync::atomic::{AtomicBool, Ordering};

use super::Response;
use crate::db::DocumentStore;
use crate::models::Session;
use crate::sync::{CloudExchange, SyncDirection, SyncEngine};

/// Handles `user - get` and `user - sync`
pub struct UserController<C> {
    store: DocumentStore,
    session: Session,
    cloud: Option<C>,
    syncing: AtomicBool,
}

/// Clears the in-flight flag however the cycle ends
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: CloudExchange> UserController<C> {
    pub const fn new(store: DocumentStore, session: Session, cloud: Option<C>) -> Self {
        Self {
            store,
            session,
            cloud,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn get(&self) -> Response {
        Response::User {
            user: self.session.user().cloned(),
        }
    }

    /// Run one sync cycle. A request arriving while another cycle is in
    /// flight is answered with a failure instead of starting a second one.
    pub async fn sync(&self, direction: SyncDirection) -> Response {
        let Some(cloud) = &self.cloud else {
            return sync_failed("sync is not configured".to_string());
        };

        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Sync requested while another sync is running");
            return sync_failed("sync already in progress".to_string());
        }
        let _guard = SyncGuard(&self.syncing);

        match SyncEngine::new(&self.store, cloud).sync(direction).await {
            Ok(report) => Response::SyncFinished {
                result: true,
                data: Some(report),
                error: None,
            },
            Err(error) => {
                tracing::error!("Sync failed: {error}");
                sync_failed(error.to_string())
            }
        }
    }
}

fn sync_failed(error: String) -> Response {
    Response::SyncFinished {
        result: false,
        data: None,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::models::User;
    use crate::sync::{InboundDelta, SyncRequest};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct SlowCloud {
        fail: bool,
    }

    impl CloudExchange for SlowCloud {
        async fn exchange(&self, _request: SyncRequest) -> Result<InboundDelta> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.fail {
                return Err(Error::Sync("offline".into()));
            }
            Ok(InboundDelta::default())
        }
    }

    async fn controller(cloud: Option<SlowCloud>) -> UserController<SlowCloud> {
        let store = DocumentStore::open_in_memory().await.unwrap();
        let session = Session::signed_in(User {
            id: "u1".into(),
            name: Some("Ada".into()),
            email: None,
        });
        UserController::new(store, session, cloud)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn get_returns_signed_in_user() {
        let user = controller(None).await;
        let Response::User { user: Some(found) } = user.get() else {
            panic!("expected user");
        };
        assert_eq!(found.id, "u1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sync_without_remote_fails_softly() {
        let user = controller(None).await;
        assert_eq!(
            user.sync(SyncDirection::Both).await,
            sync_failed("sync is not configured".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_sync_is_rejected() {
        let user = controller(Some(SlowCloud { fail: false })).await;

        let (first, second) = tokio::join!(
            user.sync(SyncDirection::Both),
            user.sync(SyncDirection::Both)
        );

        assert!(first.is_success());
        assert_eq!(
            second,
            sync_failed("sync already in progress".to_string())
        );

        // The flag is cleared once the first cycle ends.
        assert!(user.sync(SyncDirection::Pull).await.is_success());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_sync_reports_error_and_releases_guard() {
        let user = controller(Some(SlowCloud { fail: true })).await;

        let response = user.sync(SyncDirection::Both).await;
        let Response::SyncFinished {
            result: false,
            error: Some(error),
            ..
        } = response.clone()
        else {
            panic!("unexpected response: {response:?}");
        };
        assert!(error.contains("offline"));
        assert!(!user.syncing.load(Ordering::Acquire));
    }
}
