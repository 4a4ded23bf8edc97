//! Two-way sync with the cloud copy.
//!
//! A cycle collects everything changed locally since the last push, hands it
//! to a [`CloudExchange`] together with the last pull watermark, and applies
//! what the remote sends back through each repository's last-writer-wins
//! path. Watermarks only move once the whole cycle has succeeded.

mod http;
pub mod reconcile;

use serde::{Deserialize, Serialize};

use crate::db::{
    CollaboratorRepository, DocumentStore, FolderRepository, NoteRepository, SyncStateRepository,
    Watermarks,
};
use crate::error::Result;
use crate::models::{Collaborator, DocId, Folder, Note};
use crate::util::Clock;

pub use http::{CloudError, HttpCloudClient};
pub use reconcile::{reconcile, Reconcile};

/// Which way a cycle moves data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    Push,
    Pull,
    #[default]
    Both,
}

impl SyncDirection {
    pub const fn pushes(self) -> bool {
        matches!(self, Self::Push | Self::Both)
    }

    pub const fn pulls(self) -> bool {
        matches!(self, Self::Pull | Self::Both)
    }
}

/// Records changed since a watermark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
}

impl Delta {
    pub fn len(&self) -> usize {
        self.notes.len() + self.folders.len() + self.collaborators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record sent by the remote.
///
/// `local_id` is set when the remote stored a record this client pushed under
/// a new identity; it names the identity the client used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<DocId>,
}

impl<T> Inbound<T> {
    pub const fn new(record: T) -> Self {
        Self {
            record,
            local_id: None,
        }
    }

    #[must_use]
    pub fn rekeyed_from(mut self, local_id: DocId) -> Self {
        self.local_id = Some(local_id);
        self
    }
}

/// Records the remote sends back in one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundDelta {
    #[serde(default)]
    pub notes: Vec<Inbound<Note>>,
    #[serde(default)]
    pub folders: Vec<Inbound<Folder>>,
    #[serde(default)]
    pub collaborators: Vec<Inbound<Collaborator>>,
}

impl Default for InboundDelta {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            folders: Vec::new(),
            collaborators: Vec::new(),
        }
    }
}

impl InboundDelta {
    pub fn len(&self) -> usize {
        self.notes.len() + self.folders.len() + self.collaborators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the client sends in one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub direction: SyncDirection,
    /// Last pull watermark: the remote should send what changed after it
    pub since: i64,
    pub changes: Delta,
}

/// Capability to exchange deltas with the remote copy
#[allow(async_fn_in_trait)]
pub trait CloudExchange {
    /// Send local changes and receive the remote's changes since
    /// `request.since`.
    async fn exchange(&self, request: SyncRequest) -> Result<InboundDelta>;
}

/// Per-decision counts from applying an inbound delta
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ApplyStats {
    fn record(&mut self, decision: Reconcile) {
        match decision {
            Reconcile::Insert => self.inserted += 1,
            Reconcile::Update => self.updated += 1,
            Reconcile::Skip => self.skipped += 1,
        }
    }
}

/// Outcome of a successful cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub pushed: usize,
    pub applied: ApplyStats,
    pub watermarks: Watermarks,
}

/// Runs sync cycles against one store and one remote
pub struct SyncEngine<'a, C> {
    store: &'a DocumentStore,
    cloud: &'a C,
}

impl<'a, C: CloudExchange> SyncEngine<'a, C> {
    pub const fn new(store: &'a DocumentStore, cloud: &'a C) -> Self {
        Self { store, cloud }
    }

    /// Local records changed strictly after `since`
    pub async fn collect_changes(&self, since: i64) -> Result<Delta> {
        Ok(Delta {
            notes: NoteRepository::new(self.store).get_updates(since).await?,
            folders: FolderRepository::new(self.store).get_updates(since).await?,
            collaborators: CollaboratorRepository::new(self.store)
                .prepare_updates(since)
                .await?,
        })
    }

    /// Apply remote records: folders first so re-keyed folders carry their
    /// notes along, then notes, then invitations.
    pub async fn apply_changes(&self, inbound: &InboundDelta) -> Result<ApplyStats> {
        let mut stats = ApplyStats::default();

        let folders = FolderRepository::new(self.store);
        for item in &inbound.folders {
            stats.record(folders.apply_remote(&item.record, item.local_id.as_ref()).await?);
        }

        let notes = NoteRepository::new(self.store);
        for item in &inbound.notes {
            stats.record(notes.apply_remote(&item.record, item.local_id.as_ref()).await?);
        }

        let collaborators = CollaboratorRepository::new(self.store);
        for item in &inbound.collaborators {
            stats.record(
                collaborators
                    .apply_remote(&item.record, item.local_id.as_ref())
                    .await?,
            );
        }

        Ok(stats)
    }

    /// Run one cycle.
    ///
    /// Watermarks advance to the time the cycle started, and only when every
    /// step succeeded. Local saves made while the exchange is in flight are
    /// stamped later than that and go out with the next cycle.
    pub async fn sync(&self, direction: SyncDirection) -> Result<SyncReport> {
        let state = SyncStateRepository::new(self.store);
        let marks = state.load().await?;
        let started_at = Clock::now();

        let changes = if direction.pushes() {
            self.collect_changes(marks.last_push_at).await?
        } else {
            Delta::default()
        };
        let pushed = changes.len();
        tracing::info!(
            "Sync ({direction:?}) started: {pushed} local change(s) since {}",
            marks.last_push_at
        );

        let inbound = self
            .cloud
            .exchange(SyncRequest {
                direction,
                since: marks.last_pull_at,
                changes,
            })
            .await?;

        let applied = if direction.pulls() {
            self.apply_changes(&inbound).await?
        } else {
            ApplyStats::default()
        };

        let mut next = marks;
        if direction.pushes() {
            next.last_push_at = started_at;
        }
        if direction.pulls() {
            next.last_pull_at = started_at;
        }
        state.save(&next).await?;

        tracing::info!(
            "Sync ({direction:?}) finished: pushed {pushed}, inserted {}, updated {}, skipped {}",
            applied.inserted,
            applied.updated,
            applied.skipped
        );
        Ok(SyncReport {
            direction,
            pushed,
            applied,
            watermarks: next,
        })
    }
}
