//! Per-record last-writer-wins decision

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::document::{document_id, Document, ID_FIELD};
use crate::db::{Collection, DocumentStore, Query, RemoveOptions, Update, UpdateOptions};
use crate::error::{Error, Result};
use crate::models::DocId;

/// What applying a remote record did locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reconcile {
    /// No local copy existed; inserted under the remote id
    Insert,
    /// Local copy replaced by the remote one
    Update,
    /// Local copy is newer; remote record ignored
    Skip,
}

/// Decide how to apply a remote record given the local copy's timestamp.
///
/// Ties go to the incoming record so re-applying the same delta is harmless.
pub const fn reconcile(local_stamp: Option<i64>, incoming_stamp: i64) -> Reconcile {
    match local_stamp {
        None => Reconcile::Insert,
        Some(local) if local > incoming_stamp => Reconcile::Skip,
        Some(_) => Reconcile::Update,
    }
}

/// Apply one remote document to `collection`.
///
/// `stamp_field` names the timestamp compared for last-writer-wins. When
/// `previous_id` is set and differs from the document's id, the remote has
/// re-keyed a record this client pushed and the local copy under the old id
/// moves to the new one. A local copy edited after the push is newer than
/// the remote record, so its body is kept under the new id and goes out on
/// the next push.
pub(crate) async fn apply_remote_document(
    store: &DocumentStore,
    collection: Collection,
    mut document: Document,
    stamp_field: &str,
    previous_id: Option<&DocId>,
) -> Result<Reconcile> {
    let id = document_id(&document)?
        .ok_or_else(|| Error::InvalidInput("remote record has no id".into()))?;
    let incoming = stamp_of(&document, stamp_field);

    if let Some(previous) = previous_id.filter(|previous| **previous != id) {
        let query = Query::by_id(previous);
        if let Some(mut local) = store.find_one(collection, &query).await? {
            let local_stamp = stamp_of(&local, stamp_field);
            if local_stamp > incoming {
                tracing::info!(
                    "Keeping local edit of {} record {previous} under {id} ({local_stamp} > {incoming})",
                    collection.table()
                );
                local.insert(ID_FIELD.to_string(), id.as_str().into());
                document = local;
            }
        }
        store
            .remove(collection, &query, RemoveOptions::default())
            .await?;
        tracing::debug!(
            "Re-keyed {} record {previous} -> {id}",
            collection.table()
        );
    }

    let existing = store.find_one(collection, &Query::by_id(&id)).await?;
    let local = existing.as_ref().map(|doc| stamp_of(doc, stamp_field));

    let decision = reconcile(local, incoming);
    match decision {
        Reconcile::Insert => {
            store.insert(collection, document).await?;
        }
        Reconcile::Update => {
            store
                .update(
                    collection,
                    &Query::by_id(&id),
                    Update::Replace(document),
                    UpdateOptions::default(),
                )
                .await?;
        }
        Reconcile::Skip => {
            tracing::warn!(
                "Skipped remote {} record {id}: local copy is newer ({} > {incoming})",
                collection.table(),
                local.unwrap_or_default()
            );
        }
    }
    Ok(decision)
}

fn stamp_of(document: &Document, stamp_field: &str) -> i64 {
    document
        .get(stamp_field)
        .and_then(Value::as_i64)
        .unwrap_or_default()
}
