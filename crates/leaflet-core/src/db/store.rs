//! Embedded document store
//!
//! Each collection is a table of JSON documents keyed by `_id`. Queries are
//! conjunctions of null-safe equality and greater-than clauses on top-level
//! fields, evaluated in SQL through `json_extract`. Updates either replace a
//! document or set individual fields, optionally upserting.

use std::sync::Arc;

use libsql::Connection;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use super::document::{document_id, Document, ID_FIELD};
use super::Database;
use crate::error::{Error, Result};
use crate::models::DocId;

/// The store's collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Notes,
    Directory,
    Collaborators,
}

impl Collection {
    pub const fn table(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Directory => "directory",
            Self::Collaborators => "collaborators",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(Value),
    Gt(Value),
}

/// Conjunction of field predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    clauses: Vec<(String, Predicate)>,
}

impl Query {
    /// Match every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the document with the given identity
    pub fn by_id(id: &DocId) -> Self {
        Self::all().eq(ID_FIELD, id.as_str())
    }

    /// Null-safe equality: `null` matches a null or missing field
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.to_string(), Predicate::Eq(value.into())));
        self
    }

    #[must_use]
    pub fn gt(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses
            .push((field.to_string(), Predicate::Gt(value.into())));
        self
    }

    /// Fields pinned by equality clauses; seeds the document on `$set` upserts.
    fn equality_fields(&self) -> Document {
        self.clauses
            .iter()
            .filter_map(|(field, predicate)| match predicate {
                Predicate::Eq(value) if !(field == ID_FIELD && value.is_null()) => {
                    Some((field.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn to_sql(&self) -> Result<(String, Vec<libsql::Value>)> {
        if self.clauses.is_empty() {
            return Ok(("1".to_string(), Vec::new()));
        }

        let mut conditions = Vec::with_capacity(self.clauses.len());
        let mut params = Vec::with_capacity(self.clauses.len());
        for (field, predicate) in &self.clauses {
            let column = field_expression(field)?;
            let (operator, value) = match predicate {
                Predicate::Eq(value) => ("IS", value),
                Predicate::Gt(value) => (">", value),
            };
            conditions.push(format!("{column} {operator} ?"));
            params.push(to_sql_value(value)?);
        }

        Ok((conditions.join(" AND "), params))
    }
}

/// Update applied to matched documents
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Replace the whole document (its `_id` is kept)
    Replace(Document),
    /// Set the given top-level fields
    Set(Document),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert when nothing matches
    pub upsert: bool,
    /// Return the resulting documents
    pub return_updated_docs: bool,
    /// Update every match instead of the first one
    pub multi: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub num_affected: u64,
    pub affected_documents: Vec<Document>,
    /// Identity of the first affected (or upserted) document
    pub id: Option<DocId>,
    pub upserted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove every match instead of the first one
    pub multi: bool,
}

/// Shared handle to the document store.
///
/// Every operation holds the store lock for its whole duration, so individual
/// calls are atomic with respect to each other. Nothing spans calls.
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Mutex<Database>>,
}

impl DocumentStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open a file-backed store, creating parent directories as needed.
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(Database::open(path).await?))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().await
    }

    pub async fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>> {
        let db = self.lock().await;
        select(db.connection(), collection, query, None).await
    }

    pub async fn find_one(&self, collection: Collection, query: &Query) -> Result<Option<Document>> {
        let db = self.lock().await;
        let mut found = select(db.connection(), collection, query, Some(1)).await?;
        Ok(found.pop())
    }

    /// Insert a document, keeping its `_id` when present and assigning a new
    /// one otherwise.
    pub async fn insert(&self, collection: Collection, document: Document) -> Result<Document> {
        let db = self.lock().await;
        insert_row(db.connection(), collection, document).await
    }

    pub async fn update(
        &self,
        collection: Collection,
        query: &Query,
        update: Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let db = self.lock().await;
        let conn = db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;
        match update_rows(conn, collection, query, &update, options).await {
            Ok(outcome) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                tracing::debug!(
                    "Updated {} document(s) in {}",
                    outcome.num_affected,
                    collection.table()
                );
                Ok(outcome)
            }
            Err(e) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    pub async fn remove(
        &self,
        collection: Collection,
        query: &Query,
        options: RemoveOptions,
    ) -> Result<u64> {
        let (condition, params) = query.to_sql()?;
        let table = collection.table();
        let sql = if options.multi {
            format!("DELETE FROM {table} WHERE {condition}")
        } else {
            format!(
                "DELETE FROM {table} WHERE rowid IN (SELECT rowid FROM {table} WHERE {condition} ORDER BY rowid LIMIT 1)"
            )
        };

        let db = self.lock().await;
        let removed = db
            .connection()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        tracing::debug!("Removed {removed} document(s) from {table}");
        Ok(removed)
    }
}

async fn select(
    conn: &Connection,
    collection: Collection,
    query: &Query,
    limit: Option<usize>,
) -> Result<Vec<Document>> {
    let (condition, params) = query.to_sql()?;
    let mut sql = format!(
        "SELECT _id, doc FROM {} WHERE {condition} ORDER BY rowid",
        collection.table()
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next().await? {
        let id: String = row.get(0)?;
        let body: String = row.get(1)?;
        let mut document: Document = serde_json::from_str(&body)?;
        document.insert(ID_FIELD.to_string(), Value::String(id));
        documents.push(document);
    }
    Ok(documents)
}

async fn insert_row(
    conn: &Connection,
    collection: Collection,
    mut document: Document,
) -> Result<Document> {
    let id = document_id(&document)?.unwrap_or_else(DocId::generate);
    document.remove(ID_FIELD);
    let body = serde_json::to_string(&document)?;

    conn.execute(
        &format!("INSERT INTO {} (_id, doc) VALUES (?, ?)", collection.table()),
        [id.as_str(), body.as_str()],
    )
    .await?;

    document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok(document)
}

async fn write_row(conn: &Connection, collection: Collection, document: &Document) -> Result<()> {
    let id = document_id(document)?
        .ok_or_else(|| Error::Database("stored document lost its _id".into()))?;
    let mut body = document.clone();
    body.remove(ID_FIELD);
    let body = serde_json::to_string(&body)?;

    conn.execute(
        &format!("UPDATE {} SET doc = ? WHERE _id = ?", collection.table()),
        [body.as_str(), id.as_str()],
    )
    .await?;
    Ok(())
}

async fn update_rows(
    conn: &Connection,
    collection: Collection,
    query: &Query,
    update: &Update,
    options: UpdateOptions,
) -> Result<UpdateOutcome> {
    let limit = if options.multi { None } else { Some(1) };
    let matched = select(conn, collection, query, limit).await?;

    if matched.is_empty() {
        if !options.upsert {
            return Ok(UpdateOutcome::default());
        }

        let seed = match update {
            Update::Replace(document) => document.clone(),
            Update::Set(fields) => {
                let mut seed = query.equality_fields();
                seed.extend(fields.clone());
                seed
            }
        };
        let inserted = insert_row(conn, collection, seed).await?;
        return Ok(UpdateOutcome {
            num_affected: 1,
            id: document_id(&inserted)?,
            affected_documents: if options.return_updated_docs {
                vec![inserted]
            } else {
                Vec::new()
            },
            upserted: true,
        });
    }

    let mut outcome = UpdateOutcome::default();
    for existing in matched {
        let updated = apply_update(existing, update)?;
        write_row(conn, collection, &updated).await?;

        outcome.num_affected += 1;
        if outcome.id.is_none() {
            outcome.id = document_id(&updated)?;
        }
        if options.return_updated_docs {
            outcome.affected_documents.push(updated);
        }
    }
    Ok(outcome)
}

fn apply_update(existing: Document, update: &Update) -> Result<Document> {
    let id = existing
        .get(ID_FIELD)
        .cloned()
        .ok_or_else(|| Error::Database("stored document lost its _id".into()))?;

    let (mut result, changes) = match update {
        Update::Replace(replacement) => (Document::new(), replacement),
        Update::Set(fields) => (existing, fields),
    };

    for (field, value) in changes {
        if field == ID_FIELD {
            if value != &id {
                return Err(Error::InvalidInput(format!(
                    "cannot change a document's _id from {id} to {value}"
                )));
            }
            continue;
        }
        result.insert(field.clone(), value.clone());
    }
    result.insert(ID_FIELD.to_string(), id);
    Ok(result)
}

fn field_expression(field: &str) -> Result<String> {
    let mut chars = field.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::InvalidInput(format!("invalid query field: {field}")));
    }

    if field == ID_FIELD {
        Ok(ID_FIELD.to_string())
    } else {
        Ok(format!("json_extract(doc, '$.{field}')"))
    }
}

fn to_sql_value(value: &Value) -> Result<libsql::Value> {
    match value {
        Value::Null => Ok(libsql::Value::Null),
        Value::Bool(flag) => Ok(libsql::Value::Integer(i64::from(*flag))),
        Value::Number(number) => number
            .as_i64()
            .map(libsql::Value::Integer)
            .or_else(|| number.as_f64().map(libsql::Value::Real))
            .ok_or_else(|| Error::InvalidInput(format!("unsupported number: {number}"))),
        Value::String(text) => Ok(libsql::Value::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidInput(
            "queries only compare scalar values".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::document::into_document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn setup() -> DocumentStore {
        DocumentStore::open_in_memory().await.unwrap()
    }

    fn doc(value: Value) -> Document {
        into_document(value).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn insert_assigns_id_when_missing() {
        let store = setup().await;
        let inserted = store
            .insert(Collection::Notes, doc(json!({"title": "a"})))
            .await
            .unwrap();

        let id = document_id(&inserted).unwrap().unwrap();
        let found = store
            .find_one(Collection::Notes, &Query::by_id(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, inserted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn insert_keeps_given_id_and_rejects_duplicates() {
        let store = setup().await;
        let inserted = store
            .insert(Collection::Directory, doc(json!({"_id": "remote-1", "title": "x"})))
            .await
            .unwrap();
        assert_eq!(inserted["_id"], "remote-1");

        let duplicate = store
            .insert(Collection::Directory, doc(json!({"_id": "remote-1"})))
            .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn eq_null_matches_null_and_missing_fields() {
        let store = setup().await;
        store
            .insert(Collection::Notes, doc(json!({"title": "root-null", "folderId": null})))
            .await
            .unwrap();
        store
            .insert(Collection::Notes, doc(json!({"title": "root-missing"})))
            .await
            .unwrap();
        store
            .insert(Collection::Notes, doc(json!({"title": "nested", "folderId": "f1"})))
            .await
            .unwrap();

        let root = store
            .find(Collection::Notes, &Query::all().eq("folderId", Value::Null))
            .await
            .unwrap();
        let titles: Vec<_> = root.iter().map(|d| d["title"].clone()).collect();
        assert_eq!(titles, vec![json!("root-null"), json!("root-missing")]);

        let nested = store
            .find(Collection::Notes, &Query::all().eq("folderId", "f1"))
            .await
            .unwrap();
        assert_eq!(nested.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn gt_is_strict() {
        let store = setup().await;
        for stamp in [10, 20, 30] {
            store
                .insert(Collection::Notes, doc(json!({"dtModify": stamp})))
                .await
                .unwrap();
        }

        let newer = store
            .find(Collection::Notes, &Query::all().gt("dtModify", 20))
            .await
            .unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0]["dtModify"], 30);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_update_changes_only_given_fields() {
        let store = setup().await;
        let inserted = store
            .insert(Collection::Collaborators, doc(json!({"email": "a@x.io", "token": "t1"})))
            .await
            .unwrap();
        let id = document_id(&inserted).unwrap().unwrap();

        let outcome = store
            .update(
                Collection::Collaborators,
                &Query::by_id(&id),
                Update::Set(doc(json!({"token": "t2"}))),
                UpdateOptions {
                    return_updated_docs: true,
                    ..UpdateOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.num_affected, 1);
        assert!(!outcome.upserted);
        assert_eq!(outcome.id, Some(id));
        assert_eq!(outcome.affected_documents[0]["email"], "a@x.io");
        assert_eq!(outcome.affected_documents[0]["token"], "t2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_rejects_changing_id() {
        let store = setup().await;
        store
            .insert(Collection::Directory, doc(json!({"_id": "f1"})))
            .await
            .unwrap();

        let result = store
            .update(
                Collection::Directory,
                &Query::all(),
                Update::Replace(doc(json!({"_id": "f2"}))),
                UpdateOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_inserts_replacement_with_its_id() {
        let store = setup().await;
        let id: DocId = "remote-7".parse().unwrap();

        let outcome = store
            .update(
                Collection::Directory,
                &Query::by_id(&id),
                Update::Replace(doc(json!({"_id": "remote-7", "title": "Shared"}))),
                UpdateOptions {
                    upsert: true,
                    return_updated_docs: true,
                    ..UpdateOptions::default()
                },
            )
            .await
            .unwrap();

        assert!(outcome.upserted);
        assert_eq!(outcome.id, Some(id));
        assert_eq!(outcome.affected_documents[0]["title"], "Shared");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn set_upsert_seeds_from_query_equality() {
        let store = setup().await;
        let outcome = store
            .update(
                Collection::Collaborators,
                &Query::all().eq("folderId", "f1").eq("email", "a@x.io"),
                Update::Set(doc(json!({"token": "t"}))),
                UpdateOptions {
                    upsert: true,
                    return_updated_docs: true,
                    ..UpdateOptions::default()
                },
            )
            .await
            .unwrap();

        let stored = &outcome.affected_documents[0];
        assert_eq!(stored["folderId"], "f1");
        assert_eq!(stored["email"], "a@x.io");
        assert_eq!(stored["token"], "t");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_respects_multi_option() {
        let store = setup().await;
        for _ in 0..3 {
            store
                .insert(Collection::Notes, doc(json!({"folderId": "f1"})))
                .await
                .unwrap();
        }
        let query = Query::all().eq("folderId", "f1");

        let single = store
            .remove(Collection::Notes, &query, RemoveOptions::default())
            .await
            .unwrap();
        assert_eq!(single, 1);

        let rest = store
            .remove(Collection::Notes, &query, RemoveOptions { multi: true })
            .await
            .unwrap();
        assert_eq!(rest, 2);
        assert!(store.find(Collection::Notes, &query).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejects_unsafe_field_names() {
        let store = setup().await;
        let result = store
            .find(Collection::Notes, &Query::all().eq("title') OR 1=1 --", "x"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
