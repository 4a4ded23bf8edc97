//! Data models for Leaflet

mod collaborator;
mod folder;
mod id;
mod note;
mod session;

pub use collaborator::{Collaborator, CollaboratorDraft};
pub(crate) use collaborator::normalize_email;
pub use folder::{Folder, FolderDraft};
pub use id::DocId;
pub use note::{Note, NoteDraft};
pub use session::{Session, User};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` the same way as a missing field.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize an optional identity, treating `""` like `null` (root folder).
pub(crate) fn blank_id_as_none<'de, D>(deserializer: D) -> Result<Option<DocId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
