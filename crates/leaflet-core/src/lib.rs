//! leaflet-core - Core library for Leaflet
//!
//! This crate contains the entity models, the embedded document store, the
//! two-way sync engine and the request handlers shared by every Leaflet
//! front end.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod sync;
pub mod util;

pub use db::{Database, DocumentStore};
pub use error::{Error, Result};
pub use models::{Collaborator, DocId, Folder, Note, Session};
