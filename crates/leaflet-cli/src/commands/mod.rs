pub mod common;
pub mod completions;
pub mod folder;
pub mod note;
pub mod serve;
pub mod sync;
