//! Signed-in user context

use serde::{Deserialize, Serialize};

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Actor context passed to every operation that needs to know who is acting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// Session with nobody signed in
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    pub const fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Id recorded as author/owner on writes, if anyone is signed in
    pub fn actor_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }
}
