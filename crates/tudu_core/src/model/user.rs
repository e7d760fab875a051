//! Authenticated principal as seen by the core.

use serde::{Deserialize, Serialize};

/// Opaque user id issued by the auth provider.
pub type UserId = String;

/// Authenticated user. Immutable from the core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}
