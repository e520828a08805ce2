use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Host {
    pub id: Uuid,
    pub event_id: Uuid,
    pub username: String,
}

impl Host {
    /// Plain comparison; the username is a shared secret, not a credential.
    pub fn matches(&self, username: &str) -> bool {
        self.username == username
    }
}

#[derive(Debug, Deserialize)]
pub struct HostRequest {
    pub username: String,
}
