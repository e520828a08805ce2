//! Guest store: events, their single host and their guest rosters.
//!
//! Guests are keyed by `(event, name)`; both backends enforce that key.

pub mod memory;
pub mod postgres;

use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::models::event::{Event, NewEvent};
use crate::models::guest::{Guest, GuestFields, GuestFilter, GuestPage, GuestPatch};
use crate::models::host::Host;

pub(crate) const DUPLICATE_EVENT: &str = "Event name id already taken";
pub(crate) const DUPLICATE_GUEST: &str = "A guest with that name already exists for this event";

/// Result of an upsert keyed by `(event, name)`.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub guest: Guest,
    pub created: bool,
}

#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub async fn ping(&self) -> Result<bool, AppError> {
        match self {
            Self::Postgres(s) => s.ping().await,
            Self::Memory(_) => Ok(true),
        }
    }

    pub async fn create_event(&self, new: &NewEvent) -> Result<Event, AppError> {
        match self {
            Self::Postgres(s) => s.create_event(new).await,
            Self::Memory(s) => s.create_event(new).await,
        }
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        match self {
            Self::Postgres(s) => s.list_events().await,
            Self::Memory(s) => s.list_events().await,
        }
    }

    pub async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        match self {
            Self::Postgres(s) => s.event_by_id(id).await,
            Self::Memory(s) => s.event_by_id(id).await,
        }
    }

    pub async fn event_by_name_id(&self, event_name_id: &str) -> Result<Option<Event>, AppError> {
        match self {
            Self::Postgres(s) => s.event_by_name_id(event_name_id).await,
            Self::Memory(s) => s.event_by_name_id(event_name_id).await,
        }
    }

    pub async fn set_host_link(&self, id: Uuid, link: &str) -> Result<Option<Event>, AppError> {
        match self {
            Self::Postgres(s) => s.set_host_link(id, link).await,
            Self::Memory(s) => s.set_host_link(id, link).await,
        }
    }

    pub async fn set_invitation_link(
        &self,
        id: Uuid,
        link: &str,
    ) -> Result<Option<Event>, AppError> {
        match self {
            Self::Postgres(s) => s.set_invitation_link(id, link).await,
            Self::Memory(s) => s.set_invitation_link(id, link).await,
        }
    }

    pub async fn set_host(&self, event_id: Uuid, username: &str) -> Result<Host, AppError> {
        match self {
            Self::Postgres(s) => s.set_host(event_id, username).await,
            Self::Memory(s) => s.set_host(event_id, username).await,
        }
    }

    pub async fn host_for_event(&self, event_id: Uuid) -> Result<Option<Host>, AppError> {
        match self {
            Self::Postgres(s) => s.host_for_event(event_id).await,
            Self::Memory(s) => s.host_for_event(event_id).await,
        }
    }

    /// Creates the guest, or overwrites every non-key field of the existing one.
    pub async fn upsert_guest(
        &self,
        event_id: Uuid,
        fields: &GuestFields,
    ) -> Result<Upserted, AppError> {
        match self {
            Self::Postgres(s) => s.upsert_guest(event_id, fields).await,
            Self::Memory(s) => s.upsert_guest(event_id, fields).await,
        }
    }

    /// Fails with `Conflict` if the name is already on the event's roster.
    pub async fn insert_guest(&self, event_id: Uuid, fields: &GuestFields) -> Result<Guest, AppError> {
        match self {
            Self::Postgres(s) => s.insert_guest(event_id, fields).await,
            Self::Memory(s) => s.insert_guest(event_id, fields).await,
        }
    }

    pub async fn guest_by_name(&self, event_id: Uuid, name: &str) -> Result<Option<Guest>, AppError> {
        match self {
            Self::Postgres(s) => s.guest_by_name(event_id, name).await,
            Self::Memory(s) => s.guest_by_name(event_id, name).await,
        }
    }

    pub async fn guest_by_id(&self, event_id: Uuid, id: Uuid) -> Result<Option<Guest>, AppError> {
        match self {
            Self::Postgres(s) => s.guest_by_id(event_id, id).await,
            Self::Memory(s) => s.guest_by_id(event_id, id).await,
        }
    }

    pub async fn guests_for_event(&self, event_id: Uuid) -> Result<Vec<Guest>, AppError> {
        match self {
            Self::Postgres(s) => s.guests_for_event(event_id).await,
            Self::Memory(s) => s.guests_for_event(event_id).await,
        }
    }

    pub async fn replace_guest(
        &self,
        event_id: Uuid,
        id: Uuid,
        fields: &GuestFields,
    ) -> Result<Option<Guest>, AppError> {
        match self {
            Self::Postgres(s) => s.replace_guest(event_id, id, fields).await,
            Self::Memory(s) => s.replace_guest(event_id, id, fields).await,
        }
    }

    pub async fn patch_guest(
        &self,
        event_id: Uuid,
        name: &str,
        patch: &GuestPatch,
    ) -> Result<Option<Guest>, AppError> {
        match self {
            Self::Postgres(s) => s.patch_guest(event_id, name, patch).await,
            Self::Memory(s) => s.patch_guest(event_id, name, patch).await,
        }
    }

    pub async fn delete_guest(&self, event_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        match self {
            Self::Postgres(s) => s.delete_guest(event_id, id).await,
            Self::Memory(s) => s.delete_guest(event_id, id).await,
        }
    }

    pub async fn list_guests(&self, filter: &GuestFilter) -> Result<GuestPage, AppError> {
        match self {
            Self::Postgres(s) => s.list_guests(filter).await,
            Self::Memory(s) => s.list_guests(filter).await,
        }
    }
}
