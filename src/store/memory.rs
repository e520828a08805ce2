use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::{Event, NewEvent};
use crate::models::guest::{Guest, GuestFields, GuestFilter, GuestPage, GuestPatch};
use crate::models::host::Host;

use super::{Upserted, DUPLICATE_EVENT, DUPLICATE_GUEST};

/// Process-local store with the same key constraints as the Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    events: Vec<Event>,
    hosts: Vec<Host>,
    guests: Vec<Guest>,
}

impl Tables {
    fn name_taken(&self, event_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.guests
            .iter()
            .any(|g| g.event_id == event_id && g.name == name && Some(g.id) != except)
    }

    fn contains(&self, event_id: Uuid, id: Uuid) -> bool {
        self.guests
            .iter()
            .any(|g| g.event_id == event_id && g.id == id)
    }

    fn guest_mut(&mut self, event_id: Uuid, id: Uuid) -> Option<&mut Guest> {
        self.guests
            .iter_mut()
            .find(|g| g.event_id == event_id && g.id == id)
    }
}

fn new_guest(event_id: Uuid, fields: &GuestFields) -> Guest {
    let now = Utc::now();
    Guest {
        id: Uuid::new_v4(),
        event_id,
        name: fields.name.clone(),
        cellphone: fields.cellphone.clone(),
        invitations: fields.invitations,
        assists: fields.assists,
        extra_guests: fields.extra_guests.clone(),
        table_number: fields.table_number,
        created_at: now,
        updated_at: now,
    }
}

fn overwrite(guest: &mut Guest, fields: &GuestFields) {
    guest.name = fields.name.clone();
    guest.cellphone = fields.cellphone.clone();
    guest.invitations = fields.invitations;
    guest.assists = fields.assists;
    guest.extra_guests = fields.extra_guests.clone();
    guest.table_number = fields.table_number;
    guest.updated_at = Utc::now();
}

fn sort_guests(guests: &mut [Guest]) {
    guests.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Events ---

    pub async fn create_event(&self, new: &NewEvent) -> Result<Event, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .events
            .iter()
            .any(|e| e.event_name_id == new.event_name_id)
        {
            return Err(AppError::Conflict(DUPLICATE_EVENT.into()));
        }

        let event = Event {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            date: new.date,
            place: new.place.clone(),
            event_name_id: new.event_name_id.clone(),
            host_link_invitation: None,
            invitation_link: None,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let mut events = self.tables.read().await.events.clone();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
        Ok(events)
    }

    pub async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    pub async fn event_by_name_id(&self, event_name_id: &str) -> Result<Option<Event>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .find(|e| e.event_name_id == event_name_id)
            .cloned())
    }

    pub async fn set_host_link(&self, id: Uuid, link: &str) -> Result<Option<Event>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.iter_mut().find(|e| e.id == id).map(|e| {
            e.host_link_invitation = Some(link.to_string());
            e.clone()
        }))
    }

    pub async fn set_invitation_link(
        &self,
        id: Uuid,
        link: &str,
    ) -> Result<Option<Event>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.iter_mut().find(|e| e.id == id).map(|e| {
            e.invitation_link = Some(link.to_string());
            e.clone()
        }))
    }

    // --- Hosts ---

    pub async fn set_host(&self, event_id: Uuid, username: &str) -> Result<Host, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(host) = tables.hosts.iter_mut().find(|h| h.event_id == event_id) {
            host.username = username.to_string();
            return Ok(host.clone());
        }

        let host = Host {
            id: Uuid::new_v4(),
            event_id,
            username: username.to_string(),
        };
        tables.hosts.push(host.clone());
        Ok(host)
    }

    pub async fn host_for_event(&self, event_id: Uuid) -> Result<Option<Host>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.hosts.iter().find(|h| h.event_id == event_id).cloned())
    }

    // --- Guests ---

    pub async fn upsert_guest(
        &self,
        event_id: Uuid,
        fields: &GuestFields,
    ) -> Result<Upserted, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(guest) = tables
            .guests
            .iter_mut()
            .find(|g| g.event_id == event_id && g.name == fields.name)
        {
            overwrite(guest, fields);
            return Ok(Upserted {
                guest: guest.clone(),
                created: false,
            });
        }

        let guest = new_guest(event_id, fields);
        tables.guests.push(guest.clone());
        Ok(Upserted {
            guest,
            created: true,
        })
    }

    pub async fn insert_guest(&self, event_id: Uuid, fields: &GuestFields) -> Result<Guest, AppError> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(event_id, &fields.name, None) {
            return Err(AppError::Conflict(DUPLICATE_GUEST.into()));
        }

        let guest = new_guest(event_id, fields);
        tables.guests.push(guest.clone());
        Ok(guest)
    }

    pub async fn guest_by_name(&self, event_id: Uuid, name: &str) -> Result<Option<Guest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .guests
            .iter()
            .find(|g| g.event_id == event_id && g.name == name)
            .cloned())
    }

    pub async fn guest_by_id(&self, event_id: Uuid, id: Uuid) -> Result<Option<Guest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .guests
            .iter()
            .find(|g| g.event_id == event_id && g.id == id)
            .cloned())
    }

    pub async fn guests_for_event(&self, event_id: Uuid) -> Result<Vec<Guest>, AppError> {
        let tables = self.tables.read().await;
        let mut guests: Vec<Guest> = tables
            .guests
            .iter()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect();
        sort_guests(&mut guests);
        Ok(guests)
    }

    pub async fn replace_guest(
        &self,
        event_id: Uuid,
        id: Uuid,
        fields: &GuestFields,
    ) -> Result<Option<Guest>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.contains(event_id, id) && tables.name_taken(event_id, &fields.name, Some(id)) {
            return Err(AppError::Conflict(DUPLICATE_GUEST.into()));
        }

        Ok(tables.guest_mut(event_id, id).map(|guest| {
            overwrite(guest, fields);
            guest.clone()
        }))
    }

    pub async fn patch_guest(
        &self,
        event_id: Uuid,
        name: &str,
        patch: &GuestPatch,
    ) -> Result<Option<Guest>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables
            .guests
            .iter()
            .find(|g| g.event_id == event_id && g.name == name)
            .map(|g| g.id)
        else {
            return Ok(None);
        };

        if let Some(new_name) = &patch.name {
            if tables.name_taken(event_id, new_name, Some(id)) {
                return Err(AppError::Conflict(DUPLICATE_GUEST.into()));
            }
        }

        Ok(tables.guest_mut(event_id, id).map(|guest| {
            patch.apply(guest);
            guest.updated_at = Utc::now();
            guest.clone()
        }))
    }

    pub async fn delete_guest(&self, event_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.guests.len();
        tables
            .guests
            .retain(|g| !(g.event_id == event_id && g.id == id));
        Ok(tables.guests.len() < before)
    }

    pub async fn list_guests(&self, filter: &GuestFilter) -> Result<GuestPage, AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Guest> = tables
            .guests
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        sort_guests(&mut matching);

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(GuestPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> GuestFields {
        GuestFields {
            name: name.into(),
            invitations: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites() {
        let store = MemoryStore::new();
        let event_id = Uuid::new_v4();

        let first = store.upsert_guest(event_id, &fields("Ana")).await.unwrap();
        assert!(first.created);

        let mut changed = fields("Ana");
        changed.table_number = 7;
        let second = store.upsert_guest(event_id, &changed).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.guest.id, first.guest.id);
        assert_eq!(second.guest.table_number, 7);
    }

    #[tokio::test]
    async fn same_name_in_different_events_is_a_different_guest() {
        let store = MemoryStore::new();
        let a = store.upsert_guest(Uuid::new_v4(), &fields("Ana")).await.unwrap();
        let b = store.upsert_guest(Uuid::new_v4(), &fields("Ana")).await.unwrap();
        assert!(a.created && b.created);
        assert_ne!(a.guest.id, b.guest.id);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_name() {
        let store = MemoryStore::new();
        let event_id = Uuid::new_v4();
        store.insert_guest(event_id, &fields("Ana")).await.unwrap();
        let err = store.insert_guest(event_id, &fields("Ana")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn replace_and_patch_refuse_renaming_onto_existing_guest() {
        let store = MemoryStore::new();
        let event_id = Uuid::new_v4();
        store.insert_guest(event_id, &fields("Ana")).await.unwrap();
        let luis = store.insert_guest(event_id, &fields("Luis")).await.unwrap();

        let err = store
            .replace_guest(event_id, luis.id, &fields("Ana"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let patch = GuestPatch {
            name: Some("Ana".into()),
            ..Default::default()
        };
        let err = store.patch_guest(event_id, "Luis", &patch).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn replace_unknown_guest_is_none() {
        let store = MemoryStore::new();
        let result = store
            .replace_guest(Uuid::new_v4(), Uuid::new_v4(), &fields("Ana"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_guests_pages_in_name_order() {
        let store = MemoryStore::new();
        let event_id = Uuid::new_v4();
        for name in ["Carla", "Ana", "Beto"] {
            store.insert_guest(event_id, &fields(name)).await.unwrap();
        }

        let page = store
            .list_guests(&GuestFilter {
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        let names: Vec<_> = page.items.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Beto", "Carla"]);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_guest_was_removed() {
        let store = MemoryStore::new();
        let event_id = Uuid::new_v4();
        let ana = store.insert_guest(event_id, &fields("Ana")).await.unwrap();

        assert!(!store.delete_guest(Uuid::new_v4(), ana.id).await.unwrap());
        assert!(store.delete_guest(event_id, ana.id).await.unwrap());
        assert!(store.guest_by_id(event_id, ana.id).await.unwrap().is_none());
    }
}
