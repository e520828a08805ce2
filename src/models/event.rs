use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub place: String,
    /// Public slug used by hosts and guests to reach the event.
    pub event_name_id: String,
    pub host_link_invitation: Option<String>,
    pub invitation_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: NaiveDate,
    pub place: String,
    pub event_name_id: Option<String>,
}

/// Validated input for a new event row.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub date: NaiveDate,
    pub place: String,
    pub event_name_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EventIdsRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct EventActionResponse {
    pub message: &'static str,
    pub events: Vec<Event>,
}
