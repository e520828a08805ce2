use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::models::event::Event;
use crate::models::guest::{GuestForm, GuestResponse};
use crate::models::host::HostRequest;

use super::extract::JsonOrForm;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events/{event_name_id}", get(event_detail))
        .route("/api/events/{event_name_id}/login", post(login))
        .route("/api/events/{event_name_id}/guests", post(add_guest))
        .route(
            "/api/events/{event_name_id}/guests/{guest_id}",
            put(edit_guest).delete(delete_guest),
        )
}

pub(super) async fn find_event(state: &AppState, event_name_id: &str) -> Result<Event, AppError> {
    state
        .store
        .event_by_name_id(event_name_id)
        .await?
        .ok_or(AppError::EventNotFound)
}

async fn login(
    State(state): State<AppState>,
    Path(event_name_id): Path<String>,
    JsonOrForm(body): JsonOrForm<HostRequest>,
) -> Result<Json<Event>, AppError> {
    let event = find_event(&state, &event_name_id).await?;
    let host = state.store.host_for_event(event.id).await?;

    match host {
        Some(host) if host.matches(&body.username) => Ok(Json(event)),
        _ => Err(AppError::Unauthorized("Incorrect username".into())),
    }
}

#[derive(Debug, Serialize)]
struct EventDetailResponse {
    event: Event,
    guests: Vec<GuestResponse>,
    confirmed: usize,
}

async fn event_detail(
    State(state): State<AppState>,
    Path(event_name_id): Path<String>,
) -> Result<Json<EventDetailResponse>, AppError> {
    let event = find_event(&state, &event_name_id).await?;
    let guests = state.store.guests_for_event(event.id).await?;
    let confirmed = guests.iter().filter(|g| g.assists).count();

    Ok(Json(EventDetailResponse {
        event,
        guests: guests.into_iter().map(GuestResponse::from).collect(),
        confirmed,
    }))
}

async fn add_guest(
    State(state): State<AppState>,
    Path(event_name_id): Path<String>,
    JsonOrForm(form): JsonOrForm<GuestForm>,
) -> Result<(StatusCode, Json<GuestResponse>), AppError> {
    let event = find_event(&state, &event_name_id).await?;
    let fields = form.into_fields()?;
    let guest = state.store.insert_guest(event.id, &fields).await?;
    Ok((StatusCode::CREATED, Json(GuestResponse::from(guest))))
}

async fn edit_guest(
    State(state): State<AppState>,
    Path((event_name_id, guest_id)): Path<(String, Uuid)>,
    JsonOrForm(form): JsonOrForm<GuestForm>,
) -> Result<Json<GuestResponse>, AppError> {
    let event = find_event(&state, &event_name_id).await?;
    let fields = form.into_fields()?;
    let guest = state
        .store
        .replace_guest(event.id, guest_id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound("Guest not found".into()))?;
    Ok(Json(GuestResponse::from(guest)))
}

async fn delete_guest(
    State(state): State<AppState>,
    Path((event_name_id, guest_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let event = find_event(&state, &event_name_id).await?;
    if !state.store.delete_guest(event.id, guest_id).await? {
        return Err(AppError::NotFound("Guest not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
