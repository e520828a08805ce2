use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::import::{self, ImportResponse};
use crate::models::event::{CreateEventRequest, Event, EventActionResponse, EventIdsRequest, NewEvent};
use crate::models::guest::{GuestFilter, GuestListResponse, GuestResponse, ListGuestsParams};
use crate::models::host::{Host, HostRequest};

const GUESTS_PER_PAGE: i64 = 25;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/admin/events/{id}/guests/import", post(import_guests))
        .route_layer(DefaultBodyLimit::max(max_upload_bytes))
        .route("/api/admin/events", post(create_event).get(list_events))
        .route("/api/admin/events/host-links", post(generate_host_links))
        .route("/api/admin/events/invitation-links", post(generate_invitation_links))
        .route("/api/admin/events/{id}/host", put(set_host))
        .route("/api/admin/events/{id}/guests", get(event_guests))
        .route("/api/admin/guests", get(list_guests))
}

/// Lowercase ASCII slug of `name` with a random suffix, e.g. `boda-ana-x7k2`.
fn generate_event_name_id(name: &str) -> String {
    let mut slug = String::new();
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.gen_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect();

    if slug.is_empty() {
        suffix
    } else {
        format!("{slug}-{suffix}")
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

async fn find_event(state: &AppState, id: Uuid) -> Result<Event, AppError> {
    state
        .store
        .event_by_id(id)
        .await?
        .ok_or(AppError::EventNotFound)
}

async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let name = required(&body.name, "name")?;
    let place = required(&body.place, "place")?;
    let event_name_id = match body.event_name_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate_event_name_id(&name),
    };

    let event = state
        .store
        .create_event(&NewEvent {
            name,
            date: body.date,
            place,
            event_name_id,
        })
        .await?;

    tracing::info!(event_name_id = %event.event_name_id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.store.list_events().await?))
}

async fn generate_host_links(
    State(state): State<AppState>,
    Json(body): Json<EventIdsRequest>,
) -> Result<Json<EventActionResponse>, AppError> {
    let mut events = Vec::with_capacity(body.ids.len());
    for id in body.ids {
        let Some(event) = state.store.event_by_id(id).await? else {
            continue;
        };
        let link = state.config.host_login_link(&event.event_name_id);
        if let Some(updated) = state.store.set_host_link(id, &link).await? {
            events.push(updated);
        }
    }

    Ok(Json(EventActionResponse {
        message: "Host links created",
        events,
    }))
}

async fn generate_invitation_links(
    State(state): State<AppState>,
    Json(body): Json<EventIdsRequest>,
) -> Result<Json<EventActionResponse>, AppError> {
    let mut events = Vec::with_capacity(body.ids.len());
    for id in body.ids {
        let Some(event) = state.store.event_by_id(id).await? else {
            continue;
        };
        let link = state.config.invitation_link(&event.event_name_id);
        if let Some(updated) = state.store.set_invitation_link(id, &link).await? {
            events.push(updated);
        }
    }

    Ok(Json(EventActionResponse {
        message: "Invitation links created",
        events,
    }))
}

async fn set_host(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<HostRequest>,
) -> Result<Json<Host>, AppError> {
    let event = find_event(&state, id).await?;
    let username = required(&body.username, "username")?;
    let host = state.store.set_host(event.id, &username).await?;
    Ok(Json(host))
}

#[derive(Debug, Serialize)]
struct EventGuestsResponse {
    event: Event,
    guests: Vec<GuestResponse>,
}

async fn event_guests(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventGuestsResponse>, AppError> {
    let event = find_event(&state, id).await?;
    let guests = state.store.guests_for_event(event.id).await?;
    Ok(Json(EventGuestsResponse {
        event,
        guests: guests.into_iter().map(GuestResponse::from).collect(),
    }))
}

async fn import_guests(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let event = find_event(&state, id).await?;

    let mut csv_file: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
    {
        if field.name() == Some("csv_file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;
            csv_file = Some(bytes.to_vec());
        }
    }

    let bytes = csv_file.ok_or_else(|| AppError::BadRequest("Invalid form".into()))?;

    match import::import_guests(&state.store, event.id, &bytes).await {
        Ok(outcome) => Ok(Json(ImportResponse::from(&outcome)).into_response()),
        Err(e) => {
            tracing::warn!(event_id = %event.id, "guest import rejected: {e}");
            Ok((StatusCode::BAD_REQUEST, Json(ImportResponse::file_error(&e))).into_response())
        }
    }
}

async fn list_guests(
    State(state): State<AppState>,
    Query(params): Query<ListGuestsParams>,
) -> Result<Json<GuestListResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(GUESTS_PER_PAGE)
        .ok_or_else(|| AppError::BadRequest("Page out of range".into()))?;
    let search = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());

    let filter = GuestFilter {
        event_id: params.event,
        assists: params.assists,
        search,
        limit: GUESTS_PER_PAGE,
        offset,
    };
    let result = state.store.list_guests(&filter).await?;

    Ok(Json(GuestListResponse {
        items: result.items.into_iter().map(GuestResponse::from).collect(),
        page,
        per_page: GUESTS_PER_PAGE,
        total: result.total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_event_name_id_is_a_slug_with_suffix() {
        let id = generate_event_name_id("  Boda de Ana & Luis! ");
        let (slug, suffix) = id.rsplit_once('-').unwrap();
        assert_eq!(slug, "boda-de-ana-luis");
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn name_without_ascii_letters_still_gets_an_id() {
        let id = generate_event_name_id("¡¡!!");
        assert_eq!(id.len(), 4);
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("  Salón  ", "place").unwrap(), "Salón");
        assert!(matches!(required("   ", "place"), Err(AppError::BadRequest(_))));
    }
}
