//! Guest self-service lookup and update, addressed by event slug and guest name.
//!
//! A guest that does not exist is reported in a 200 body with a `response`
//! sentinel rather than as an HTTP error; the check-in front-end relies on it.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::models::event::Event;
use crate::models::guest::{GuestPatch, GuestResponse};

use super::extract::JsonOrForm;
use super::roster::find_event;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/guest", get(lookup_guest).patch(update_guest))
}

#[derive(Debug, Deserialize)]
struct GuestQuery {
    #[serde(rename = "eventName")]
    event_name: Option<String>,
    #[serde(rename = "guestName")]
    guest_name: Option<String>,
}

impl GuestQuery {
    fn require(self) -> Result<(String, String), AppError> {
        match (self.event_name, self.guest_name) {
            (Some(event), Some(guest)) if !event.is_empty() && !guest.is_empty() => {
                Ok((event, guest))
            }
            _ => Err(AppError::MissingParameter("eventName and guestName")),
        }
    }
}

#[derive(Debug, Serialize)]
struct GuestWithSentinel {
    #[serde(flatten)]
    guest: GuestResponse,
    response: &'static str,
}

async fn resolve(state: &AppState, query: GuestQuery) -> Result<(Event, String), AppError> {
    let (event_name, guest_name) = query.require()?;
    let event = find_event(state, &event_name).await?;
    Ok((event, guest_name))
}

async fn lookup_guest(
    State(state): State<AppState>,
    Query(query): Query<GuestQuery>,
) -> Result<Response, AppError> {
    let (event, guest_name) = resolve(&state, query).await?;

    let Some(guest) = state.store.guest_by_name(event.id, &guest_name).await? else {
        return Ok(Json(json!({
            "name": "",
            "invitations": "",
            "extraGuests": "",
            "assists": "",
            "response": "404",
            "message": "Guest not found or the name is misspelled",
        }))
        .into_response());
    };

    Ok(Json(GuestWithSentinel {
        guest: guest.into(),
        response: "ok",
    })
    .into_response())
}

async fn update_guest(
    State(state): State<AppState>,
    Query(query): Query<GuestQuery>,
    body: Result<JsonOrForm<GuestPatch>, AppError>,
) -> Result<Response, AppError> {
    let (event, guest_name) = resolve(&state, query).await?;
    let JsonOrForm(patch) = body?;
    let patch = patch.validated()?;

    let Some(guest) = state
        .store
        .patch_guest(event.id, &guest_name, &patch)
        .await?
    else {
        return Ok(Json(json!({
            "message": "guest not updated",
            "response": "200",
        }))
        .into_response());
    };

    tracing::info!(event_id = %event.id, guest = %guest.name, "guest updated");
    Ok(Json(GuestWithSentinel {
        guest: guest.into(),
        response: "202",
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(event: Option<&str>, guest: Option<&str>) -> GuestQuery {
        GuestQuery {
            event_name: event.map(Into::into),
            guest_name: guest.map(Into::into),
        }
    }

    #[test]
    fn both_parameters_are_required_and_non_empty() {
        assert!(query(Some("boda"), Some("Ana")).require().is_ok());
        for q in [
            query(None, Some("Ana")),
            query(Some("boda"), None),
            query(Some(""), Some("Ana")),
            query(Some("boda"), Some("")),
        ] {
            assert!(matches!(q.require(), Err(AppError::MissingParameter(_))));
        }
    }
}
