use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow)]
pub struct Guest {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub invitations: i32,
    pub assists: bool,
    pub extra_guests: String,
    pub table_number: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every writable guest column except the owning event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuestFields {
    pub name: String,
    pub cellphone: String,
    pub invitations: i32,
    pub assists: bool,
    pub extra_guests: String,
    pub table_number: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuestResponse {
    pub id: Uuid,
    pub name: String,
    pub cellphone: String,
    pub invitations: i32,
    pub assists: bool,
    #[serde(rename = "extraGuests")]
    pub extra_guests: String,
    pub table_number: i32,
}

impl From<Guest> for GuestResponse {
    fn from(g: Guest) -> Self {
        Self {
            id: g.id,
            name: g.name,
            cellphone: g.cellphone,
            invitations: g.invitations,
            assists: g.assists,
            extra_guests: g.extra_guests,
            table_number: g.table_number,
        }
    }
}

/// Manual add/edit form. Missing optional fields take the column defaults.
#[derive(Debug, Deserialize)]
pub struct GuestForm {
    pub name: String,
    #[serde(default)]
    pub cellphone: String,
    #[serde(default)]
    pub invitations: i32,
    #[serde(default)]
    pub assists: bool,
    #[serde(default, rename = "extraGuests", alias = "extra_guests")]
    pub extra_guests: String,
    #[serde(default)]
    pub table_number: i32,
}

impl GuestForm {
    pub fn into_fields(self) -> Result<GuestFields, AppError> {
        let name = validate_name(&self.name)?;
        validate_count("invitations", self.invitations)?;
        validate_count("table_number", self.table_number)?;

        Ok(GuestFields {
            name,
            cellphone: self.cellphone.trim().to_string(),
            invitations: self.invitations,
            assists: self.assists,
            extra_guests: self.extra_guests.trim().to_string(),
            table_number: self.table_number,
        })
    }
}

/// Partial update: only fields that are present change.
#[derive(Debug, Default, Deserialize)]
pub struct GuestPatch {
    pub name: Option<String>,
    pub cellphone: Option<String>,
    pub invitations: Option<i32>,
    pub assists: Option<bool>,
    #[serde(rename = "extraGuests", alias = "extra_guests")]
    pub extra_guests: Option<String>,
    pub table_number: Option<i32>,
}

impl GuestPatch {
    /// Trims the name and rejects values the guest columns would refuse.
    pub fn validated(mut self) -> Result<Self, AppError> {
        if let Some(name) = self.name.take() {
            self.name = Some(validate_name(&name)?);
        }
        if let Some(n) = self.invitations {
            validate_count("invitations", n)?;
        }
        if let Some(n) = self.table_number {
            validate_count("table_number", n)?;
        }
        Ok(self)
    }

    pub fn apply(&self, guest: &mut Guest) {
        if let Some(name) = &self.name {
            guest.name = name.clone();
        }
        if let Some(cellphone) = &self.cellphone {
            guest.cellphone = cellphone.clone();
        }
        if let Some(invitations) = self.invitations {
            guest.invitations = invitations;
        }
        if let Some(assists) = self.assists {
            guest.assists = assists;
        }
        if let Some(extra_guests) = &self.extra_guests {
            guest.extra_guests = extra_guests.clone();
        }
        if let Some(table_number) = self.table_number {
            guest.table_number = table_number;
        }
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    Ok(name.to_string())
}

fn validate_count(field: &str, value: i32) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::BadRequest(format!("{field} must be zero or greater")));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListGuestsParams {
    pub event: Option<Uuid>,
    pub assists: Option<bool>,
    pub q: Option<String>,
    pub page: Option<i64>,
}

/// Filter for the organizer-wide guest listing.
#[derive(Debug, Clone, Default)]
pub struct GuestFilter {
    pub event_id: Option<Uuid>,
    pub assists: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl GuestFilter {
    pub fn matches(&self, guest: &Guest) -> bool {
        self.event_id.is_none_or(|id| guest.event_id == id)
            && self.assists.is_none_or(|a| guest.assists == a)
            && self.search.as_deref().is_none_or(|q| {
                guest.name.to_lowercase().contains(&q.to_lowercase())
            })
    }
}

#[derive(Debug)]
pub struct GuestPage {
    pub items: Vec<Guest>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct GuestListResponse {
    pub items: Vec<GuestResponse>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> Guest {
        Guest {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "Ana".into(),
            cellphone: "555-1".into(),
            invitations: 2,
            assists: false,
            extra_guests: String::new(),
            table_number: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut g = guest();
        let patch = GuestPatch {
            assists: Some(true),
            extra_guests: Some("Luis".into()),
            ..Default::default()
        };
        patch.apply(&mut g);

        assert!(g.assists);
        assert_eq!(g.extra_guests, "Luis");
        assert_eq!(g.name, "Ana");
        assert_eq!(g.invitations, 2);
        assert_eq!(g.table_number, 3);
    }

    #[test]
    fn patch_rejects_negative_counts_and_blank_names() {
        let negative = GuestPatch {
            invitations: Some(-1),
            ..Default::default()
        };
        assert!(matches!(negative.validated(), Err(AppError::BadRequest(_))));

        let blank = GuestPatch {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.validated(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn patch_deserializes_camel_case_extra_guests() {
        let patch: GuestPatch =
            serde_json::from_str(r#"{"extraGuests": "Pedro", "table_number": 4}"#).unwrap();
        assert_eq!(patch.extra_guests.as_deref(), Some("Pedro"));
        assert_eq!(patch.table_number, Some(4));
        assert!(patch.name.is_none());
    }

    #[test]
    fn form_trims_and_defaults() {
        let form: GuestForm = serde_json::from_str(r#"{"name": "  Ana  "}"#).unwrap();
        let fields = form.into_fields().unwrap();
        assert_eq!(fields.name, "Ana");
        assert_eq!(fields.invitations, 0);
        assert!(!fields.assists);
    }

    #[test]
    fn response_uses_wire_field_names() {
        let value = serde_json::to_value(GuestResponse::from(guest())).unwrap();
        assert_eq!(value["extraGuests"], "");
        assert_eq!(value["table_number"], 3);
        assert!(value.get("extra_guests").is_none());
    }

    #[test]
    fn filter_matches_name_case_insensitively() {
        let g = guest();
        let filter = GuestFilter {
            search: Some("an".into()),
            assists: Some(false),
            ..Default::default()
        };
        assert!(filter.matches(&g));

        let other_event = GuestFilter {
            event_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!other_event.matches(&g));
    }

    #[test]
    fn filter_search_treats_wildcards_literally() {
        let g = guest();
        for q in ["%", "_", "A_a", "%na"] {
            let filter = GuestFilter {
                search: Some(q.into()),
                ..Default::default()
            };
            assert!(!filter.matches(&g), "{q} should not match Ana");
        }
    }
}
