use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::{Event, NewEvent};
use crate::models::guest::{Guest, GuestFields, GuestFilter, GuestPage, GuestPatch};
use crate::models::host::Host;

use super::{Upserted, DUPLICATE_EVENT, DUPLICATE_GUEST};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    guest: Guest,
    inserted: bool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<bool, AppError> {
        let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }

    // --- Events ---

    pub async fn create_event(&self, new: &NewEvent) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (name, date, place, event_name_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&new.name)
        .bind(new.date)
        .bind(&new.place)
        .bind(&new.event_name_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_EVENT))
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY date, name")
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    pub async fn event_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    pub async fn event_by_name_id(&self, event_name_id: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE event_name_id = $1")
            .bind(event_name_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    pub async fn set_host_link(&self, id: Uuid, link: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET host_link_invitation = $1 WHERE id = $2 RETURNING *",
        )
        .bind(link)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    pub async fn set_invitation_link(
        &self,
        id: Uuid,
        link: &str,
    ) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET invitation_link = $1 WHERE id = $2 RETURNING *",
        )
        .bind(link)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    // --- Hosts ---

    pub async fn set_host(&self, event_id: Uuid, username: &str) -> Result<Host, AppError> {
        let host = sqlx::query_as::<_, Host>(
            "INSERT INTO hosts (event_id, username) VALUES ($1, $2)
             ON CONFLICT (event_id) DO UPDATE SET username = EXCLUDED.username
             RETURNING id, event_id, username",
        )
        .bind(event_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(host)
    }

    pub async fn host_for_event(&self, event_id: Uuid) -> Result<Option<Host>, AppError> {
        let host = sqlx::query_as::<_, Host>(
            "SELECT id, event_id, username FROM hosts WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(host)
    }

    // --- Guests ---

    pub async fn upsert_guest(
        &self,
        event_id: Uuid,
        fields: &GuestFields,
    ) -> Result<Upserted, AppError> {
        // xmax is 0 only for rows this statement inserted
        let row = sqlx::query_as::<_, UpsertRow>(
            "INSERT INTO guests (event_id, name, cellphone, invitations, assists, extra_guests, table_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (event_id, name) DO UPDATE SET
               cellphone = EXCLUDED.cellphone,
               invitations = EXCLUDED.invitations,
               assists = EXCLUDED.assists,
               extra_guests = EXCLUDED.extra_guests,
               table_number = EXCLUDED.table_number,
               updated_at = NOW()
             RETURNING *, (xmax = 0) AS inserted",
        )
        .bind(event_id)
        .bind(&fields.name)
        .bind(&fields.cellphone)
        .bind(fields.invitations)
        .bind(fields.assists)
        .bind(&fields.extra_guests)
        .bind(fields.table_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(Upserted {
            guest: row.guest,
            created: row.inserted,
        })
    }

    pub async fn insert_guest(&self, event_id: Uuid, fields: &GuestFields) -> Result<Guest, AppError> {
        sqlx::query_as::<_, Guest>(
            "INSERT INTO guests (event_id, name, cellphone, invitations, assists, extra_guests, table_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(event_id)
        .bind(&fields.name)
        .bind(&fields.cellphone)
        .bind(fields.invitations)
        .bind(fields.assists)
        .bind(&fields.extra_guests)
        .bind(fields.table_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GUEST))
    }

    pub async fn guest_by_name(&self, event_id: Uuid, name: &str) -> Result<Option<Guest>, AppError> {
        let guest = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE event_id = $1 AND name = $2",
        )
        .bind(event_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guest)
    }

    pub async fn guest_by_id(&self, event_id: Uuid, id: Uuid) -> Result<Option<Guest>, AppError> {
        let guest = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE event_id = $1 AND id = $2",
        )
        .bind(event_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(guest)
    }

    pub async fn guests_for_event(&self, event_id: Uuid) -> Result<Vec<Guest>, AppError> {
        let guests = sqlx::query_as::<_, Guest>(
            "SELECT * FROM guests WHERE event_id = $1 ORDER BY name",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(guests)
    }

    pub async fn replace_guest(
        &self,
        event_id: Uuid,
        id: Uuid,
        fields: &GuestFields,
    ) -> Result<Option<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(
            "UPDATE guests SET
               name = $1, cellphone = $2, invitations = $3, assists = $4,
               extra_guests = $5, table_number = $6, updated_at = NOW()
             WHERE event_id = $7 AND id = $8
             RETURNING *",
        )
        .bind(&fields.name)
        .bind(&fields.cellphone)
        .bind(fields.invitations)
        .bind(fields.assists)
        .bind(&fields.extra_guests)
        .bind(fields.table_number)
        .bind(event_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GUEST))
    }

    pub async fn patch_guest(
        &self,
        event_id: Uuid,
        name: &str,
        patch: &GuestPatch,
    ) -> Result<Option<Guest>, AppError> {
        sqlx::query_as::<_, Guest>(
            "UPDATE guests SET
               name = COALESCE($1, name),
               cellphone = COALESCE($2, cellphone),
               invitations = COALESCE($3, invitations),
               assists = COALESCE($4, assists),
               extra_guests = COALESCE($5, extra_guests),
               table_number = COALESCE($6, table_number),
               updated_at = NOW()
             WHERE event_id = $7 AND name = $8
             RETURNING *",
        )
        .bind(&patch.name)
        .bind(&patch.cellphone)
        .bind(patch.invitations)
        .bind(patch.assists)
        .bind(&patch.extra_guests)
        .bind(patch.table_number)
        .bind(event_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, DUPLICATE_GUEST))
    }

    pub async fn delete_guest(&self, event_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM guests WHERE event_id = $1 AND id = $2")
            .bind(event_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_guests(&self, filter: &GuestFilter) -> Result<GuestPage, AppError> {
        const WHERE: &str = "($1::uuid IS NULL OR event_id = $1)
             AND ($2::bool IS NULL OR assists = $2)
             AND ($3::text IS NULL OR strpos(lower(name), lower($3)) > 0)";

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM guests WHERE {WHERE}"))
            .bind(filter.event_id)
            .bind(filter.assists)
            .bind(&filter.search)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Guest>(&format!(
            "SELECT * FROM guests WHERE {WHERE} ORDER BY name, id LIMIT $4 OFFSET $5"
        ))
        .bind(filter.event_id)
        .bind(filter.assists)
        .bind(&filter.search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(GuestPage { items, total })
    }
}
