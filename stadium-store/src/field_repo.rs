use async_trait::async_trait;
use sqlx::PgPool;
use stadium_core::field::{Field, FieldDraft, FieldRemoval, Image};
use stadium_core::repository::{FieldRepository, ImageRepository};
use stadium_core::CoreResult;

use crate::storage_error;

pub struct PgFieldRepository {
    pool: PgPool,
}

impl PgFieldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct FieldRow {
    id: i64,
    owner_id: Option<i64>,
    name: String,
    address: String,
    contact: String,
    hourly_rate: f64,
    latitude: f64,
    longitude: f64,
}

impl From<FieldRow> for Field {
    fn from(row: FieldRow) -> Self {
        Field {
            id: row.id,
            owner: row.owner_id,
            name: row.name,
            address: row.address,
            contact: row.contact,
            hourly_rate: row.hourly_rate,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

const FIELD_COLUMNS: &str =
    "id, owner_id, name, address, contact, hourly_rate::FLOAT8 AS hourly_rate, latitude, longitude";

#[async_trait]
impl FieldRepository for PgFieldRepository {
    async fn create_field(&self, owner: Option<i64>, draft: &FieldDraft) -> CoreResult<Field> {
        let row = sqlx::query_as::<_, FieldRow>(&format!(
            r#"
            INSERT INTO fields (owner_id, name, address, contact, hourly_rate, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5::NUMERIC(6, 2), $6, $7)
            RETURNING {}
            "#,
            FIELD_COLUMNS
        ))
        .bind(owner)
        .bind(&draft.name)
        .bind(&draft.address)
        .bind(&draft.contact)
        .bind(draft.hourly_rate)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn get_field(&self, id: i64) -> CoreResult<Option<Field>> {
        let row = sqlx::query_as::<_, FieldRow>(&format!("SELECT {} FROM fields WHERE id = $1", FIELD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(Field::from))
    }

    async fn list_fields(&self) -> CoreResult<Vec<Field>> {
        let rows = sqlx::query_as::<_, FieldRow>(&format!("SELECT {} FROM fields ORDER BY id DESC", FIELD_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().map(Field::from).collect())
    }

    async fn update_field(&self, id: i64, draft: &FieldDraft) -> CoreResult<Option<Field>> {
        let row = sqlx::query_as::<_, FieldRow>(&format!(
            r#"
            UPDATE fields
            SET name = $2, address = $3, contact = $4, hourly_rate = $5::NUMERIC(6, 2), latitude = $6, longitude = $7
            WHERE id = $1
            RETURNING {}
            "#,
            FIELD_COLUMNS
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.address)
        .bind(&draft.contact)
        .bind(draft.hourly_rate)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Field::from))
    }

    async fn delete_field(&self, id: i64) -> CoreResult<Option<FieldRemoval>> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Same row lock booking writes take, so none can land mid-cascade.
        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM fields WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;
        if locked.is_none() {
            return Ok(None);
        }

        let images = sqlx::query_as::<_, ImageRow>(
            "DELETE FROM images WHERE field_id = $1 RETURNING id, field_id, name, path",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage_error)?;

        let bookings = sqlx::query("DELETE FROM bookings WHERE field_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query("DELETE FROM fields WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;

        Ok(Some(FieldRemoval {
            images: images.into_iter().map(Image::from).collect(),
            bookings_removed: bookings.rows_affected(),
        }))
    }
}

pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: i64,
    field_id: i64,
    name: String,
    path: String,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Image {
            id: row.id,
            field_id: row.field_id,
            name: row.name,
            path: row.path,
        }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn add_image(&self, field_id: i64, name: &str, path: &str) -> CoreResult<Image> {
        let row = sqlx::query_as::<_, ImageRow>(
            "INSERT INTO images (field_id, name, path) VALUES ($1, $2, $3) RETURNING id, field_id, name, path",
        )
        .bind(field_id)
        .bind(name)
        .bind(path)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn list_for_fields(&self, field_ids: &[i64]) -> CoreResult<Vec<Image>> {
        if field_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ImageRow>(
            "SELECT id, field_id, name, path FROM images WHERE field_id = ANY($1) ORDER BY id",
        )
        .bind(field_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Image::from).collect())
    }
}
