use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::clothing::{ClothingItem, NewClothingItem};

/// Query parameters of `GET /closet`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClosetFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ClosetFilter {
    /// Trimmed category, `None` when blank.
    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// Trimmed search text, `None` when blank.
    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Persistence gateway for catalogued items. Rows are inserted once and
/// never updated or deleted.
///
/// Carried in `AppState` as `Arc<dyn ItemStore>`.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Inserts a row and returns it as re-read from the store.
    async fn insert(&self, item: NewClothingItem) -> Result<ClothingItem, AppError>;

    /// Lists items matching the filter, newest first.
    async fn list(&self, filter: &ClosetFilter) -> Result<Vec<ClothingItem>, AppError>;
}

pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert(&self, item: NewClothingItem) -> Result<ClothingItem, AppError> {
        // Dropping an uncommitted transaction rolls it back and returns the
        // connection to the pool.
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO clothing_items
                (filename, url, category, subcategory, color_base, formality, season, labels_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&item.filename)
        .bind(&item.url)
        .bind(&item.category)
        .bind(&item.subcategory)
        .bind(&item.color_base)
        .bind(&item.formality)
        .bind(&item.season)
        .bind(&item.labels_json)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &item.filename))?;

        tx.commit().await?;

        info!("Inserted clothing item {id} ({})", item.filename);

        let stored = sqlx::query_as::<_, ClothingItem>("SELECT * FROM clothing_items WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(stored)
    }

    async fn list(&self, filter: &ClosetFilter) -> Result<Vec<ClothingItem>, AppError> {
        let search = filter.search().map(like_pattern);

        Ok(sqlx::query_as::<_, ClothingItem>(
            r#"
            SELECT *
            FROM clothing_items
            WHERE ($1::text IS NULL OR LOWER(category) = LOWER($1))
              AND ($2::text IS NULL
                   OR category ILIKE $2
                   OR subcategory ILIKE $2
                   OR color_base ILIKE $2
                   OR formality ILIKE $2
                   OR season ILIKE $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.category())
        .bind(search)
        .fetch_all(&self.pool)
        .await?)
    }
}

fn map_insert_error(err: sqlx::Error, filename: &str) -> AppError {
    let unique_violation = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique_violation {
        AppError::DuplicateFilename(filename.to_string())
    } else {
        AppError::Database(err)
    }
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
