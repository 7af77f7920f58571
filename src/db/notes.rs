// Database queries for notes; every statement is scoped to the owning user

use crate::db::schema::{Note, NoteWithOwner};
use crate::domain::note::{NoteInput, NotesFilter};
use crate::errors::Result;
use async_trait::async_trait;
use sqlx::PgPool;

const NOTE_WITH_OWNER: &str = r#"
    SELECT
        n.id, n.user_id, n.title, n.content, n.category, n.created_at, n.updated_at,
        u.username AS owner_username, u.email AS owner_email,
        u.full_name AS owner_full_name, u.created_at AS owner_created_at
    FROM notes n
    JOIN users u ON u.id = n.user_id
"#;

const INSERT_NOTE: &str = r#"
    WITH n AS (
        INSERT INTO notes (user_id, title, content, category)
        VALUES ($1, $2, $3, $4)
        RETURNING *
    )
    SELECT
        n.id, n.user_id, n.title, n.content, n.category, n.created_at, n.updated_at,
        u.username AS owner_username, u.email AS owner_email,
        u.full_name AS owner_full_name, u.created_at AS owner_created_at
    FROM n
    JOIN users u ON u.id = n.user_id
"#;

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create(&self, user_id: i64, input: &NoteInput) -> Result<Note>;

    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<Note>>;

    /// One page of notes, newest first, plus the total matching the filter
    async fn list(&self, user_id: i64, filter: &NotesFilter) -> Result<(Vec<Note>, i64)>;

    /// `None` when the note does not exist or belongs to someone else
    async fn update(&self, id: i64, user_id: i64, input: &NoteInput) -> Result<Option<Note>>;

    /// `false` when the note does not exist or belongs to someone else
    async fn delete(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Distinct non-empty categories, sorted
    async fn categories(&self, user_id: i64) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, user_id: i64, input: &NoteInput) -> Result<Note> {
        let row = sqlx::query_as::<_, NoteWithOwner>(INSERT_NOTE)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.category)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(note_id = row.id, user_id, "Created note");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<Note>> {
        let sql = format!("{} WHERE n.id = $1 AND n.user_id = $2", NOTE_WITH_OWNER);
        let row = sqlx::query_as::<_, NoteWithOwner>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Note::from))
    }

    async fn list(&self, user_id: i64, filter: &NotesFilter) -> Result<(Vec<Note>, i64)> {
        // $2 is NULL when no category filter is set
        let category = filter.category.as_deref();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notes n \
             WHERE n.user_id = $1 AND ($2::TEXT IS NULL OR n.category = $2)",
        )
        .bind(user_id)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "{} WHERE n.user_id = $1 AND ($2::TEXT IS NULL OR n.category = $2) \
             ORDER BY n.created_at DESC, n.id DESC LIMIT $3 OFFSET $4",
            NOTE_WITH_OWNER
        );
        let rows = sqlx::query_as::<_, NoteWithOwner>(&sql)
            .bind(user_id)
            .bind(category)
            .bind(filter.limit)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Note::from).collect(), total))
    }

    async fn update(&self, id: i64, user_id: i64, input: &NoteInput) -> Result<Option<Note>> {
        let result = sqlx::query(
            "UPDATE notes SET title = $1, content = $2, category = $3, updated_at = NOW() \
             WHERE id = $4 AND user_id = $5",
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.category)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id, user_id).await
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn categories(&self, user_id: i64) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM notes \
             WHERE user_id = $1 AND category <> '' ORDER BY category",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }
}
