// Note CRUD and category endpoints, read-through cached per user

use crate::api::{
    extract::JsonBody,
    response::{self, PaginationMeta},
    routes::AppState,
};
use crate::auth::AuthUser;
use crate::cache::{keys, CacheService};
use crate::db::schema::Note;
use crate::domain::{parse_note_id, NoteRequest, NotesQuery};
use crate::errors::{AppError, Result};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::future::Future;

/// One cached page of the list endpoint
#[derive(Debug, Serialize, Deserialize)]
struct CachedPage {
    notes: Vec<Note>,
    total: i64,
}

fn note_not_found() -> AppError {
    AppError::NotFound("Note not found".to_string())
}

/// Serve from the cache when possible, otherwise load and populate it
async fn read_through<T, F, Fut>(
    cache: Option<&CacheService>,
    resource: &str,
    key: String,
    load: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(cache) = cache else {
        return load().await;
    };

    if let Some(hit) = cache.lookup(resource, &key).await {
        return Ok(hit);
    }

    let value = load().await?;
    cache.store(&key, &value).await;
    Ok(value)
}

async fn invalidate(state: &AppState, user_id: i64) {
    if let Some(cache) = &state.cache {
        cache.invalidate_user_notes(user_id).await;
    }
}

/// POST /api/v1/notes
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(req): JsonBody<NoteRequest>,
) -> Result<Response> {
    let input = req.validate()?;
    let note = state.notes.create(auth.id, &input).await?;

    invalidate(&state, auth.id).await;
    tracing::info!(note_id = note.id, user_id = auth.id, "Note created");

    Ok(response::created(note))
}

/// GET /api/v1/notes?category=&page=&limit=
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    query: std::result::Result<Query<NotesQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) =
        query.map_err(|e| AppError::BadRequest(format!("Invalid query: {}", e.body_text())))?;
    let filter = query.validate()?;

    let key = keys::notes_list(auth.id, filter.category.as_deref(), filter.page, filter.limit);
    let (repo, user_id, filter_ref) = (&state.notes, auth.id, &filter);
    let page = read_through(state.cache.as_ref(), "notes_list", key, move || async move {
        let (notes, total) = repo.list(user_id, filter_ref).await?;
        Ok(CachedPage { notes, total })
    })
    .await?;

    let meta = PaginationMeta::new(filter.page, filter.limit, page.total);
    Ok(response::paginated(page.notes, meta))
}

/// GET /api/v1/notes/:id
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_note_id(&id)?;

    let key = keys::note_detail(id, auth.id);
    if let Some(cache) = &state.cache {
        if let Some(note) = cache.lookup::<Note>("note_detail", &key).await {
            return Ok(response::success(note));
        }
    }

    // Misses are not cached, so a later create is visible immediately
    let note = state
        .notes
        .get_by_id(id, auth.id)
        .await?
        .ok_or_else(note_not_found)?;

    if let Some(cache) = &state.cache {
        cache.store(&key, &note).await;
    }
    Ok(response::success(note))
}

/// PUT /api/v1/notes/:id
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<NoteRequest>,
) -> Result<Response> {
    let id = parse_note_id(&id)?;
    let input = req.validate()?;

    let note = state
        .notes
        .update(id, auth.id, &input)
        .await?
        .ok_or_else(note_not_found)?;

    invalidate(&state, auth.id).await;
    tracing::info!(note_id = id, user_id = auth.id, "Note updated");

    Ok(response::success(note))
}

/// DELETE /api/v1/notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_note_id(&id)?;

    if !state.notes.delete(id, auth.id).await? {
        return Err(note_not_found());
    }

    invalidate(&state, auth.id).await;
    tracing::info!(note_id = id, user_id = auth.id, "Note deleted");

    Ok(response::success(json!({"message": "Note deleted successfully"})))
}

/// GET /api/v1/categories
pub async fn categories(State(state): State<AppState>, auth: AuthUser) -> Result<Response> {
    let key = keys::categories(auth.id);
    let repo = &state.notes;
    let categories: Vec<String> =
        read_through(state.cache.as_ref(), "categories", key, move || {
            repo.categories(auth.id)
        })
        .await?;

    Ok(response::success(categories))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{send, TestApp};
    use crate::config::WindowLimitConfig;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn create(app: &TestApp, token: &str, title: &str, category: &str) -> Value {
        let (status, body) = send(
            &app.router(),
            "POST",
            "/api/v1/notes",
            Some(token),
            Some(json!({"title": title, "content": "body", "category": category})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let app = TestApp::new();
        let (user_id, token) = app.register("alice", "password123").await;

        let note = create(&app, &token, "Groceries", "home").await;
        assert_eq!(note["user_id"], user_id);

        let uri = format!("/api/v1/notes/{}", note["id"]);
        let (status, body) = send(&app.router(), "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Groceries");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;

        let (status, body) = send(
            &app.router(),
            "POST",
            "/api/v1/notes",
            Some(&token),
            Some(json!({"title": "", "content": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_notes_are_isolated_per_user() {
        let app = TestApp::new();
        let (_, alice) = app.register("alice", "password123").await;
        let (_, bob) = app.register("bob", "password123").await;
        let note = create(&app, &alice, "Private", "").await;
        let uri = format!("/api/v1/notes/{}", note["id"]);
        let router = app.router();

        let (status, body) = send(&router, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Note not found");

        let update = json!({"title": "Hijacked", "content": "x"});
        let (status, _) = send(&router, "PUT", &uri, Some(&bob), Some(update)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, "DELETE", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&router, "GET", "/api/v1/notes", Some(&bob), None).await;
        assert_eq!(body["meta"]["total"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_non_numeric_id() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;

        let (status, body) =
            send(&app.router(), "GET", "/api/v1/notes/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "id");
        assert_eq!(body["errors"][0]["message"], "Note ID must be a valid number");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;
        let note = create(&app, &token, "Draft", "").await;
        let uri = format!("/api/v1/notes/{}", note["id"]);
        let router = app.router();

        let update = json!({"title": "Final", "content": "done", "category": "work"});
        let (status, body) = send(&router, "PUT", &uri, Some(&token), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Final");
        assert_eq!(body["data"]["category"], "work");

        let (status, body) = send(&router, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Note deleted successfully");

        let (status, _) = send(&router, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_pagination_and_filter() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;
        for i in 0..5 {
            let category = if i % 2 == 0 { "work" } else { "home" };
            create(&app, &token, &format!("note {}", i), category).await;
        }
        let router = app.router();

        let (status, body) =
            send(&router, "GET", "/api/v1/notes?page=2&limit=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["meta"],
            json!({"page": 2, "limit": 2, "total": 5, "total_page": 3})
        );

        let (_, body) =
            send(&router, "GET", "/api/v1/notes?category=work", Some(&token), None).await;
        assert_eq!(body["meta"]["total"], 3);
        assert_eq!(body["meta"]["limit"], 10);

        let (status, body) =
            send(&router, "GET", "/api/v1/notes?limit=101", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["message"], "Limit cannot exceed 100 items per page");
    }

    #[tokio::test]
    async fn test_huge_page_is_a_validation_error() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;

        let (status, body) = send(
            &app.router(),
            "GET",
            "/api/v1/notes?page=9223372036854775807",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "page");
        assert_eq!(body["errors"][0]["value"], "9223372036854775807");
    }

    #[tokio::test]
    async fn test_categories() {
        let app = TestApp::new();
        let (_, token) = app.register("alice", "password123").await;
        for category in ["work", "home", "work", ""] {
            create(&app, &token, "n", category).await;
        }

        let (status, body) =
            send(&app.router(), "GET", "/api/v1/categories", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["home", "work"]));
    }

    #[tokio::test]
    async fn test_protected_routes_use_general_limiter() {
        let app = TestApp::with_limits(
            WindowLimitConfig {
                requests: 5,
                window_seconds: 900,
                cleanup_seconds: 1800,
            },
            WindowLimitConfig {
                requests: 2,
                window_seconds: 60,
                cleanup_seconds: 120,
            },
        );
        let (_, token) = app.register("alice", "password123").await;
        let router = app.router();

        for _ in 0..2 {
            let (status, _) = send(&router, "GET", "/api/v1/categories", Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send(&router, "GET", "/api/v1/categories", Some(&token), None).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
    }
}
