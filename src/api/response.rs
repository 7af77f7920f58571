// Success envelopes; errors build theirs in `AppError::into_response`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_page: i64,
}

impl PaginationMeta {
    /// `total_page` is never below 1, even for an empty result
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_page = if limit > 0 {
            ((total + limit - 1) / limit).max(1)
        } else {
            1
        };

        Self {
            page,
            limit,
            total,
            total_page,
        }
    }
}

/// `200 {"success": true, "data": ...}`
pub fn success<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, data, None)
}

/// `201 {"success": true, "data": ...}`
pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, data, None)
}

pub fn paginated<T: Serialize>(data: T, meta: PaginationMeta) -> Response {
    envelope(StatusCode::OK, data, Some(meta))
}

fn envelope<T: Serialize>(
    status: StatusCode,
    data: T,
    meta: Option<PaginationMeta>,
) -> Response {
    (
        status,
        Json(ApiResponse {
            success: true,
            message: None,
            data: Some(data),
            meta,
        }),
    )
        .into_response()
}
