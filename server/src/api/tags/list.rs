use crate::api::{internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Tag;
use crate::schema::tags;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "All tags ordered by name", body = Vec<Tag>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match tags::table
        .select(Tag::as_select())
        .order(tags::name.asc())
        .load(&mut conn)
    {
        Ok(tags) => (StatusCode::OK, Json(tags)).into_response(),
        Err(e) => internal_error("Failed to fetch tags", e),
    }
}
