use crate::api::{error_response, internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Tag;
use crate::schema::tags;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag", body = Tag),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
pub async fn get_tag(State(pool): State<Arc<DbPool>>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match tags::table
        .find(id)
        .select(Tag::as_select())
        .first(&mut conn)
        .optional()
    {
        Ok(Some(tag)) => (StatusCode::OK, Json(tag)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Tag not found"),
        Err(e) => internal_error("Failed to fetch tag", e),
    }
}
