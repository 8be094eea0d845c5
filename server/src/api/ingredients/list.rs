use crate::api::{internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    responses(
        (status = 200, description = "All ingredients ordered by name and unit", body = Vec<Ingredient>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_ingredients(State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match ingredients::table
        .select(Ingredient::as_select())
        .order((ingredients::name.asc(), ingredients::measurement_unit.asc()))
        .load(&mut conn)
    {
        Ok(ingredients) => (StatusCode::OK, Json(ingredients)).into_response(),
        Err(e) => internal_error("Failed to fetch ingredients", e),
    }
}
