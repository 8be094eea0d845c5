use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::store::PgShoppingStore;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use foodgram_core::{aggregate_shopping_cart, render_shopping_list, ShoppingListExport};
use std::sync::Arc;

/// Attach a rendered shopping list as a CSV download.
///
/// Answers 201 rather than 200; existing clients expect it.
pub fn shopping_list_response(export: ShoppingListExport) -> Response {
    (
        StatusCode::CREATED,
        [
            (header::CONTENT_TYPE, export.content_type.to_string()),
            (header::CONTENT_DISPOSITION, export.content_disposition()),
        ],
        Body::from(export.body),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 201, description = "Aggregated shopping list as CSV (name,unit,total rows, no header)",
            content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let mut store = PgShoppingStore::new(&mut conn);
    let lines = match aggregate_shopping_cart(&mut store, user.id) {
        Ok(lines) => lines,
        Err(e) => return internal_error("Failed to build shopping list", e),
    };

    let export = match render_shopping_list(&lines) {
        Ok(export) => export,
        Err(e) => return internal_error("Failed to render shopping list", e),
    };

    tracing::info!(user_id = %user.id, rows = lines.len(), "shopping list exported");

    shopping_list_response(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodgram_core::AggregatedLine;

    #[test]
    fn test_shopping_list_response_headers() {
        let export = render_shopping_list(&[AggregatedLine {
            name: "Flour".to_string(),
            measurement_unit: "g".to_string(),
            total_amount: 300,
        }])
        .unwrap();

        let response = shopping_list_response(export);

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"shopping_list.csv\""
        );
    }

    #[tokio::test]
    async fn test_empty_shopping_list_is_still_created() {
        let export = render_shopping_list(&[]).unwrap();
        let response = shopping_list_response(export);

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
