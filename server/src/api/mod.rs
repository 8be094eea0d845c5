pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::models::{Ingredient, Tag};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Log an internal failure and answer with a generic 500.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram API"),
        components(schemas(ErrorResponse, Ingredient, Tag))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let spec = openapi();
        for path in [
            "/api/tags",
            "/api/tags/{id}",
            "/api/ingredients",
            "/api/ingredients/{id}",
            "/api/recipes",
            "/api/recipes/{id}",
            "/api/recipes/{id}/favorite",
            "/api/recipes/{id}/shopping_cart",
            "/api/recipes/download_shopping_cart",
            "/api/users/me",
            "/api/users/subscriptions",
            "/api/users/{id}/subscribe",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }

        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ErrorResponse"));
    }
}
