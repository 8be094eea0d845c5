mod api;
mod auth;
mod commands;
mod config;
mod db;
mod models;
mod schema;
mod store;
mod telemetry;

use anyhow::Context;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware;
use axum::Router;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
pub type AppState = Arc<db::DbPool>;

#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram recipe sharing API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the OpenAPI document and exit
    Openapi,
    /// Load ingredient and tag reference data from CSV files
    LoadData {
        /// Directory containing ingredients.csv and tags.csv
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
    /// Create a user and print an API token for them
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
}

/// Assemble the application: public reference data, authenticated recipe
/// and user routes, Swagger UI, and request tracing.
fn build_router(pool: AppState) -> Router {
    let public_router = Router::new()
        .nest("/api/tags", api::tags::router())
        .nest("/api/ingredients", api::ingredients::router());

    // Handlers here authenticate through the AuthUser extractor
    let protected_router = Router::new()
        .nest("/api/recipes", api::recipes::router())
        .nest("/api/users", api::users::router());

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(public_router)
        .merge(protected_router)
        .merge(swagger_ui)
        .with_state(pool)
        .layer(middleware::from_fn(
            telemetry::db_query_count_header_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(telemetry::query_counting_middleware))
}

async fn serve(config: config::Config) -> anyhow::Result<()> {
    let pool: AppState = Arc::new(db::create_pool(&config.database_url, config.pool_size)?);
    db::run_migrations(&pool)?;

    let app = build_router(pool);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);
    tracing::info!(
        "OpenAPI spec available at http://{}/api-docs/openapi.json",
        local_addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    if let Commands::Openapi = command {
        println!("{}", api::openapi().to_pretty_json()?);
        return Ok(());
    }

    let _telemetry = telemetry::init_telemetry()?;
    let config = config::Config::from_env()?;

    match command {
        Commands::Serve => serve(config).await,
        Commands::Openapi => Ok(()),
        Commands::LoadData { dir } => {
            let pool = db::create_pool(&config.database_url, 1)?;
            db::run_migrations(&pool)?;
            commands::load_reference_data(&pool, &dir)
        }
        Commands::CreateUser {
            email,
            username,
            first_name,
            last_name,
        } => {
            let pool = db::create_pool(&config.database_url, 1)?;
            db::run_migrations(&pool)?;
            commands::create_user(
                &pool,
                &models::NewUser {
                    email: &email,
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Arc::new(db::unconnected_pool()))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer_token() {
        for (method, uri) in [
            ("GET", "/api/recipes"),
            ("GET", "/api/recipes/download_shopping_cart"),
            ("POST", "/api/recipes/00000000-0000-0000-0000-000000000000/shopping_cart"),
            ("DELETE", "/api/recipes/00000000-0000-0000-0000-000000000000/favorite"),
            ("GET", "/api/users/me"),
            ("GET", "/api/users/subscriptions"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            assert_eq!(
                status_of(request).await,
                StatusCode::UNAUTHORIZED,
                "{} {}",
                method,
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_authorization_is_rejected() {
        let request = Request::builder()
            .uri("/api/recipes/download_shopping_cart")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_route_without_database_is_server_error() {
        let request = Request::builder()
            .uri("/api/tags")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            status_of(request).await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_token_lookup_without_database_is_server_error() {
        let request = Request::builder()
            .uri("/api/recipes/download_shopping_cart")
            .header(header::AUTHORIZATION, "Bearer sometoken")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database unavailable");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/api/nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli =
            Cli::try_parse_from(["foodgram-server", "load-data", "--dir", "fixtures"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::LoadData { dir }) if dir == PathBuf::from("fixtures")
        ));

        let cli = Cli::try_parse_from(["foodgram-server"]).unwrap();
        assert!(cli.command.is_none());

        assert!(
            Cli::try_parse_from(["foodgram-server", "create-user", "--email", "a@b.c"]).is_err()
        );
    }
}
