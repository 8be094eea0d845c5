use diesel::connection::{Instrumentation, InstrumentationEvent};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Check out a pooled connection inside a handler, returning a 500 response
/// from the handler if none is available.
#[macro_export]
macro_rules! get_conn {
    ($pool:expr) => {
        match $pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Failed to get DB connection: {}", e);
                return $crate::api::error_response(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Database unavailable",
                );
            }
        }
    };
}

/// Opens a `db.query` span for every statement so the per-request query
/// counter in `telemetry` sees it.
#[derive(Debug)]
struct QueryTracing;

impl CustomizeConnection<PgConnection, r2d2::Error> for QueryTracing {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        conn.set_instrumentation(QueryTracing);
        Ok(())
    }
}

impl Instrumentation for QueryTracing {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        match event {
            InstrumentationEvent::StartQuery { query, .. } => {
                let _span = tracing::info_span!("db.query", sql = %query);
            }
            InstrumentationEvent::FinishQuery {
                query,
                error: Some(error),
                ..
            } => {
                tracing::debug!(sql = %query, error = %error, "query failed");
            }
            _ => {}
        }
    }
}

pub fn create_pool(database_url: &str, max_size: u32) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(QueryTracing))
        .build(manager)?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {}", e))?;

    for version in applied {
        tracing::info!(%version, "applied migration");
    }
    Ok(())
}

/// A pool that never connects up front; checkouts fail fast when the
/// database is unreachable.
#[cfg(test)]
pub fn unconnected_pool() -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new("postgres://localhost:1/unreachable");
    r2d2::Pool::builder()
        .max_size(1)
        .min_idle(Some(0))
        .connection_timeout(std::time::Duration::from_millis(50))
        .build_unchecked(manager)
}
