mod crypto;
mod db;
mod extractor;

pub use db::{create_session, SESSION_TTL_DAYS};
pub use extractor::AuthUser;
