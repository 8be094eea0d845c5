//! Administrative subcommands that run against the database and exit.

use crate::auth::{create_session, SESSION_TTL_DAYS};
use crate::db::DbPool;
use crate::models::{NewIngredient, NewTag, NewUser};
use crate::schema::{ingredients, tags, users};
use anyhow::{Context, Result};
use diesel::prelude::*;
use foodgram_core::{parse_ingredients, parse_tags};
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

pub const INGREDIENTS_FILE: &str = "ingredients.csv";
pub const TAGS_FILE: &str = "tags.csv";

fn open(dir: &Path, name: &str) -> Result<File> {
    let path = dir.join(name);
    File::open(&path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Load `ingredients.csv` and `tags.csv` from `dir`. Rows that already exist
/// are skipped, so the command can be re-run safely.
pub fn load_reference_data(pool: &DbPool, dir: &Path) -> Result<()> {
    let ingredient_records = parse_ingredients(open(dir, INGREDIENTS_FILE)?)
        .with_context(|| format!("Invalid {}", INGREDIENTS_FILE))?;
    let tag_records =
        parse_tags(open(dir, TAGS_FILE)?).with_context(|| format!("Invalid {}", TAGS_FILE))?;

    let mut conn = pool.get()?;

    let (ingredients_added, tags_added) = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let new_ingredients: Vec<NewIngredient> = ingredient_records
            .iter()
            .map(|record| NewIngredient {
                name: &record.name,
                measurement_unit: &record.measurement_unit,
            })
            .collect();
        let new_tags: Vec<NewTag> = tag_records
            .iter()
            .map(|record| NewTag {
                name: &record.name,
                color: &record.color,
                slug: &record.slug,
            })
            .collect();

        // Postgres caps bind parameters per statement
        let mut ingredients_added = 0;
        for chunk in new_ingredients.chunks(1000) {
            ingredients_added += diesel::insert_into(ingredients::table)
                .values(chunk)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        let mut tags_added = 0;
        for chunk in new_tags.chunks(1000) {
            tags_added += diesel::insert_into(tags::table)
                .values(chunk)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        Ok((ingredients_added, tags_added))
    })?;

    tracing::info!(ingredients_added, tags_added, "reference data loaded");
    println!(
        "Ingredients: {} added, {} already present",
        ingredients_added,
        ingredient_records.len() - ingredients_added
    );
    println!(
        "Tags: {} added, {} already present",
        tags_added,
        tag_records.len() - tags_added
    );

    Ok(())
}

/// Create a user with a fresh API session and print the bearer token.
pub fn create_user(pool: &DbPool, new_user: &NewUser<'_>) -> Result<()> {
    let mut conn = pool.get()?;

    let (user_id, token) = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let user_id: Uuid = diesel::insert_into(users::table)
            .values(new_user)
            .returning(users::id)
            .get_result(conn)
            .with_context(|| format!("Failed to create user {}", new_user.username))?;
        let token = create_session(conn, user_id)?;
        Ok((user_id, token))
    })?;

    tracing::info!(%user_id, username = new_user.username, "user created");
    println!("User {} created with id {}", new_user.username, user_id);
    println!("API token (valid for {} days): {}", SESSION_TTL_DAYS, token);

    Ok(())
}
