use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use super::{
    required, Entity, Favorite, FavoritePatch, Message, NewFavorite, Store, StoreError,
    StoreResult, User, CARD_NAME_REQUIRED, TEXT_REQUIRED, UNKNOWN_USER, USERNAME_REQUIRED,
};

const USER_COLUMNS: &str = "id, username, created_at";
const MESSAGE_COLUMNS: &str = "id, text, created_at, updated_at";
const FAVORITE_COLUMNS: &str =
    "id, user_id, card_name, scryfall_id, ability_type, notes, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    /// Connects and applies pending migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("postgres store ready");
        Ok(Self { db })
    }
}

/// Maps constraint violations onto store errors.
fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateUsername;
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::InvalidInput(UNKNOWN_USER.into());
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, username: &str) -> StoreResult<User> {
        let username = required(username, USERNAME_REQUIRED)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username) VALUES ($1) RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .fetch_one(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound(Entity::User))
    }

    async fn update_user(&self, id: i64, username: &str) -> StoreResult<User> {
        let username = required(username, USERNAME_REQUIRED)?;
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(map_db_err)?
        .ok_or(StoreError::NotFound(Entity::User))
    }

    async fn delete_user(&self, id: i64) -> StoreResult<User> {
        let mut tx = self.db.begin().await?;
        // The row lock blocks favourite inserts for this user until commit.
        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound(Entity::User));
        }
        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        debug!(user_id = id, favorites_removed = removed, "postgres: user deleted");
        Ok(user)
    }

    async fn create_message(&self, text: &str) -> StoreResult<Message> {
        let text = required(text, TEXT_REQUIRED)?;
        let message = sqlx::query_as::<_, Message>(&format!(
            "INSERT INTO messages (text) VALUES ($1) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(text)
        .fetch_one(&self.db)
        .await?;
        Ok(message)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(messages)
    }

    async fn get_message(&self, id: i64) -> StoreResult<Message> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Message))
    }

    async fn update_message(&self, id: i64, text: &str) -> StoreResult<Message> {
        let text = required(text, TEXT_REQUIRED)?;
        sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET text = $2, updated_at = now() WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(text)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Message))
    }

    async fn delete_message(&self, id: i64) -> StoreResult<Message> {
        sqlx::query_as::<_, Message>(&format!(
            "DELETE FROM messages WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Message))
    }

    async fn create_favorite(&self, new: NewFavorite) -> StoreResult<Favorite> {
        let card_name = required(&new.card_name, CARD_NAME_REQUIRED)?;
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            INSERT INTO favorites (user_id, card_name, scryfall_id, ability_type, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FAVORITE_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(card_name)
        .bind(new.scryfall_id.as_deref())
        .bind(new.ability_type.as_deref())
        .bind(new.notes.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(map_db_err)?;
        Ok(favorite)
    }

    async fn list_favorites_for_user(&self, user_id: i64) -> StoreResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            SELECT {FAVORITE_COLUMNS}
              FROM favorites
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(favorites)
    }

    async fn get_favorite(&self, id: i64) -> StoreResult<Favorite> {
        sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Favorite))
    }

    async fn update_favorite(&self, id: i64, patch: FavoritePatch) -> StoreResult<Favorite> {
        if patch.is_empty() {
            return self.get_favorite(id).await;
        }
        sqlx::query_as::<_, Favorite>(&format!(
            r#"
            UPDATE favorites
               SET notes = COALESCE($2, notes),
                   ability_type = COALESCE($3, ability_type)
             WHERE id = $1
            RETURNING {FAVORITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.notes.as_deref())
        .bind(patch.ability_type.as_deref())
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Favorite))
    }

    async fn delete_favorite(&self, id: i64) -> StoreResult<Favorite> {
        sqlx::query_as::<_, Favorite>(&format!(
            "DELETE FROM favorites WHERE id = $1 RETURNING {FAVORITE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(Entity::Favorite))
    }
}
