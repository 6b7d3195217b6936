use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    required, Entity, Favorite, FavoritePatch, Message, NewFavorite, Store, StoreError,
    StoreResult, User, CARD_NAME_REQUIRED, TEXT_REQUIRED, UNKNOWN_USER, USERNAME_REQUIRED,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    messages: Vec<Message>,
    favorites: Vec<Favorite>,
    next_user_id: i64,
    next_message_id: i64,
    next_favorite_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

/// Process-local store. One lock guards every table, so each operation,
/// including the user/favourite cascade, is observed as a single step.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (OffsetDateTime, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, username: &str) -> StoreResult<User> {
        let username = required(username, USERNAME_REQUIRED)?;
        let mut t = self.tables.lock().await;
        if t.username_taken(username, None) {
            return Err(StoreError::DuplicateUsername);
        }
        let user = User {
            id: Tables::next_id(&mut t.next_user_id),
            username: username.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        debug!(user_id = user.id, "memory: user inserted");
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn get_user(&self, id: i64) -> StoreResult<User> {
        let t = self.tables.lock().await;
        t.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::User))
    }

    async fn update_user(&self, id: i64, username: &str) -> StoreResult<User> {
        let username = required(username, USERNAME_REQUIRED)?;
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == id) {
            return Err(StoreError::NotFound(Entity::User));
        }
        if t.username_taken(username, Some(id)) {
            return Err(StoreError::DuplicateUsername);
        }
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound(Entity::User))?;
        user.username = username.to_string();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<User> {
        let mut t = self.tables.lock().await;
        let pos = t
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::NotFound(Entity::User))?;
        let user = t.users.remove(pos);
        let before = t.favorites.len();
        t.favorites.retain(|f| f.user_id != id);
        debug!(
            user_id = id,
            favorites_removed = before - t.favorites.len(),
            "memory: user deleted"
        );
        Ok(user)
    }

    async fn create_message(&self, text: &str) -> StoreResult<Message> {
        let text = required(text, TEXT_REQUIRED)?;
        let mut t = self.tables.lock().await;
        let now = OffsetDateTime::now_utc();
        let message = Message {
            id: Tables::next_id(&mut t.next_message_id),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        let mut messages = self.tables.lock().await.messages.clone();
        newest_first(&mut messages, |m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn get_message(&self, id: i64) -> StoreResult<Message> {
        let t = self.tables.lock().await;
        t.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Message))
    }

    async fn update_message(&self, id: i64, text: &str) -> StoreResult<Message> {
        let text = required(text, TEXT_REQUIRED)?;
        let mut t = self.tables.lock().await;
        let message = t
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound(Entity::Message))?;
        message.text = text.to_string();
        message.updated_at = OffsetDateTime::now_utc();
        Ok(message.clone())
    }

    async fn delete_message(&self, id: i64) -> StoreResult<Message> {
        let mut t = self.tables.lock().await;
        let pos = t
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or(StoreError::NotFound(Entity::Message))?;
        Ok(t.messages.remove(pos))
    }

    async fn create_favorite(&self, new: NewFavorite) -> StoreResult<Favorite> {
        let card_name = required(&new.card_name, CARD_NAME_REQUIRED)?.to_string();
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == new.user_id) {
            return Err(StoreError::InvalidInput(UNKNOWN_USER.into()));
        }
        let favorite = Favorite {
            id: Tables::next_id(&mut t.next_favorite_id),
            user_id: new.user_id,
            card_name,
            scryfall_id: new.scryfall_id,
            ability_type: new.ability_type,
            notes: new.notes,
            created_at: OffsetDateTime::now_utc(),
        };
        t.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn list_favorites_for_user(&self, user_id: i64) -> StoreResult<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .tables
            .lock()
            .await
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut favorites, |f| (f.created_at, f.id));
        Ok(favorites)
    }

    async fn get_favorite(&self, id: i64) -> StoreResult<Favorite> {
        let t = self.tables.lock().await;
        t.favorites
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(Entity::Favorite))
    }

    async fn update_favorite(&self, id: i64, patch: FavoritePatch) -> StoreResult<Favorite> {
        let mut t = self.tables.lock().await;
        let favorite = t
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(StoreError::NotFound(Entity::Favorite))?;
        patch.apply(favorite);
        Ok(favorite.clone())
    }

    async fn delete_favorite(&self, id: i64) -> StoreResult<Favorite> {
        let mut t = self.tables.lock().await;
        let pos = t
            .favorites
            .iter()
            .position(|f| f.id == id)
            .ok_or(StoreError::NotFound(Entity::Favorite))?;
        Ok(t.favorites.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;

    fn new_fav(user_id: i64, card: &str) -> NewFavorite {
        NewFavorite {
            user_id,
            card_name: card.into(),
            scryfall_id: None,
            ability_type: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn shared_contract() {
        let store = MemoryStore::new();
        contract::users_are_unique_and_ordered(&store, "mem").await;
        contract::delete_user_cascades_to_own_favorites(&store, "mem").await;
        contract::delete_user_wins_over_concurrent_favorite_inserts(&store, "mem").await;
        contract::favorite_patch_keeps_unset_fields(&store, "mem").await;
        contract::messages_list_newest_first(&store, "mem").await;
    }

    #[tokio::test]
    async fn rejects_blank_username() {
        let store = MemoryStore::new();
        let err = store.create_user("   ").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(ref m) if m == "Username is required"));
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_match_is_exact() {
        let store = MemoryStore::new();
        store.create_user("alice").await.unwrap();
        // case differs, so it is a different username
        store.create_user("Alice").await.unwrap();
        let err = store.create_user(" alice ").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.create_user("first").await.unwrap();
        store.delete_user(first.id).await.unwrap();
        let second = store.create_user("first").await.unwrap();
        assert!(second.id > first.id);

        let m1 = store.create_message("hi").await.unwrap();
        store.delete_message(m1.id).await.unwrap();
        let m2 = store.create_message("hi again").await.unwrap();
        assert!(m2.id > m1.id);
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_user(42, "ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Entity::User)));
    }

    #[tokio::test]
    async fn messages_newest_first() {
        let store = MemoryStore::new();
        for text in ["one", "two", "three"] {
            store.create_message(text).await.unwrap();
        }
        let texts: Vec<String> = store
            .list_messages()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn update_message_touches_updated_at_only() {
        let store = MemoryStore::new();
        let created = store.create_message("draft").await.unwrap();
        let updated = store.update_message(created.id, "final").await.unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn favorite_requires_live_user_and_card_name() {
        let store = MemoryStore::new();
        let err = store.create_favorite(new_fav(7, "Lightning Bolt")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(ref m) if m == "User does not exist"));

        let user = store.create_user("alice").await.unwrap();
        let err = store.create_favorite(new_fav(user.id, "")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert!(store.list_favorites_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn favorite_patch_only_touches_supplied_fields() {
        let store = MemoryStore::new();
        let user = store.create_user("alice").await.unwrap();
        let fav = store
            .create_favorite(NewFavorite {
                ability_type: Some("Flying".into()),
                notes: Some("first pick".into()),
                ..new_fav(user.id, "Serra Angel")
            })
            .await
            .unwrap();

        let untouched = store
            .update_favorite(fav.id, FavoritePatch::default())
            .await
            .unwrap();
        assert_eq!(untouched, fav);

        let noted = store
            .update_favorite(
                fav.id,
                FavoritePatch {
                    notes: Some("sideboard".into()),
                    ability_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(noted.notes.as_deref(), Some("sideboard"));
        assert_eq!(noted.ability_type.as_deref(), Some("Flying"));
        assert_eq!(noted.card_name, "Serra Angel");
        assert_eq!(noted.created_at, fav.created_at);
    }

    #[tokio::test]
    async fn favorites_listed_newest_first_per_user() {
        let store = MemoryStore::new();
        let user = store.create_user("alice").await.unwrap();
        let a = store.create_favorite(new_fav(user.id, "A")).await.unwrap();
        let b = store.create_favorite(new_fav(user.id, "B")).await.unwrap();
        let listed: Vec<i64> = store
            .list_favorites_for_user(user.id)
            .await
            .unwrap()
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(listed, vec![b.id, a.id]);
        assert!(store.list_favorites_for_user(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_favorite_returns_record() {
        let store = MemoryStore::new();
        let user = store.create_user("alice").await.unwrap();
        let fav = store.create_favorite(new_fav(user.id, "Opt")).await.unwrap();
        let removed = store.delete_favorite(fav.id).await.unwrap();
        assert_eq!(removed, fav);
        let err = store.get_favorite(fav.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(Entity::Favorite)));
    }
}
