//! User Storage
//! Mission: Keep user credentials and role profiles in the document store

use crate::auth::models::{User, UserRole};
use crate::store::{Document, DocumentStore, Filter, ObjectId, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const USERS: &str = "users";
pub const PROFILES: &str = "profiles";

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("username already taken")]
    Duplicate,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Credential store over the `users` and `profiles` collections.
pub struct UserStore {
    store: Arc<dyn DocumentStore>,
    // Serialises the check-then-insert so a username is only ever taken once.
    create_lock: Mutex<()>,
}

impl UserStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Get user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let doc = self
            .store
            .find_one(USERS, &Filter::new().eq("username", username))
            .await?;

        doc.map(|doc| serde_json::from_value(Value::Object(doc)))
            .transpose()
            .map_err(StoreError::from)
    }

    /// Create a user from an already-hashed password, plus its profile when given.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: String,
        role: UserRole,
        profile: Option<Document>,
    ) -> Result<User, UserStoreError> {
        let _guard = self.create_lock.lock().await;

        if self.get_user_by_username(username).await?.is_some() {
            return Err(UserStoreError::Duplicate);
        }

        let user = User {
            id: ObjectId::new(),
            username: username.to_string(),
            password_hash,
            role,
        };

        let Value::Object(doc) = serde_json::to_value(&user).map_err(StoreError::from)? else {
            return Err(StoreError::NotAnObject {
                collection: USERS.to_string(),
                id: user.id.to_hex(),
            }
            .into());
        };

        // Profile first: a user row must never exist without its profile.
        let profile_id = match profile {
            Some(mut profile) => {
                profile.insert("username".to_string(), Value::String(user.username.clone()));
                profile.insert("role".to_string(), Value::String(role.as_str().to_string()));
                Some(self.store.insert_one(PROFILES, profile).await?)
            }
            None => None,
        };

        if let Err(e) = self.store.insert_one(USERS, doc).await {
            if let Some(id) = profile_id {
                if let Err(cleanup) = self.store.delete_one(PROFILES, &Filter::by_id(id)).await {
                    warn!("Orphan profile {} left for {}: {}", id, user.username, cleanup);
                }
            }
            return Err(e.into());
        }

        info!("Created user: {} ({})", user.username, user.role);

        Ok(user)
    }

    pub async fn get_profile(&self, username: &str) -> Result<Option<Document>, StoreError> {
        self.store
            .find_one(PROFILES, &Filter::new().eq("username", username))
            .await
    }

    pub async fn has_admin(&self) -> Result<bool, StoreError> {
        Ok(self
            .store
            .find_one(USERS, &Filter::new().eq("role", UserRole::Admin.as_str()))
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use serde_json::json;

    fn create_test_store() -> UserStore {
        UserStore::new(Arc::new(SqliteDocumentStore::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_create_and_retrieve_user() {
        let store = create_test_store();

        let created = store
            .create_user("amira", "$2b$04$digest".to_string(), UserRole::Student, None)
            .await
            .unwrap();

        let retrieved = store.get_user_by_username("amira").await.unwrap().unwrap();
        assert_eq!(retrieved.id, created.id);
        assert_eq!(retrieved.role, UserRole::Student);
        assert_eq!(retrieved.password_hash, "$2b$04$digest");

        assert!(store.get_user_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected_and_first_record_kept() {
        let store = create_test_store();
        store
            .create_user("amira", "first".to_string(), UserRole::Student, None)
            .await
            .unwrap();

        let second = store
            .create_user("amira", "second".to_string(), UserRole::Admin, None)
            .await;
        assert!(matches!(second, Err(UserStoreError::Duplicate)));

        let kept = store.get_user_by_username("amira").await.unwrap().unwrap();
        assert_eq!(kept.password_hash, "first");
        assert_eq!(kept.role, UserRole::Student);
    }

    #[tokio::test]
    async fn test_profile_is_linked_by_username() {
        let store = create_test_store();
        let profile = json!({"first_name": "Amira", "university": "INSAT"})
            .as_object()
            .cloned();

        store
            .create_user("amira", "digest".to_string(), UserRole::Student, profile)
            .await
            .unwrap();

        let profile = store.get_profile("amira").await.unwrap().unwrap();
        assert_eq!(profile["first_name"], json!("Amira"));
        assert_eq!(profile["username"], json!("amira"));
        assert_eq!(profile["role"], json!("student"));
    }

    #[tokio::test]
    async fn test_has_admin() {
        let store = create_test_store();
        assert!(!store.has_admin().await.unwrap());

        store
            .create_user("s1", "digest".to_string(), UserRole::Student, None)
            .await
            .unwrap();
        assert!(!store.has_admin().await.unwrap());

        store
            .create_user("root", "digest".to_string(), UserRole::Admin, None)
            .await
            .unwrap();
        assert!(store.has_admin().await.unwrap());
    }

    /// Delegates to SQLite but refuses every insert into `users`.
    struct UsersInsertFails(SqliteDocumentStore);

    #[async_trait::async_trait]
    impl DocumentStore for UsersInsertFails {
        async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
            self.0.find_one(collection, filter).await
        }

        async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
            self.0.find(collection, filter).await
        }

        async fn insert_one(&self, collection: &str, doc: Document) -> Result<ObjectId, StoreError> {
            if collection == USERS {
                return Err(StoreError::NotAnObject {
                    collection: collection.to_string(),
                    id: "refused".to_string(),
                });
            }
            self.0.insert_one(collection, doc).await
        }

        async fn update_one(&self, collection: &str, filter: &Filter, set: Document) -> Result<bool, StoreError> {
            self.0.update_one(collection, filter, set).await
        }

        async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
            self.0.delete_one(collection, filter).await
        }
    }

    #[tokio::test]
    async fn test_failed_user_insert_leaves_no_profile() {
        let store = UserStore::new(Arc::new(UsersInsertFails(
            SqliteDocumentStore::open_in_memory().unwrap(),
        )));
        let profile = json!({"first_name": "Amira", "last_name": "Haddad"})
            .as_object()
            .cloned();

        let result = store
            .create_user("amira", "digest".to_string(), UserRole::Admin, profile)
            .await;

        assert!(matches!(result, Err(UserStoreError::Store(_))));
        assert!(store.get_user_by_username("amira").await.unwrap().is_none());
        assert!(store.get_profile("amira").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_take_a_username_once() {
        let store = Arc::new(create_test_store());

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_user("contested", format!("digest-{i}"), UserRole::Student, None)
                    .await
                    .is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }
}
