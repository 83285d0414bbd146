use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::auth::repo_types::{Account, NewAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for accounts.
///
/// `insert_if_absent` must be atomic with respect to the email: two concurrent
/// inserts for the same address produce one account and one `EmailTaken`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn insert_if_absent(&self, account: NewAccount) -> Result<Account, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, avatar, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, avatar, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn insert_if_absent(&self, account: NewAccount) -> Result<Account, StoreError> {
        // Relies on the unique index on users(email).
        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (id, name, email, avatar, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, avatar, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.avatar)
        .bind(&account.password_hash)
        .fetch_optional(&self.db)
        .await?;

        match created {
            Some(a) => {
                debug!(user_id = %a.id, "account inserted");
                Ok(a)
            }
            None => Err(StoreError::EmailTaken),
        }
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;

#[cfg(test)]
mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::{StoreError, UserStore};
    use crate::auth::repo_types::{Account, NewAccount};

    /// In-process store keyed by email, used by tests in place of Postgres.
    #[derive(Default)]
    pub struct MemoryUserStore {
        by_email: Mutex<HashMap<String, Account>>,
    }

    impl MemoryUserStore {
        pub fn len(&self) -> usize {
            self.by_email.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
            Ok(self.by_email.lock().unwrap().get(email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
            Ok(self
                .by_email
                .lock()
                .unwrap()
                .values()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn insert_if_absent(&self, account: NewAccount) -> Result<Account, StoreError> {
            let mut map = self.by_email.lock().unwrap();
            if map.contains_key(&account.email) {
                return Err(StoreError::EmailTaken);
            }
            let created = Account {
                id: Uuid::new_v4(),
                name: account.name,
                email: account.email.clone(),
                avatar: account.avatar,
                password_hash: account.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            map.insert(account.email, created.clone());
            Ok(created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ada".into(),
            email: email.into(),
            avatar: "https://example.test/a".into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        let first = store
            .insert_if_absent(new_account("ada@example.com"))
            .await
            .expect("first insert");
        let err = store
            .insert_if_absent(new_account("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
        assert_eq!(store.len(), 1);

        let found = store.find_by_id(first.id).await.unwrap().expect("by id");
        assert_eq!(found.email, "ada@example.com");
    }

    #[tokio::test]
    async fn memory_store_concurrent_inserts_create_one_account() {
        let store = std::sync::Arc::new(MemoryUserStore::default());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_if_absent(new_account("race@example.com")).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.len(), 1);
    }
}
