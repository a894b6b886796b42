//! In-memory storage implementation.
//!
//! Plain tables behind a `tokio::sync::RwLock`; every trait method takes
//! the lock once, which gives the same per-statement atomicity the SQL
//! backend provides. Used by the test suites and as the fallback backend
//! when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use gravmap_core::{
    Earthquake, EarthquakeQuery, GravityPoint, GravityRecord, GravityUpdate, NewUser,
    OneTimeToken, TokenKind, User,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Inner {
    gravity: Vec<GravityRecord>,
    next_gravity_id: i64,
    users: Vec<User>,
    next_user_id: i64,
    reset_tokens: HashMap<String, OneTimeToken>,
    verification_tokens: HashMap<String, OneTimeToken>,
    earthquakes: Vec<Earthquake>,
}

impl Inner {
    fn tokens(&mut self, kind: TokenKind) -> &mut HashMap<String, OneTimeToken> {
        match kind {
            TokenKind::PasswordReset => &mut self.reset_tokens,
            TokenKind::EmailVerification => &mut self.verification_tokens,
        }
    }

    fn user_mut(&mut self, email: &str) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                key: email.to_string(),
            })
    }
}

/// In-memory store backed by `RwLock`-guarded tables.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    // =========================================================================
    // Gravity dataset
    // =========================================================================

    async fn replace_gravity_data(&self, points: &[GravityPoint]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.gravity.clear();
        for &point in points {
            inner.next_gravity_id += 1;
            let mut record = GravityRecord::from_point(point);
            record.id = Some(inner.next_gravity_id);
            inner.gravity.push(record);
        }
        Ok(points.len())
    }

    async fn insert_gravity_records(&self, records: &[GravityRecord]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for record in records {
            inner.next_gravity_id += 1;
            let mut record = record.clone();
            record.id = Some(inner.next_gravity_id);
            inner.gravity.push(record);
        }
        Ok(records.len())
    }

    async fn get_gravity_data(&self) -> Result<Vec<GravityRecord>> {
        Ok(self.inner.read().await.gravity.clone())
    }

    async fn clear_gravity_data(&self) -> Result<()> {
        self.inner.write().await.gravity.clear();
        Ok(())
    }

    async fn update_gravity_column(&self, id: i64, update: GravityUpdate) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .gravity
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| StoreError::NotFound {
                entity: "gravity row",
                key: id.to_string(),
            })?;
        update.apply(record);
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict {
                entity: "user",
                key: user.email,
            });
        }
        inner.next_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: inner.next_user_id,
            email: user.email,
            hashed_password: user.hashed_password,
            first_name: user.first_name,
            last_name: user.last_name,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(stored.clone());
        Ok(stored)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn update_user_names(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(email)?;
        if let Some(first_name) = first_name {
            user.first_name = first_name.to_string();
        }
        if let Some(last_name) = last_name {
            user.last_name = last_name.to_string();
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_password(&self, email: &str, hashed_password: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(email)?;
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(email)?;
        user.is_verified = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // One-time tokens
    // =========================================================================

    async fn put_token(&self, kind: TokenKind, token: &OneTimeToken) -> Result<()> {
        let mut inner = self.inner.write().await;
        let email = token.email.clone();
        let table = inner.tokens(kind);
        table.retain(|_, t| t.email != email);
        table.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn take_token(&self, kind: TokenKind, token: &str) -> Result<Option<OneTimeToken>> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let table = inner.tokens(kind);
        match table.get(token) {
            Some(t) if !t.is_expired(now) => Ok(table.remove(token)),
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Earthquakes
    // =========================================================================

    async fn query_earthquakes(&self, query: &EarthquakeQuery) -> Result<Vec<Earthquake>> {
        Ok(self
            .inner
            .read()
            .await
            .earthquakes
            .iter()
            .filter(|q| query.matches(q))
            .cloned()
            .collect())
    }

    async fn insert_earthquakes(&self, quakes: &[Earthquake]) -> Result<usize> {
        let mut inner = self.inner.write().await;
        inner.earthquakes.extend_from_slice(quakes);
        Ok(quakes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn point(lat: f64) -> GravityPoint {
        GravityPoint {
            latitude: lat,
            longitude: 0.0,
            elevation: 0.0,
            gravity: 980_000.0,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
        }
    }

    #[tokio::test]
    async fn replace_assigns_fresh_stable_ids() {
        let store = MemStore::new();
        store
            .replace_gravity_data(&[point(1.0), point(2.0)])
            .await
            .unwrap();
        let first = store.get_gravity_data().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, Some(1));

        store.replace_gravity_data(&[point(3.0)]).await.unwrap();
        let second = store.get_gravity_data().await.unwrap();
        assert_eq!(second.len(), 1);
        // Ids never repeat across replacements.
        assert_eq!(second[0].id, Some(3));
    }

    #[tokio::test]
    async fn column_update_touches_only_its_column() {
        let store = MemStore::new();
        store.replace_gravity_data(&[point(1.0)]).await.unwrap();
        store
            .update_gravity_column(1, GravityUpdate::Cluster(2))
            .await
            .unwrap();
        store
            .update_gravity_column(1, GravityUpdate::Bouguer(5.5))
            .await
            .unwrap();

        let rows = store.get_gravity_data().await.unwrap();
        assert_eq!(rows[0].cluster, Some(2));
        assert_eq!(rows[0].bouguer, Some(5.5));
        assert_eq!(rows[0].anomaly, None);
    }

    #[tokio::test]
    async fn updating_a_missing_row_is_not_found() {
        let store = MemStore::new();
        let err = store
            .update_gravity_column(99, GravityUpdate::Cluster(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemStore::new();
        store.create_user(new_user("a@b.c")).await.unwrap();
        let err = store.create_user(new_user("a@b.c")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn a_new_token_invalidates_the_prior_one() {
        let store = MemStore::new();
        let first = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "first".into());
        let second = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "second".into());
        store.put_token(TokenKind::PasswordReset, &first).await.unwrap();
        store.put_token(TokenKind::PasswordReset, &second).await.unwrap();

        assert!(store
            .take_token(TokenKind::PasswordReset, "first")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .take_token(TokenKind::PasswordReset, "second")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn a_token_can_only_be_taken_once() {
        let store = MemStore::new();
        let token = OneTimeToken::issue(TokenKind::EmailVerification, "a@b.c", "tok".into());
        store
            .put_token(TokenKind::EmailVerification, &token)
            .await
            .unwrap();

        assert!(store
            .take_token(TokenKind::EmailVerification, "tok")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .take_token(TokenKind::EmailVerification, "tok")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn expired_tokens_are_not_taken() {
        let store = MemStore::new();
        let mut token = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "tok".into());
        token.expires_at = Utc::now() - Duration::minutes(1);
        store.put_token(TokenKind::PasswordReset, &token).await.unwrap();

        assert!(store
            .take_token(TokenKind::PasswordReset, "tok")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn token_kinds_do_not_collide() {
        let store = MemStore::new();
        let reset = OneTimeToken::issue(TokenKind::PasswordReset, "a@b.c", "same".into());
        store.put_token(TokenKind::PasswordReset, &reset).await.unwrap();

        assert!(store
            .take_token(TokenKind::EmailVerification, "same")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .take_token(TokenKind::PasswordReset, "same")
            .await
            .unwrap()
            .is_some());
    }
}
