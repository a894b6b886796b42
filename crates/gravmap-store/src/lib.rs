//! Persistence gateway for gravmap.
//!
//! This crate holds the storage abstraction for users, one-time tokens,
//! gravity survey rows and earthquake records. The [`Store`] trait defines
//! every database operation the service issues; two implementations are
//! provided:
//!
//! - [`MemStore`]: in-memory tables behind an async `RwLock`, used by the
//!   test suites and as the fallback backend when no database is
//!   configured.
//! - `PgStore` (feature `postgres-backend`, default): PostgreSQL via sqlx.
//!
//! Both guarantee row-level atomicity per statement and nothing beyond it:
//! the dataset-replace operation is not isolated from concurrent readers,
//! and per-row column updates carry no transactional envelope.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod mem;
#[cfg(feature = "postgres-backend")]
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use mem::MemStore;
#[cfg(feature = "postgres-backend")]
pub use postgres::PgStore;

use async_trait::async_trait;

use gravmap_core::{
    Earthquake, EarthquakeQuery, GravityPoint, GravityRecord, GravityUpdate, NewUser,
    OneTimeToken, TokenKind, User,
};

/// The storage trait defining all database operations.
///
/// This abstracts the persistence gateway so the service can run against
/// PostgreSQL in production and in-memory tables under test.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Gravity dataset
    // =========================================================================

    /// Replace the entire gravity dataset: delete all rows, then bulk-insert
    /// the given points. Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn replace_gravity_data(&self, points: &[GravityPoint]) -> Result<usize>;

    /// Re-insert full records (including derived columns), assigning fresh
    /// ids. Used only by the degraded missing-id write-back path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_gravity_records(&self, records: &[GravityRecord]) -> Result<usize>;

    /// Fetch the full gravity dataset in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_gravity_data(&self) -> Result<Vec<GravityRecord>>;

    /// Delete all gravity rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn clear_gravity_data(&self) -> Result<()>;

    /// Write a single derived column on one row, leaving every other column
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the row does not exist.
    async fn update_gravity_column(&self, id: i64, update: GravityUpdate) -> Result<()>;

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Update only the supplied name fields on a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user does not exist.
    async fn update_user_names(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<()>;

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user does not exist.
    async fn update_password(&self, email: &str, hashed_password: &str) -> Result<()>;

    /// Flip a user's `is_verified` flag to true.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user does not exist.
    async fn mark_verified(&self, email: &str) -> Result<()>;

    // =========================================================================
    // One-time tokens
    // =========================================================================

    /// Store a token of the given kind, deleting any prior token of the
    /// same kind for the same email first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_token(&self, kind: TokenKind, token: &OneTimeToken) -> Result<()>;

    /// Consume a token: if it exists and has not expired, delete it and
    /// return it; otherwise return `None`. The check-and-delete is a single
    /// statement, so a concurrent second consumption of the same token
    /// observes `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn take_token(&self, kind: TokenKind, token: &str) -> Result<Option<OneTimeToken>>;

    // =========================================================================
    // Earthquakes
    // =========================================================================

    /// Fetch earthquakes matching the query bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn query_earthquakes(&self, query: &EarthquakeQuery) -> Result<Vec<Earthquake>>;

    /// Insert earthquake rows. Used by the external ingestion collaborator
    /// and the test suites; the core never writes this table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_earthquakes(&self, quakes: &[Earthquake]) -> Result<usize>;
}
