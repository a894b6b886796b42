//! PostgreSQL storage implementation.
//!
//! Runtime-bound sqlx queries against the tables in [`crate::schema`].
//! Every trait method issues standalone statements: replace is a delete
//! followed by a bulk insert (not isolated from concurrent readers), and
//! column updates are one statement per row. Token consumption is a single
//! conditional `DELETE ... RETURNING`, which is what makes it atomic under
//! concurrent completion attempts.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};

use gravmap_core::{
    Earthquake, EarthquakeQuery, GravityPoint, GravityRecord, GravityUpdate, NewUser,
    OneTimeToken, TokenKind, User,
};

use crate::error::{Result, StoreError};
use crate::{schema, Store};

/// Maximum connections held by the pool.
const MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL-backed storage implementation.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    /// Create any missing tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn init_schema(&self) -> Result<()> {
        for ddl in schema::all_tables() {
            sqlx::query(ddl).execute(&self.pool).await.map_err(db_err)?;
        }
        tracing::info!("database schema checked/created");
        Ok(())
    }

    fn token_table(kind: TokenKind) -> &'static str {
        match kind {
            TokenKind::PasswordReset => "password_reset_tokens",
            TokenKind::EmailVerification => "email_verification_tokens",
        }
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn gravity_from_row(row: &PgRow) -> Result<GravityRecord> {
    Ok(GravityRecord {
        id: Some(row.try_get("id").map_err(db_err)?),
        point: GravityPoint {
            latitude: row.try_get("latitude").map_err(db_err)?,
            longitude: row.try_get("longitude").map_err(db_err)?,
            elevation: row.try_get("elevation").map_err(db_err)?,
            gravity: row.try_get("gravity").map_err(db_err)?,
        },
        bouguer: row.try_get("bouguer").map_err(db_err)?,
        cluster: row.try_get("cluster").map_err(db_err)?,
        anomaly: row.try_get("anomaly").map_err(db_err)?,
        distance_km: row.try_get("distance_km").map_err(db_err)?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        hashed_password: row.try_get("hashed_password").map_err(db_err)?,
        first_name: row.try_get("first_name").map_err(db_err)?,
        last_name: row.try_get("last_name").map_err(db_err)?,
        is_verified: row.try_get("is_verified").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn token_from_row(row: &PgRow) -> Result<OneTimeToken> {
    Ok(OneTimeToken {
        email: row.try_get("email").map_err(db_err)?,
        token: row.try_get("token").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        expires_at: row.try_get("expires_at").map_err(db_err)?,
    })
}

fn earthquake_from_row(row: &PgRow) -> Result<Earthquake> {
    Ok(Earthquake {
        id: row.try_get("id").map_err(db_err)?,
        time: row.try_get("time").map_err(db_err)?,
        latitude: row.try_get("latitude").map_err(db_err)?,
        longitude: row.try_get("longitude").map_err(db_err)?,
        depth: row.try_get("depth").map_err(db_err)?,
        mag: row.try_get("mag").map_err(db_err)?,
        magtype: row.try_get("magtype").map_err(db_err)?,
        net: row.try_get("net").map_err(db_err)?,
        place: row.try_get("place").map_err(db_err)?,
        status: row.try_get("status").map_err(db_err)?,
    })
}

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // Gravity dataset
    // =========================================================================

    async fn replace_gravity_data(&self, points: &[GravityPoint]) -> Result<usize> {
        sqlx::query("DELETE FROM gravity_data")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if points.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO gravity_data (latitude, longitude, elevation, gravity) ",
        );
        builder.push_values(points, |mut b, p| {
            b.push_bind(p.latitude)
                .push_bind(p.longitude)
                .push_bind(p.elevation)
                .push_bind(p.gravity);
        });
        builder.build().execute(&self.pool).await.map_err(db_err)?;

        Ok(points.len())
    }

    async fn insert_gravity_records(&self, records: &[GravityRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO gravity_data \
             (latitude, longitude, elevation, gravity, bouguer, cluster, anomaly, distance_km) ",
        );
        builder.push_values(records, |mut b, r| {
            b.push_bind(r.point.latitude)
                .push_bind(r.point.longitude)
                .push_bind(r.point.elevation)
                .push_bind(r.point.gravity)
                .push_bind(r.bouguer)
                .push_bind(r.cluster)
                .push_bind(r.anomaly)
                .push_bind(r.distance_km);
        });
        builder.build().execute(&self.pool).await.map_err(db_err)?;

        Ok(records.len())
    }

    async fn get_gravity_data(&self) -> Result<Vec<GravityRecord>> {
        let rows = sqlx::query("SELECT * FROM gravity_data ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(gravity_from_row).collect()
    }

    async fn clear_gravity_data(&self) -> Result<()> {
        sqlx::query("DELETE FROM gravity_data")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_gravity_column(&self, id: i64, update: GravityUpdate) -> Result<()> {
        let result = match update {
            GravityUpdate::Bouguer(v) => {
                sqlx::query("UPDATE gravity_data SET bouguer = $1 WHERE id = $2")
                    .bind(v)
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
            GravityUpdate::Cluster(v) => {
                sqlx::query("UPDATE gravity_data SET cluster = $1 WHERE id = $2")
                    .bind(v)
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
            GravityUpdate::Anomaly(v) => {
                sqlx::query("UPDATE gravity_data SET anomaly = $1 WHERE id = $2")
                    .bind(v)
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
            GravityUpdate::DistanceKm(v) => {
                sqlx::query("UPDATE gravity_data SET distance_km = $1 WHERE id = $2")
                    .bind(v)
                    .bind(id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "gravity row",
                key: id.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO users \
             (email, hashed_password, first_name, last_name, is_verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5, $5) \
             RETURNING *",
        )
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
                entity: "user",
                key: user.email.clone(),
            },
            _ => db_err(e),
        })?;

        user_from_row(&row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update_user_names(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET \
             first_name = COALESCE($1, first_name), \
             last_name = COALESCE($2, last_name), \
             updated_at = $3 \
             WHERE email = $4",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(Utc::now())
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                key: email.to_string(),
            });
        }
        Ok(())
    }

    async fn update_password(&self, email: &str, hashed_password: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET hashed_password = $1, updated_at = $2 WHERE email = $3")
                .bind(hashed_password)
                .bind(Utc::now())
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                key: email.to_string(),
            });
        }
        Ok(())
    }

    async fn mark_verified(&self, email: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = $1 WHERE email = $2")
                .bind(Utc::now())
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "user",
                key: email.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // One-time tokens
    // =========================================================================

    async fn put_token(&self, kind: TokenKind, token: &OneTimeToken) -> Result<()> {
        let table = Self::token_table(kind);

        sqlx::query(&format!("DELETE FROM {table} WHERE email = $1"))
            .bind(&token.email)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        sqlx::query(&format!(
            "INSERT INTO {table} (email, token, created_at, expires_at) VALUES ($1, $2, $3, $4)"
        ))
        .bind(&token.email)
        .bind(&token.token)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn take_token(&self, kind: TokenKind, token: &str) -> Result<Option<OneTimeToken>> {
        let table = Self::token_table(kind);
        let row = sqlx::query(&format!(
            "DELETE FROM {table} WHERE token = $1 AND expires_at > $2 \
             RETURNING email, token, created_at, expires_at"
        ))
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(token_from_row).transpose()
    }

    // =========================================================================
    // Earthquakes
    // =========================================================================

    async fn query_earthquakes(&self, query: &EarthquakeQuery) -> Result<Vec<Earthquake>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM earthquakes WHERE time >= ");
        builder.push_bind(query.start_date);
        builder.push(" AND time <= ");
        builder.push_bind(query.end_date);
        if let Some(min_mag) = query.min_mag {
            builder.push(" AND mag >= ");
            builder.push_bind(min_mag);
        }
        if let Some(max_mag) = query.max_mag {
            builder.push(" AND mag <= ");
            builder.push_bind(max_mag);
        }
        if let Some(min_depth) = query.min_depth {
            builder.push(" AND depth >= ");
            builder.push_bind(min_depth);
        }
        if let Some(max_depth) = query.max_depth {
            builder.push(" AND depth <= ");
            builder.push_bind(max_depth);
        }
        builder.push(" ORDER BY time");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(earthquake_from_row).collect()
    }

    async fn insert_earthquakes(&self, quakes: &[Earthquake]) -> Result<usize> {
        if quakes.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO earthquakes \
             (id, time, latitude, longitude, depth, mag, magtype, net, place, status) ",
        );
        builder.push_values(quakes, |mut b, q| {
            b.push_bind(&q.id)
                .push_bind(q.time)
                .push_bind(q.latitude)
                .push_bind(q.longitude)
                .push_bind(q.depth)
                .push_bind(q.mag)
                .push_bind(&q.magtype)
                .push_bind(&q.net)
                .push_bind(&q.place)
                .push_bind(&q.status);
        });
        builder.build().execute(&self.pool).await.map_err(db_err)?;

        Ok(quakes.len())
    }
}
