//! SQL schema definitions for the PostgreSQL backend.

/// DDL per table, applied in order at startup.
pub mod ddl {
    /// Registered users.
    pub const USERS: &str = "CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email VARCHAR(255) UNIQUE NOT NULL,
        hashed_password VARCHAR(255) NOT NULL,
        first_name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255) NOT NULL,
        is_verified BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )";

    /// Single-use password-reset tokens, at most one active per email.
    pub const PASSWORD_RESET_TOKENS: &str = "CREATE TABLE IF NOT EXISTS password_reset_tokens (
        id BIGSERIAL PRIMARY KEY,
        email VARCHAR(255) NOT NULL,
        token VARCHAR(255) UNIQUE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )";

    /// Single-use email-verification tokens, at most one active per email.
    pub const EMAIL_VERIFICATION_TOKENS: &str =
        "CREATE TABLE IF NOT EXISTS email_verification_tokens (
        id BIGSERIAL PRIMARY KEY,
        email VARCHAR(255) NOT NULL,
        token VARCHAR(255) UNIQUE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        expires_at TIMESTAMPTZ NOT NULL
    )";

    /// Gravity survey rows with nullable derived columns.
    pub const GRAVITY_DATA: &str = "CREATE TABLE IF NOT EXISTS gravity_data (
        id BIGSERIAL PRIMARY KEY,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        elevation DOUBLE PRECISION NOT NULL,
        gravity DOUBLE PRECISION NOT NULL,
        bouguer DOUBLE PRECISION,
        cluster INTEGER,
        anomaly INTEGER,
        distance_km DOUBLE PRECISION
    )";

    /// Earthquake catalogue, populated by an external ingestion process.
    pub const EARTHQUAKES: &str = "CREATE TABLE IF NOT EXISTS earthquakes (
        id VARCHAR(100) PRIMARY KEY,
        time TIMESTAMPTZ NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        depth DOUBLE PRECISION NOT NULL,
        mag DOUBLE PRECISION NOT NULL,
        magtype VARCHAR(50),
        net VARCHAR(50),
        place VARCHAR(255),
        status VARCHAR(50)
    )";
}

/// All table DDL statements, in creation order.
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![
        ddl::USERS,
        ddl::PASSWORD_RESET_TOKENS,
        ddl::EMAIL_VERIFICATION_TOKENS,
        ddl::GRAVITY_DATA,
        ddl::EARTHQUAKES,
    ]
}
