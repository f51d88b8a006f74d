use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DbBackend};
use tracing::{info, warn};

use crate::auth::JwtKeys;
use crate::media::MediaStore;
use crate::schemas::AppState;

/// Initialize application state for a given database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    // Cascade deletes depend on foreign-key enforcement, which SQLite
    // leaves off by default
    if db.get_database_backend() == DbBackend::Sqlite {
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    }

    let media_root =
        std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
    let media_base_url = std::env::var("MEDIA_BASE_URL")
        .unwrap_or_else(|_| format!("http://{}/media", get_bind_address()));
    let media = MediaStore::new(media_root, media_base_url);

    let jwt = jwt_keys_from_env();

    Ok(AppState { db, media, jwt })
}

/// Token keys and lifetimes from the environment
pub fn jwt_keys_from_env() -> JwtKeys {
    let secret = match std::env::var("JWT_SECRET") {
        Ok(secret) => secret,
        Err(_) => {
            warn!("JWT_SECRET is not set, using an insecure development secret");
            "balangay-insecure-dev-secret".to_string()
        }
    };

    let access_ttl = env_i64("ACCESS_TOKEN_TTL_SECS", 3600);
    let refresh_ttl = env_i64("REFRESH_TOKEN_TTL_SECS", 86400);
    info!(
        "Token lifetimes: access {}s, refresh {}s",
        access_ttl, refresh_ttl
    );

    JwtKeys::new(secret.as_bytes(), access_ttl, refresh_ttl)
}

/// Get bind address from environment or use default
pub fn get_bind_address() -> String {
    std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
