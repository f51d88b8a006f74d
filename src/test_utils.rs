#[cfg(test)]
pub mod test_utils {
    use crate::auth::{hash_password, JwtKeys};
    use crate::media::MediaStore;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Cascade deletes need foreign keys enforced
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing, with a staff account and a
    /// superuser account already present
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        let staff = model::entities::user::ActiveModel {
            username: Set("admin".to_string()),
            password_hash: Set(hash_password("adminpass").expect("Failed to hash password")),
            first_name: Set("Admin".to_string()),
            last_name: Set(String::new()),
            email: Set("admin@example.com".to_string()),
            is_staff: Set(true),
            is_superuser: Set(false),
            ..Default::default()
        };
        staff.insert(&db).await.expect("Failed to create staff user");

        let superuser = model::entities::user::ActiveModel {
            username: Set("root".to_string()),
            password_hash: Set(hash_password("rootpass").expect("Failed to hash password")),
            first_name: Set("Root".to_string()),
            last_name: Set(String::new()),
            email: Set("root@example.com".to_string()),
            is_staff: Set(true),
            is_superuser: Set(true),
            ..Default::default()
        };
        superuser
            .insert(&db)
            .await
            .expect("Failed to create superuser");

        let media_root = tempfile::tempdir()
            .expect("Failed to create media dir")
            .into_path();
        let media = MediaStore::new(media_root, "http://localhost:3000/media");

        let jwt = JwtKeys::new(b"test-secret", 3600, 86400);

        AppState { db, media, jwt }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment
    /// variable, defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        create_router(state)
    }
}
