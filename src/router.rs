use crate::handlers::{
    auth::{login, refresh_token, register},
    health::health_check,
    qr::{check_qr, generate_qr},
    relief_goods::{
        claim_relief_goods, create_relief_goods, delete_relief_goods, get_relief_goods,
        list_relief_goods,
    },
    residents::{get_profile, list_residents, upload_profile_picture},
    users::{delete_user, list_users},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh_token))
        .route("/register/", post(register))
        // Resident directory
        .route("/residents/", get(list_residents))
        .route("/profile/:user_id/", get(get_profile))
        .route("/profile/:user_id/upload-picture/", put(upload_profile_picture))
        // QR issuance
        .route("/generate-qr/:user_id/", post(generate_qr))
        .route("/check-qr/:user_id/", get(check_qr))
        // Relief goods
        .route("/relief-goods/", get(list_relief_goods).post(create_relief_goods))
        .route("/relief-goods/:id/", get(get_relief_goods))
        .route("/relief-goods/:id/delete/", delete(delete_relief_goods))
        .route("/reliefgoods/:pk/claim/", post(claim_relief_goods))
        // User administration
        .route("/users/", get(list_users))
        .route("/users/delete/:pk/", delete(delete_user))
        // Stored media (profile pictures, QR images)
        .nest_service("/media", ServeDir::new(state.media.root().to_path_buf()))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
