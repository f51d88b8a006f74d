use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::auth::JwtKeys;
use crate::media::MediaStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// File store for profile pictures and QR images
    pub media: MediaStore,
    /// Token signing/verification keys
    pub jwt: JwtKeys,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// True when a database error is a unique-constraint conflict. The
/// schema's unique indexes are what serialize check-then-create races
/// (duplicate username, second QR row, duplicate claim); callers
/// translate the conflict into the domain outcome.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::register,
        crate::handlers::residents::list_residents,
        crate::handlers::residents::get_profile,
        crate::handlers::residents::upload_profile_picture,
        crate::handlers::users::list_users,
        crate::handlers::users::delete_user,
        crate::handlers::qr::generate_qr,
        crate::handlers::qr::check_qr,
        crate::handlers::relief_goods::list_relief_goods,
        crate::handlers::relief_goods::create_relief_goods,
        crate::handlers::relief_goods::get_relief_goods,
        crate::handlers::relief_goods::delete_relief_goods,
        crate::handlers::relief_goods::claim_relief_goods,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::RefreshRequest,
            crate::handlers::auth::RefreshResponse,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::RegisteredUserResponse,
            crate::handlers::residents::ProfileResponse,
            crate::handlers::residents::ResidentResponse,
            crate::handlers::residents::ProfileDetailResponse,
            crate::handlers::qr::QrCodeResponse,
            crate::handlers::qr::CheckQrResponse,
            crate::handlers::relief_goods::CreateReliefGoodsRequest,
            crate::handlers::relief_goods::ClaimRequest,
            crate::handlers::relief_goods::ClaimerResponse,
            crate::handlers::relief_goods::ReliefGoodsResponse,
            ApiResponse<HealthResponse>,
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::auth::RefreshResponse>,
            ApiResponse<crate::handlers::auth::RegisteredUserResponse>,
            ApiResponse<Vec<crate::handlers::residents::ResidentResponse>>,
            ApiResponse<crate::handlers::residents::ProfileDetailResponse>,
            ApiResponse<crate::handlers::qr::QrCodeResponse>,
            ApiResponse<crate::handlers::qr::CheckQrResponse>,
            ApiResponse<Vec<crate::handlers::relief_goods::ReliefGoodsResponse>>,
            ApiResponse<crate::handlers::relief_goods::ReliefGoodsResponse>,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, token refresh and registration"),
        (name = "residents", description = "Resident directory and profiles"),
        (name = "users", description = "Administrative user management"),
        (name = "qr", description = "Per-resident QR identifier issuance"),
        (name = "relief-goods", description = "Relief-goods batches and claims"),
    ),
    info(
        title = "Balangay API",
        description = "Barangay resident-management backend: resident registration, \
                       QR identifiers and relief-goods distribution tracking",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
