use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::{profile, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{self, TOKEN_TYPE_REFRESH};
use crate::handlers::residents::ProfileResponse;
use crate::schemas::{is_unique_violation, ApiResponse, AppState, ErrorResponse};

/// Request body for authenticating a user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token pair plus the caller's identity, mirroring the claims embedded
/// in the access token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Request body for exchanging a refresh token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
}

/// Request body for registering a resident. Family members has its own
/// field here; it is not smuggled through an identity field.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[validate(length(min = 1, message = "family_members is required"))]
    pub family_members: String,
    pub purok: Option<String>,
    pub address: Option<String>,
}

/// Newly registered resident projection (never includes the password)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUserResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub profile: ProfileResponse,
}

/// Authenticate a user and issue an access/refresh token pair
#[utoipa::path(
    post,
    path = "/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated successfully", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Bad credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Login attempt");

    let user_row = match user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
    {
        Ok(row) => row,
        Err(db_error) => {
            error!("Failed to look up user for login: {}", db_error);
            return Err(internal_error());
        }
    };

    // Same rejection whether the username or the password was wrong
    let user_model = match user_row {
        Some(user_model) if auth::verify_password(&request.password, &user_model.password_hash) => {
            user_model
        }
        _ => {
            warn!("Rejected login attempt");
            return Err(invalid_credentials());
        }
    };

    let pair = match state.jwt.issue_pair(&user_model) {
        Ok(pair) => pair,
        Err(auth_error) => {
            error!("Failed to issue token pair: {}", auth_error);
            return Err(internal_error());
        }
    };

    info!("User '{}' authenticated", user_model.username);
    Ok(Json(ApiResponse {
        data: LoginResponse {
            access: pair.access,
            refresh: pair.refresh,
            username: user_model.username,
            email: user_model.email,
            first_name: user_model.first_name,
            last_name: user_model.last_name,
            is_staff: user_model.is_staff,
            is_superuser: user_model.is_superuser,
        },
        message: "Authenticated successfully".to_string(),
        success: true,
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = ApiResponse<RefreshResponse>),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let claims = match state.jwt.decode(&request.refresh, TOKEN_TYPE_REFRESH) {
        Ok(claims) => claims,
        Err(_) => {
            warn!("Rejected refresh with invalid token");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Refresh token is invalid or expired",
                    "INVALID_TOKEN",
                )),
            ));
        }
    };

    let access = match state.jwt.issue_access_from(&claims) {
        Ok(access) => access,
        Err(auth_error) => {
            error!("Failed to issue access token: {}", auth_error);
            return Err(internal_error());
        }
    };

    debug!("Issued new access token for user '{}'", claims.username);
    Ok(Json(ApiResponse {
        data: RefreshResponse { access },
        message: "Access token refreshed".to_string(),
        success: true,
    }))
}

/// Register a resident: creates the user and its profile atomically
#[utoipa::path(
    post,
    path = "/register/",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Resident registered", body = ApiResponse<RegisteredUserResponse>),
        (status = 400, description = "Validation failed or username taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUserResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    if let Err(validation_errors) = request.validate() {
        debug!("Registration rejected by validation: {}", validation_errors);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                validation_errors.to_string(),
                "VALIDATION_ERROR",
            )),
        ));
    }

    let password_hash = match auth::hash_password(&request.password) {
        Ok(hash) => hash,
        Err(auth_error) => {
            error!("Failed to hash password: {}", auth_error);
            return Err(internal_error());
        }
    };

    // User and profile are created in one transaction so a failed
    // profile insert never leaves a profileless user behind
    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(db_error) => {
            error!("Failed to open transaction: {}", db_error);
            return Err(internal_error());
        }
    };

    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        password_hash: Set(password_hash),
        first_name: Set(request.first_name.clone()),
        last_name: Set(String::new()),
        email: Set(String::new()),
        is_staff: Set(false),
        is_superuser: Set(false),
        ..Default::default()
    };

    let user_model = match new_user.insert(&txn).await {
        Ok(user_model) => user_model,
        Err(db_error) if is_unique_violation(&db_error) => {
            warn!("Registration rejected, username already taken");
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    format!("Username '{}' already exists", request.username),
                    "USERNAME_ALREADY_EXISTS",
                )),
            ));
        }
        Err(db_error) => {
            error!("Failed to insert user: {}", db_error);
            return Err(internal_error());
        }
    };

    let new_profile = profile::ActiveModel {
        user_id: Set(user_model.id),
        purok: Set(request.purok.clone()),
        address: Set(request.address.clone()),
        family_members: Set(request.family_members.clone()),
        profile_picture: Set(None),
        ..Default::default()
    };

    let profile_model = match new_profile.insert(&txn).await {
        Ok(profile_model) => profile_model,
        Err(db_error) => {
            error!("Failed to insert profile: {}", db_error);
            return Err(internal_error());
        }
    };

    if let Err(db_error) = txn.commit().await {
        error!("Failed to commit registration: {}", db_error);
        return Err(internal_error());
    }

    info!(
        "Registered resident '{}' with ID {}",
        user_model.username, user_model.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: RegisteredUserResponse {
                id: user_model.id,
                username: user_model.username,
                first_name: user_model.first_name,
                profile: ProfileResponse::from_model(&profile_model, &state.media),
            },
            message: "Resident registered successfully".to_string(),
            success: true,
        }),
    ))
}

fn invalid_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            "No active account found with the given credentials",
            "INVALID_CREDENTIALS",
        )),
    )
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR")),
    )
}
