use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{profile, qr_code, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::media::{MediaStore, PROFILE_PICTURES};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Nested profile projection; file fields are fully-qualified URLs
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub purok: Option<String>,
    pub address: Option<String>,
    pub family_members: String,
    pub profile_picture: Option<String>,
}

impl ProfileResponse {
    pub fn from_model(model: &profile::Model, media: &MediaStore) -> Self {
        Self {
            purok: model.purok.clone(),
            address: model.address.clone(),
            family_members: model.family_members.clone(),
            profile_picture: model
                .profile_picture
                .as_deref()
                .map(|relative| media.url(relative)),
        }
    }
}

/// Directory listing entry: user identity with nested profile
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResidentResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    /// Null when no profile row exists for the user
    pub profile: Option<ProfileResponse>,
}

impl ResidentResponse {
    pub(crate) fn from_pair(
        user_model: user::Model,
        profile_model: Option<profile::Model>,
        media: &MediaStore,
    ) -> Self {
        Self {
            id: user_model.id,
            username: user_model.username,
            first_name: user_model.first_name,
            last_name: user_model.last_name,
            email: user_model.email,
            is_staff: user_model.is_staff,
            profile: profile_model
                .as_ref()
                .map(|model| ProfileResponse::from_model(model, media)),
        }
    }
}

/// Full profile projection including the QR image URL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileDetailResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub profile: Option<ProfileResponse>,
    pub qr: Option<String>,
}

/// List residents: non-staff, non-superuser users with nested profiles
#[utoipa::path(
    get,
    path = "/residents/",
    tag = "residents",
    responses(
        (status = 200, description = "Residents retrieved successfully", body = ApiResponse<Vec<ResidentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_residents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ResidentResponse>>>, StatusCode> {
    debug!("Fetching resident directory");

    let rows = user::Entity::find()
        .filter(user::Column::IsStaff.eq(false))
        .filter(user::Column::IsSuperuser.eq(false))
        .order_by_asc(user::Column::Id)
        .find_also_related(profile::Entity)
        .all(&state.db)
        .await;

    match rows {
        Ok(pairs) => {
            let residents: Vec<ResidentResponse> = pairs
                .into_iter()
                .map(|(user_model, profile_model)| {
                    ResidentResponse::from_pair(user_model, profile_model, &state.media)
                })
                .collect();

            info!("Retrieved {} residents", residents.len());
            Ok(Json(ApiResponse {
                data: residents,
                message: "Residents retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to retrieve residents: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Full profile + QR URL projection for one user
#[utoipa::path(
    get,
    path = "/profile/{user_id}/",
    tag = "residents",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileDetailResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_profile(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProfileDetailResponse>>, StatusCode> {
    debug!("Fetching profile for user {}", user_id);

    let user_model = match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(user_model)) => user_model,
        Ok(None) => {
            warn!("User {} not found", user_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", user_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let profile_model = match profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
    {
        Ok(model) => model,
        Err(db_error) => {
            error!("Failed to load profile for user {}: {}", user_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let qr_model = match qr_code::Entity::find()
        .filter(qr_code::Column::ResidentId.eq(user_id))
        .one(&state.db)
        .await
    {
        Ok(model) => model,
        Err(db_error) => {
            error!("Failed to load QR row for user {}: {}", user_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(ApiResponse {
        data: ProfileDetailResponse {
            id: user_model.id,
            username: user_model.username,
            first_name: user_model.first_name,
            last_name: user_model.last_name,
            email: user_model.email,
            is_staff: user_model.is_staff,
            is_superuser: user_model.is_superuser,
            profile: profile_model
                .as_ref()
                .map(|model| ProfileResponse::from_model(model, &state.media)),
            qr: qr_model.as_ref().map(|model| state.media.url(&model.qr)),
        },
        message: "Profile retrieved successfully".to_string(),
        success: true,
    }))
}

/// Partial update of the profile-picture field via multipart upload
#[utoipa::path(
    put,
    path = "/profile/{user_id}/upload-picture/",
    tag = "residents",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Profile picture updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Missing file or unsupported extension", body = ErrorResponse),
        (status = 404, description = "No profile exists for this user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn upload_profile_picture(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ProfileResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Uploading profile picture for user {}", user_id);

    let profile_model = match profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
    {
        Ok(Some(model)) => model,
        Ok(None) => {
            warn!("No profile exists for user {}", user_id);
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(
                    format!("No profile exists for user {user_id}"),
                    "NOT_FOUND",
                )),
            ));
        }
        Err(db_error) => {
            error!("Failed to load profile for user {}: {}", user_id, db_error);
            return Err(internal_error());
        }
    };

    // Take the first file field regardless of its form name; clients
    // typically send it as `profile_picture`
    let mut upload: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(file_name) = field.file_name().map(|name| name.to_string()) else {
                    continue;
                };
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((file_name, bytes.to_vec()));
                        break;
                    }
                    Err(multipart_error) => {
                        warn!("Failed to read uploaded file: {}", multipart_error);
                        return Err(bad_upload("Could not read the uploaded file"));
                    }
                }
            }
            Ok(None) => break,
            Err(multipart_error) => {
                warn!("Malformed multipart body: {}", multipart_error);
                return Err(bad_upload("Malformed multipart body"));
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(bad_upload("No file was supplied"));
    };

    // Client names may carry path fragments; keep only the bare name
    // so the blob stays inside the profile_pictures namespace
    let file_name = match MediaStore::sanitize_file_name(&file_name) {
        Ok(bare) => bare,
        Err(_) => {
            warn!("Rejected upload name '{}' for user {}", file_name, user_id);
            return Err(bad_upload("Invalid file name"));
        }
    };

    if MediaStore::validate_image_extension(&file_name).is_err() {
        warn!("Rejected upload '{}' for user {}", file_name, user_id);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Unsupported file extension (allowed: jpg, jpeg, png)",
                "UNSUPPORTED_FILE_EXTENSION",
            )),
        ));
    }

    let stored_name = format!("user_{user_id}_{file_name}");
    let relative = match state
        .media
        .save(PROFILE_PICTURES, &stored_name, &bytes)
        .await
    {
        Ok(relative) => relative,
        Err(media_error) => {
            error!("Failed to store profile picture: {}", media_error);
            return Err(internal_error());
        }
    };

    let mut profile_active = profile_model.into_active_model();
    profile_active.profile_picture = Set(Some(relative));

    match profile_active.update(&state.db).await {
        Ok(updated) => {
            info!("Updated profile picture for user {}", user_id);
            Ok(Json(ApiResponse {
                data: ProfileResponse::from_model(&updated, &state.media),
                message: "Profile picture updated successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!(
                "Failed to update profile picture for user {}: {}",
                user_id, db_error
            );
            Err(internal_error())
        }
    }
}

fn bad_upload(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, "VALIDATION_ERROR")),
    )
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR")),
    )
}
