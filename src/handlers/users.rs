use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{profile, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, error, info, instrument, warn};

use crate::auth::StaffUser;
use crate::handlers::residents::ResidentResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// List every non-superuser account (staff included) with profiles
#[utoipa::path(
    get,
    path = "/users/",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<ResidentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ResidentResponse>>>, StatusCode> {
    debug!("Fetching all non-superuser users");

    let rows = user::Entity::find()
        .filter(user::Column::IsSuperuser.eq(false))
        .order_by_asc(user::Column::Id)
        .find_also_related(profile::Entity)
        .all(&state.db)
        .await;

    match rows {
        Ok(pairs) => {
            let users: Vec<ResidentResponse> = pairs
                .into_iter()
                .map(|(user_model, profile_model)| {
                    ResidentResponse::from_pair(user_model, profile_model, &state.media)
                })
                .collect();

            info!("Retrieved {} users", users.len());
            Ok(Json(ApiResponse {
                data: users,
                message: "Users retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(db_error) => {
            error!("Failed to retrieve users: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Hard-delete a user. The profile, QR record and any claim
/// associations go with it (database cascade).
#[utoipa::path(
    delete,
    path = "/users/delete/{pk}/",
    tag = "users",
    params(
        ("pk" = i32, Path, description = "User ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, staff))]
pub async fn delete_user(
    Path(pk): Path<i32>,
    State(state): State<AppState>,
    staff: StaffUser,
) -> Result<StatusCode, StatusCode> {
    debug!(
        "Staff '{}' deleting user with ID: {}",
        staff.0.username, pk
    );

    match user::Entity::delete_by_id(pk).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("User {} deleted, owned rows cascaded", pk);
                Ok(StatusCode::NO_CONTENT)
            } else {
                warn!("User {} not found for deletion", pk);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete user {}: {}", pk, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
