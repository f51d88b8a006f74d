use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{qr_code, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::media::QR_CODES;
use crate::qr;
use crate::schemas::{is_unique_violation, ApiResponse, AppState, ErrorResponse};

/// Issued QR projection; `qr` is a fully-qualified image URL
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QrCodeResponse {
    pub id: i32,
    pub resident_id: i32,
    pub qr: String,
}

impl QrCodeResponse {
    fn from_model(model: &qr_code::Model, state: &AppState) -> Self {
        Self {
            id: model.id,
            resident_id: model.resident_id,
            qr: state.media.url(&model.qr),
        }
    }
}

/// Read-only existence check result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckQrResponse {
    pub has_qr: bool,
    pub qr: Option<String>,
}

/// Issue a QR identifier for a resident, or return the existing one.
///
/// Issuance is idempotent: the first call creates the image and row
/// (201), every later call returns the same row (200). Two concurrent
/// first calls are serialized by the unique index on `resident_id`;
/// the losing insert re-reads the winner's row.
#[utoipa::path(
    post,
    path = "/generate-qr/{user_id}/",
    tag = "qr",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 201, description = "QR code generated", body = ApiResponse<QrCodeResponse>),
        (status = 200, description = "QR code already exists", body = ApiResponse<QrCodeResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate_qr(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<QrCodeResponse>>), StatusCode> {
    debug!("QR issuance requested for user {}", user_id);

    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("User {} not found for QR issuance", user_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", user_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    if let Some(existing) = find_qr(&state, user_id).await? {
        debug!("QR already issued for user {}", user_id);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: QrCodeResponse::from_model(&existing, &state),
                message: "QR code already exists".to_string(),
                success: true,
            }),
        ));
    }

    let png = match qr::encode_user_id(user_id) {
        Ok(png) => png,
        Err(encode_error) => {
            error!("Failed to render QR for user {}: {}", user_id, encode_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let relative = match state
        .media
        .save(QR_CODES, &qr::file_name(user_id), &png)
        .await
    {
        Ok(relative) => relative,
        Err(media_error) => {
            error!("Failed to store QR image for user {}: {}", user_id, media_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let new_row = qr_code::ActiveModel {
        resident_id: Set(user_id),
        qr: Set(relative),
        ..Default::default()
    };

    match new_row.insert(&state.db).await {
        Ok(created) => {
            info!("Issued QR code for user {}", user_id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: QrCodeResponse::from_model(&created, &state),
                    message: "QR code generated".to_string(),
                    success: true,
                }),
            ))
        }
        Err(db_error) if is_unique_violation(&db_error) => {
            // Lost a concurrent issuance race; the winner's row is the
            // canonical one. The image write was keyed by user id, so
            // both writers produced the same blob.
            debug!("Concurrent QR issuance for user {}, returning winner", user_id);
            match find_qr(&state, user_id).await? {
                Some(existing) => Ok((
                    StatusCode::OK,
                    Json(ApiResponse {
                        data: QrCodeResponse::from_model(&existing, &state),
                        message: "QR code already exists".to_string(),
                        success: true,
                    }),
                )),
                None => {
                    error!("QR row vanished after conflict for user {}", user_id);
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        }
        Err(db_error) => {
            error!("Failed to insert QR row for user {}: {}", user_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Check whether a resident has an issued QR code. Never creates one.
#[utoipa::path(
    get,
    path = "/check-qr/{user_id}/",
    tag = "qr",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Existence check result", body = ApiResponse<CheckQrResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn check_qr(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CheckQrResponse>>, StatusCode> {
    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("User {} not found for QR check", user_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", user_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let existing = find_qr(&state, user_id).await?;
    Ok(Json(ApiResponse {
        data: CheckQrResponse {
            has_qr: existing.is_some(),
            qr: existing.as_ref().map(|model| state.media.url(&model.qr)),
        },
        message: "QR status retrieved".to_string(),
        success: true,
    }))
}

async fn find_qr(state: &AppState, user_id: i32) -> Result<Option<qr_code::Model>, StatusCode> {
    qr_code::Entity::find()
        .filter(qr_code::Column::ResidentId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load QR row for user {}: {}", user_id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
