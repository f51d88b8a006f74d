use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::{relief_goods, relief_goods_claim, user};
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::StaffUser;
use crate::schemas::{is_unique_violation, ApiResponse, AppState, ErrorResponse};

/// Request body for creating a batch; `date_issued` is always
/// server-assigned
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReliefGoodsRequest {
    pub name: String,
}

/// Request body for claiming a batch
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ClaimRequest {
    /// Claiming resident; rejected with 400 when absent
    pub user_id: Option<i32>,
}

/// Identity of a resident who claimed a batch
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClaimerResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for ClaimerResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
        }
    }
}

/// Batch projection with nested claimer identities
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReliefGoodsResponse {
    pub id: i32,
    pub name: String,
    pub date_issued: DateTime<Utc>,
    pub claimed_by: Vec<ClaimerResponse>,
}

impl ReliefGoodsResponse {
    fn new(batch: relief_goods::Model, claimers: Vec<user::Model>) -> Self {
        Self {
            id: batch.id,
            name: batch.name,
            date_issued: batch.date_issued,
            claimed_by: claimers.into_iter().map(ClaimerResponse::from).collect(),
        }
    }
}

/// List all batches, most recently issued first
#[utoipa::path(
    get,
    path = "/relief-goods/",
    tag = "relief-goods",
    responses(
        (status = 200, description = "Batches retrieved successfully", body = ApiResponse<Vec<ReliefGoodsResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_relief_goods(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ReliefGoodsResponse>>>, StatusCode> {
    debug!("Fetching relief-goods batches");

    let batches = match relief_goods::Entity::find()
        .order_by_desc(relief_goods::Column::DateIssued)
        .all(&state.db)
        .await
    {
        Ok(batches) => batches,
        Err(db_error) => {
            error!("Failed to retrieve batches: {}", db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut responses = Vec::with_capacity(batches.len());
    for batch in batches {
        let claimers = load_claimers(&state, &batch).await?;
        responses.push(ReliefGoodsResponse::new(batch, claimers));
    }

    info!("Retrieved {} relief-goods batches", responses.len());
    Ok(Json(ApiResponse {
        data: responses,
        message: "Relief goods retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create a batch with an empty claim set (staff only)
#[utoipa::path(
    post,
    path = "/relief-goods/",
    tag = "relief-goods",
    request_body = CreateReliefGoodsRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Batch created", body = ApiResponse<ReliefGoodsResponse>),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, staff))]
pub async fn create_relief_goods(
    State(state): State<AppState>,
    staff: StaffUser,
    Json(request): Json<CreateReliefGoodsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReliefGoodsResponse>>), StatusCode> {
    debug!(
        "Staff '{}' creating relief-goods batch '{}'",
        staff.0.username, request.name
    );

    let new_batch = relief_goods::ActiveModel {
        name: Set(request.name.clone()),
        date_issued: Set(Utc::now()),
        ..Default::default()
    };

    match new_batch.insert(&state.db).await {
        Ok(batch) => {
            info!("Created relief-goods batch '{}' with ID {}", batch.name, batch.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse {
                    data: ReliefGoodsResponse::new(batch, Vec::new()),
                    message: "Relief goods created successfully".to_string(),
                    success: true,
                }),
            ))
        }
        Err(db_error) => {
            error!("Failed to create batch '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Batch detail with claimer identities
#[utoipa::path(
    get,
    path = "/relief-goods/{id}/",
    tag = "relief-goods",
    params(
        ("id" = i32, Path, description = "Batch ID"),
    ),
    responses(
        (status = 200, description = "Batch retrieved successfully", body = ApiResponse<ReliefGoodsResponse>),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_relief_goods(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReliefGoodsResponse>>, StatusCode> {
    let batch = find_batch(&state, id).await?;
    let claimers = load_claimers(&state, &batch).await?;

    Ok(Json(ApiResponse {
        data: ReliefGoodsResponse::new(batch, claimers),
        message: "Relief goods retrieved successfully".to_string(),
        success: true,
    }))
}

/// Delete a batch and its claim associations (staff only)
#[utoipa::path(
    delete,
    path = "/relief-goods/{id}/delete/",
    tag = "relief-goods",
    params(
        ("id" = i32, Path, description = "Batch ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, staff))]
pub async fn delete_relief_goods(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    staff: StaffUser,
) -> Result<StatusCode, StatusCode> {
    debug!("Staff '{}' deleting batch {}", staff.0.username, id);

    match relief_goods::Entity::delete_by_id(id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Deleted relief-goods batch {}", id);
                Ok(StatusCode::NO_CONTENT)
            } else {
                warn!("Batch {} not found for deletion", id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete batch {}: {}", id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Record a resident's claim on a batch.
///
/// The claim insert and the duplicate check are one atomic operation:
/// the join table's composite primary key rejects a second claim for
/// the same `(batch, user)` pair, including under concurrent requests.
#[utoipa::path(
    post,
    path = "/reliefgoods/{pk}/claim/",
    tag = "relief-goods",
    params(
        ("pk" = i32, Path, description = "Batch ID"),
    ),
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Claim recorded, updated batch returned", body = ApiResponse<ReliefGoodsResponse>),
        (status = 400, description = "Missing user_id or already claimed", body = ErrorResponse),
        (status = 404, description = "Batch or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn claim_relief_goods(
    Path(pk): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ApiResponse<ReliefGoodsResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let Some(user_id) = request.user_id else {
        debug!("Claim on batch {} rejected, no user_id supplied", pk);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("user_id is required", "USER_ID_REQUIRED")),
        ));
    };

    let batch = find_batch(&state, pk).await.map_err(plain_status)?;

    match user::Entity::find_by_id(user_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Claim on batch {} by unknown user {}", pk, user_id);
            return Err(plain_status(StatusCode::NOT_FOUND));
        }
        Err(db_error) => {
            error!("Failed to look up user {}: {}", user_id, db_error);
            return Err(plain_status(StatusCode::INTERNAL_SERVER_ERROR));
        }
    }

    let new_claim = relief_goods_claim::ActiveModel {
        relief_goods_id: Set(pk),
        user_id: Set(user_id),
    };

    match new_claim.insert(&state.db).await {
        Ok(_) => {
            info!("User {} claimed batch {}", user_id, pk);
        }
        Err(db_error) if is_unique_violation(&db_error) => {
            warn!("User {} already claimed batch {}", user_id, pk);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "This resident has already claimed this batch",
                    "ALREADY_CLAIMED",
                )),
            ));
        }
        Err(db_error) => {
            error!(
                "Failed to record claim on batch {} by user {}: {}",
                pk, user_id, db_error
            );
            return Err(plain_status(StatusCode::INTERNAL_SERVER_ERROR));
        }
    }

    let claimers = load_claimers(&state, &batch).await.map_err(plain_status)?;
    Ok(Json(ApiResponse {
        data: ReliefGoodsResponse::new(batch, claimers),
        message: "Relief goods claimed successfully".to_string(),
        success: true,
    }))
}

async fn find_batch(state: &AppState, id: i32) -> Result<relief_goods::Model, StatusCode> {
    match relief_goods::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(batch)) => Ok(batch),
        Ok(None) => {
            warn!("Batch {} not found", id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to look up batch {}: {}", id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn load_claimers(
    state: &AppState,
    batch: &relief_goods::Model,
) -> Result<Vec<user::Model>, StatusCode> {
    batch
        .find_related(user::Entity)
        .all(&state.db)
        .await
        .map_err(|db_error| {
            error!("Failed to load claimers for batch {}: {}", batch.id, db_error);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

fn plain_status(status: StatusCode) -> (StatusCode, Json<ErrorResponse>) {
    let (message, code) = match status {
        StatusCode::NOT_FOUND => ("Not found", "NOT_FOUND"),
        _ => ("Internal server error", "INTERNAL_ERROR"),
    };
    (status, Json(ErrorResponse::new(message, code)))
}
