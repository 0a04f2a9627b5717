use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::team_destination_controller::TeamDestinationController;
use crate::dto::team_destination_dto::{
    BulkDeleteRequest, BulkMoveRequest, BulkResponse, BulkUpdateRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_team_destination_router() -> Router<AppState> {
    Router::new()
        .route("/bulk-move", post(bulk_move))
        .route("/bulk-update", post(bulk_update))
        .route("/bulk-delete", post(bulk_delete))
}

async fn bulk_move(
    State(state): State<AppState>,
    Json(request): Json<BulkMoveRequest>,
) -> Result<Json<BulkResponse>, AppError> {
    let controller = TeamDestinationController::new(state.pool.clone());
    let result = controller.bulk_move(request).await?;
    Ok(Json(result))
}

async fn bulk_update(
    State(state): State<AppState>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<BulkResponse>, AppError> {
    let controller = TeamDestinationController::new(state.pool.clone());
    let result = controller.bulk_update(request).await?;
    Ok(Json(result))
}

async fn bulk_delete(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkResponse>, AppError> {
    let controller = TeamDestinationController::new(state.pool.clone());
    let result = controller.bulk_delete(request).await?;
    Ok(Json(result))
}
