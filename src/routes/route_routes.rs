use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};

use crate::controllers::distribution_controller::DistributionController;
use crate::controllers::route_controller::RouteController;
use crate::dto::distribution_dto::{ClearDistributionResponse, DistributionResult};
use crate::dto::route_dto::{
    MapStateResponse, ReorderRequest, ReorderResponse, RouteStatsResponse, UpdateRoutePartRequest,
};
use crate::models::RoutePart;
use crate::services::distance_service::DistanceService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router() -> Router<AppState> {
    Router::new()
        .route("/:id/distribute", post(distribute_route))
        .route("/:id/clear-distribution", post(clear_distribution))
        .route("/:id/reorder", post(reorder_parts))
        .route("/:id/part/:part_id", put(update_part))
        .route("/:id/map-state", get(map_state))
        .route("/:id/stats", get(route_stats))
}

async fn distribute_route(
    State(state): State<AppState>,
    Path(route_id): Path<i64>,
) -> Result<Json<DistributionResult>, AppError> {
    let controller = DistributionController::new(state.pool.clone());
    let result = controller.distribute(route_id).await?;
    Ok(Json(result))
}

async fn clear_distribution(
    State(state): State<AppState>,
    Path(route_id): Path<i64>,
) -> Result<Json<ClearDistributionResponse>, AppError> {
    let controller = DistributionController::new(state.pool.clone());
    let result = controller.clear(route_id).await?;
    Ok(Json(result))
}

async fn reorder_parts(
    State(state): State<AppState>,
    Path(route_id): Path<i64>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let result = controller.reorder_parts(route_id, request).await?;
    Ok(Json(result))
}

async fn update_part(
    State(state): State<AppState>,
    Path((route_id, part_id)): Path<(i64, i64)>,
    Json(request): Json<UpdateRoutePartRequest>,
) -> Result<Json<RoutePart>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let part = controller.update_part(route_id, part_id, request).await?;
    Ok(Json(part))
}

async fn map_state(
    State(state): State<AppState>,
    Path(route_id): Path<i64>,
) -> Result<Json<MapStateResponse>, AppError> {
    let controller = RouteController::new(state.pool.clone());
    let result = controller.map_state(route_id).await?;
    Ok(Json(result))
}

async fn route_stats(
    State(state): State<AppState>,
    Path(route_id): Path<i64>,
) -> Result<Json<RouteStatsResponse>, AppError> {
    let distance = DistanceService::new(
        state.http_client.clone(),
        state.config.google_maps_api_key.clone(),
    );
    let controller = RouteController::new(state.pool.clone());
    let result = controller.stats(route_id, &distance).await?;
    Ok(Json(result))
}
