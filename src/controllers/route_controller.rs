use crate::dto::route_dto::{
    MapStateResponse, ReorderRequest, ReorderResponse, RouteStatsResponse, TeamStats,
    UpdateRoutePartRequest,
};
use crate::models::RoutePart;
use crate::repositories::destination_repository::DestinationRepository;
use crate::repositories::location_log_repository::LocationLogRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::team_route_part_repository::TeamRoutePartRepository;
use crate::services::distance_service::DistanceService;
use crate::utils::errors::{bad_request_error, AppError, AppResult};
use chrono::Utc;
use sqlx::PgPool;
use validator::Validate;

pub struct RouteController {
    pool: PgPool,
}

impl RouteController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Actualizar un paso plantilla, validando el flag `final`:
    /// un paso final no puede tener destinations colgando.
    pub async fn update_part(
        &self,
        route_id: i64,
        part_id: i64,
        request: UpdateRoutePartRequest,
    ) -> AppResult<RoutePart> {
        request.validate()?;

        let repository = RouteRepository::new(self.pool.clone());
        repository.require(route_id).await?;

        repository
            .find_part(route_id, part_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Route part with id '{}' not found", part_id))
            })?;

        if request.is_final && repository.destination_count_of_part(part_id).await? > 0 {
            return Err(AppError::Conflict(
                "A final route part cannot have destinations attached; remove them first"
                    .to_string(),
            ));
        }

        repository
            .update_part(
                part_id,
                &request.name,
                request.part_zoom,
                request.part_fullscreen,
                request.image_id,
                request.audio_id,
                request.is_final,
            )
            .await
    }

    /// Renumerar los pasos de la ruta según la lista recibida
    pub async fn reorder_parts(
        &self,
        route_id: i64,
        request: ReorderRequest,
    ) -> AppResult<ReorderResponse> {
        if request.order.is_empty() {
            return Err(bad_request_error("order must be a non-empty list"));
        }

        let repository = RouteRepository::new(self.pool.clone());
        repository.require(route_id).await?;

        let updated = repository.reorder_parts(route_id, &request.order).await?;
        Ok(ReorderResponse { updated })
    }

    /// Estado en vivo para el mapa: posiciones de hoy + completions
    pub async fn map_state(&self, route_id: i64) -> AppResult<MapStateResponse> {
        RouteRepository::new(self.pool.clone()).require(route_id).await?;

        let teams = LocationLogRepository::new(self.pool.clone())
            .latest_today_for_route(route_id)
            .await?;
        let completed_destinations = DestinationRepository::new(self.pool.clone())
            .completed_for_route(route_id)
            .await?;

        Ok(MapStateResponse {
            server_time: Utc::now(),
            teams,
            completed_destinations,
        })
    }

    /// Estadísticas de la ruta: distancia a pie sobre las destinations
    /// obligatorias de la plantilla y avance por equipo.
    pub async fn stats(
        &self,
        route_id: i64,
        distance: &DistanceService,
    ) -> AppResult<RouteStatsResponse> {
        let repository = RouteRepository::new(self.pool.clone());
        repository.require(route_id).await?;

        let coordinates = repository.mandatory_destinations_of_route(route_id).await?;
        let distance_km = distance.walking_distance_km(&coordinates).await;

        let progress = TeamRoutePartRepository::new(self.pool.clone())
            .progress_by_team(route_id)
            .await?;

        let team_stats = progress
            .into_iter()
            .map(|row| {
                let duration_seconds = match (row.first_completed, row.last_completed) {
                    (Some(first), Some(last)) => Some((last - first).num_seconds()),
                    _ => None,
                };
                TeamStats {
                    team_id: row.team_id,
                    team_name: row.team_name,
                    first_completed: row.first_completed,
                    last_completed: row.last_completed,
                    duration_seconds,
                    completed_destinations: row.completed_destinations,
                }
            })
            .collect();

        Ok(RouteStatsResponse {
            destinations_count: coordinates.len() as i64,
            distance_km,
            team_stats,
        })
    }
}
