use crate::repositories::destination_repository::CompletedDestinationRow;
use crate::repositories::location_log_repository::TeamPositionRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request para actualizar los campos descriptivos de un paso plantilla
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoutePartRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub part_zoom: bool,
    pub part_fullscreen: bool,
    pub image_id: Option<i64>,
    pub audio_id: Option<i64>,
    pub is_final: bool,
}

/// Request para reordenar los pasos de una ruta (ids en orden deseado)
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub updated: u64,
}

/// Estado en vivo de una ruta para el mapa de staff
#[derive(Debug, Serialize)]
pub struct MapStateResponse {
    pub server_time: DateTime<Utc>,
    pub teams: Vec<TeamPositionRow>,
    pub completed_destinations: Vec<CompletedDestinationRow>,
}

/// Estadísticas de una ruta
#[derive(Debug, Serialize)]
pub struct RouteStatsResponse {
    pub destinations_count: i64,
    pub distance_km: f64,
    pub team_stats: Vec<TeamStats>,
}

#[derive(Debug, Serialize)]
pub struct TeamStats {
    pub team_id: i64,
    pub team_name: String,
    pub first_completed: Option<DateTime<Utc>>,
    pub last_completed: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub completed_destinations: i64,
}
