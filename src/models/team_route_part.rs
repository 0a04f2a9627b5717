use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Clon mutable por equipo de un RoutePart - mapea a team_route_parts
///
/// Lo crea exclusivamente el motor de distribución; la clave de
/// idempotencia es (route_part_id, team_id). `completed_time` nulo
/// significa "abierto"; `part_order` se copia al distribuir y después
/// evoluciona de forma independiente de la plantilla.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamRoutePart {
    pub id: i64,
    pub route_id: i64,
    pub route_part_id: i64,
    pub team_id: i64,
    pub name: String,
    pub route_type: String,
    pub part_zoom: bool,
    pub part_fullscreen: bool,
    pub image_id: Option<i64>,
    pub audio_id: Option<i64>,
    pub is_final: bool,
    pub part_order: i32,
    pub completed_time: Option<DateTime<Utc>>,
}
