use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tipo de route part basado en coordenadas (único tipo soportado hoy)
pub const ROUTE_TYPE_COORDINATE: &str = "coordinate";

/// Ruta plantilla - mapea a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: i64,
    pub edition_id: i64,
    pub name: String,
}

/// Paso plantilla de una ruta - mapea a la tabla route_parts
///
/// `part_order` es 1-based y único dentro de su ruta. `is_final` marca el
/// paso de cierre y sólo es válido sin destinations asociadas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoutePart {
    pub id: i64,
    pub route_id: i64,
    pub name: String,
    pub route_type: String,
    pub part_zoom: bool,
    pub part_fullscreen: bool,
    pub image_id: Option<i64>,
    pub audio_id: Option<i64>,
    pub is_final: bool,
    pub part_order: i32,
}
