use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Destination obligatoria: siempre debe completarse
pub const DESTINATION_TYPE_MANDATORY: &str = "mandatory";
/// Destination de elección: basta con completar una del conjunto
pub const DESTINATION_TYPE_CHOICE: &str = "choice";

/// Coordenada objetivo con radio de activación - mapea a destinations
///
/// Exactamente uno de `route_part_id` / `team_route_part_id` está
/// presente (CHECK en el schema): plantilla o clon por equipo.
/// `completion_seq` es el número de secuencia monótono por equipo que
/// se asigna al completar; es la clave del undo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Destination {
    pub id: i64,
    pub route_part_id: Option<i64>,
    pub team_route_part_id: Option<i64>,
    pub lat: f64,
    pub lng: f64,
    pub radius: i32,
    pub destination_type: String,
    pub confirm_by_user: bool,
    pub hide_for_user: bool,
    pub completed_time: Option<DateTime<Utc>>,
    pub completion_seq: Option<i64>,
}

impl Destination {
    pub fn completed(&self) -> bool {
        self.completed_time.is_some()
    }

    pub fn is_mandatory(&self) -> bool {
        self.destination_type == DESTINATION_TYPE_MANDATORY
    }

    pub fn is_choice(&self) -> bool {
        self.destination_type == DESTINATION_TYPE_CHOICE
    }
}
