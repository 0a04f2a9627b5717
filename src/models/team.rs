use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Equipo participante - mapea a la tabla teams
///
/// El campo `code` es el código único con el que el equipo se autentica
/// por el socket. `online` refleja si hay una conexión autenticada viva;
/// lo persisten otros consumidores (mapa en vivo), pero la fuente de
/// verdad para el dispatch es la FSM de la sesión, no esta columna.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub edition_id: i64,
    pub name: String,
    pub code: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub online: bool,
}
