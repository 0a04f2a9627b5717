use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Archivo de media subido por staff - mapea a media_files
///
/// `path` es relativo a la raíz de media; el resolver lo convierte en
/// una URL absoluta para el cliente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaFile {
    pub id: i64,
    pub path: String,
    pub category: String,
}
