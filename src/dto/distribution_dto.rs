use serde::{Deserialize, Serialize};

/// Resultado de distribuir una ruta
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DistributionResult {
    pub parts_created: u64,
    pub parts_reused: u64,
    pub destinations_created: u64,
}

/// Resultado de limpiar la distribución de una ruta
#[derive(Debug, Serialize)]
pub struct ClearDistributionResponse {
    pub deleted: u64,
}
