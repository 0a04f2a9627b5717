use crate::dto::distribution_dto::{ClearDistributionResponse, DistributionResult};
use crate::services::distribution_service::DistributionService;
use crate::utils::errors::AppResult;
use sqlx::PgPool;

pub struct DistributionController {
    service: DistributionService,
}

impl DistributionController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            service: DistributionService::new(pool),
        }
    }

    /// Distribuir la ruta a todos los equipos de su edición
    pub async fn distribute(&self, route_id: i64) -> AppResult<DistributionResult> {
        self.service.distribute(route_id).await
    }

    /// Eliminar la distribución completa de la ruta
    pub async fn clear(&self, route_id: i64) -> AppResult<ClearDistributionResponse> {
        let deleted = self.service.clear(route_id).await?;
        Ok(ClearDistributionResponse { deleted })
    }
}
