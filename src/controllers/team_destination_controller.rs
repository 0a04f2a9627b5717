use crate::dto::team_destination_dto::{
    BulkDeleteRequest, BulkMoveRequest, BulkResponse, BulkUpdateRequest,
};
use crate::repositories::destination_repository::DestinationRepository;
use crate::utils::errors::{bad_request_error, AppResult};
use sqlx::PgPool;
use validator::Validate;

/// Operaciones bulk de staff sobre destinations de equipo.
///
/// Cada lote es atómico; frente a completions concurrentes de los
/// equipos sobre las mismas destinations gana la última escritura.
pub struct TeamDestinationController {
    repository: DestinationRepository,
}

impl TeamDestinationController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DestinationRepository::new(pool),
        }
    }

    pub async fn bulk_move(&self, request: BulkMoveRequest) -> AppResult<BulkResponse> {
        request.validate()?;

        let affected = self
            .repository
            .bulk_move(&request.ids, request.lat, request.lng)
            .await?;

        Ok(BulkResponse { ok: true, affected })
    }

    pub async fn bulk_update(&self, request: BulkUpdateRequest) -> AppResult<BulkResponse> {
        request.validate()?;

        if !request.has_changes() {
            return Err(bad_request_error("Nothing to update"));
        }

        let affected = self
            .repository
            .bulk_update(
                &request.ids,
                request.radius,
                request.confirm_by_user,
                request.hide_for_user,
            )
            .await?;

        Ok(BulkResponse { ok: true, affected })
    }

    pub async fn bulk_delete(&self, request: BulkDeleteRequest) -> AppResult<BulkResponse> {
        request.validate()?;

        let affected = self.repository.bulk_delete(&request.ids).await?;

        Ok(BulkResponse { ok: true, affected })
    }
}
