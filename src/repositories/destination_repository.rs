use crate::utils::errors::AppResult;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Destination completada por un equipo, para el mapa en vivo
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct CompletedDestinationRow {
    pub lat: f64,
    pub lng: f64,
    pub team_id: i64,
    pub completed_time: DateTime<Utc>,
}

/// Operaciones bulk de staff sobre destinations de equipo.
///
/// Todas filtran por team_route_part_id IS NOT NULL: las bulk APIs nunca
/// tocan destinations plantilla. Cada lote es atómico (un solo UPDATE /
/// DELETE); contra completions concurrentes gana la última escritura.
pub struct DestinationRepository {
    pool: PgPool,
}

impl DestinationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn bulk_move(&self, ids: &[i64], lat: f64, lng: f64) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE destinations SET lat = $1, lng = $2
            WHERE id = ANY($3) AND team_route_part_id IS NOT NULL
            "#,
        )
        .bind(lat)
        .bind(lng)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn bulk_update(
        &self,
        ids: &[i64],
        radius: Option<i32>,
        confirm_by_user: Option<bool>,
        hide_for_user: Option<bool>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE destinations
            SET radius = COALESCE($1, radius),
                confirm_by_user = COALESCE($2, confirm_by_user),
                hide_for_user = COALESCE($3, hide_for_user)
            WHERE id = ANY($4) AND team_route_part_id IS NOT NULL
            "#,
        )
        .bind(radius)
        .bind(confirm_by_user)
        .bind(hide_for_user)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn bulk_delete(&self, ids: &[i64]) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM destinations WHERE id = ANY($1) AND team_route_part_id IS NOT NULL",
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Destinations completadas de todos los equipos de una ruta
    pub async fn completed_for_route(
        &self,
        route_id: i64,
    ) -> AppResult<Vec<CompletedDestinationRow>> {
        let rows = sqlx::query_as::<_, CompletedDestinationRow>(
            r#"
            SELECT d.lat, d.lng, trp.team_id, d.completed_time
            FROM destinations d
            JOIN team_route_parts trp ON d.team_route_part_id = trp.id
            WHERE trp.route_id = $1 AND d.completed_time IS NOT NULL
            ORDER BY d.completed_time DESC
            "#,
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
