use crate::utils::errors::AppResult;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Última posición conocida de un equipo (hoy)
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct TeamPositionRow {
    pub team_id: i64,
    pub lat: f64,
    pub lng: f64,
    pub time: DateTime<Utc>,
}

pub struct LocationLogRepository {
    pool: PgPool,
}

impl LocationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registrar una muestra de posición para un equipo
    pub async fn log(&self, team_id: i64, lat: f64, lng: f64) -> AppResult<()> {
        sqlx::query("INSERT INTO location_logs (team_id, lat, lng) VALUES ($1, $2, $3)")
            .bind(team_id)
            .bind(lat)
            .bind(lng)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Posición más reciente de hoy por equipo, para los equipos de una ruta
    pub async fn latest_today_for_route(&self, route_id: i64) -> AppResult<Vec<TeamPositionRow>> {
        let rows = sqlx::query_as::<_, TeamPositionRow>(
            r#"
            SELECT DISTINCT ON (l.team_id) l.team_id, l.lat, l.lng, l.time
            FROM location_logs l
            WHERE l.team_id IN (
                SELECT DISTINCT team_id FROM team_route_parts WHERE route_id = $1
            )
              AND l.time::date = CURRENT_DATE
            ORDER BY l.team_id, l.time DESC
            "#,
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
