use crate::models::{Destination, TeamRoutePart};
use crate::utils::errors::AppResult;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Estadísticas de avance de un equipo dentro de una ruta
#[derive(Debug, sqlx::FromRow)]
pub struct TeamProgressRow {
    pub team_id: i64,
    pub team_name: String,
    pub first_completed: Option<DateTime<Utc>>,
    pub last_completed: Option<DateTime<Utc>>,
    pub completed_destinations: i64,
}

pub struct TeamRoutePartRepository {
    pool: PgPool,
}

impl TeamRoutePartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paso abierto de menor orden para un equipo; None = ruta terminada
    pub async fn next_open_part(&self, team_id: i64) -> AppResult<Option<TeamRoutePart>> {
        let part = sqlx::query_as::<_, TeamRoutePart>(
            r#"
            SELECT * FROM team_route_parts
            WHERE team_id = $1 AND completed_time IS NULL
            ORDER BY part_order, id
            LIMIT 1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(part)
    }

    /// Destinations aún abiertas de un paso de equipo
    pub async fn open_destinations_of_part(&self, part_id: i64) -> AppResult<Vec<Destination>> {
        let destinations = sqlx::query_as::<_, Destination>(
            r#"
            SELECT * FROM destinations
            WHERE team_route_part_id = $1 AND completed_time IS NULL
            ORDER BY id
            "#,
        )
        .bind(part_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(destinations)
    }

    /// True si el equipo tiene al menos una destination completada
    pub async fn has_completed_destinations(&self, team_id: i64) -> AppResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM destinations d
                JOIN team_route_parts trp ON d.team_route_part_id = trp.id
                WHERE trp.team_id = $1 AND d.completed_time IS NOT NULL
            )
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Borrar la distribución completa de una ruta.
    /// Las destinations de equipo caen en cascada con su paso.
    pub async fn clear_for_route(&self, route_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM team_route_parts WHERE route_id = $1")
            .bind(route_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Primera/última completion y total de destinations completadas por equipo
    pub async fn progress_by_team(&self, route_id: i64) -> AppResult<Vec<TeamProgressRow>> {
        let rows = sqlx::query_as::<_, TeamProgressRow>(
            r#"
            SELECT t.id AS team_id, t.name AS team_name,
                   MIN(trp.completed_time) AS first_completed,
                   MAX(trp.completed_time) AS last_completed,
                   COUNT(d.id) FILTER (WHERE d.completed_time IS NOT NULL)
                       AS completed_destinations
            FROM teams t
            JOIN team_route_parts trp ON trp.team_id = t.id AND trp.route_id = $1
            LEFT JOIN destinations d ON d.team_route_part_id = trp.id
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
