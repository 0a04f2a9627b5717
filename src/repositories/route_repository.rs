use crate::models::{Route, RoutePart};
use crate::utils::errors::{not_found_error, AppResult};
use sqlx::PgPool;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Route>> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(route)
    }

    pub async fn find_part(&self, route_id: i64, part_id: i64) -> AppResult<Option<RoutePart>> {
        let part = sqlx::query_as::<_, RoutePart>(
            "SELECT * FROM route_parts WHERE id = $1 AND route_id = $2",
        )
        .bind(part_id)
        .bind(route_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(part)
    }

    /// Cantidad de destinations plantilla colgando de un paso
    pub async fn destination_count_of_part(&self, part_id: i64) -> AppResult<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM destinations WHERE route_part_id = $1")
                .bind(part_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Actualizar los campos descriptivos de un paso plantilla
    pub async fn update_part(
        &self,
        part_id: i64,
        name: &str,
        part_zoom: bool,
        part_fullscreen: bool,
        image_id: Option<i64>,
        audio_id: Option<i64>,
        is_final: bool,
    ) -> AppResult<RoutePart> {
        let part = sqlx::query_as::<_, RoutePart>(
            r#"
            UPDATE route_parts
            SET name = $1, part_zoom = $2, part_fullscreen = $3,
                image_id = $4, audio_id = $5, is_final = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(part_zoom)
        .bind(part_fullscreen)
        .bind(image_id)
        .bind(audio_id)
        .bind(is_final)
        .bind(part_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(part)
    }

    /// Renumerar part_order 1..n según la lista de ids recibida.
    /// Ids que no pertenecen a la ruta se ignoran; una transacción por lote.
    pub async fn reorder_parts(&self, route_id: i64, ordered_ids: &[i64]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let mut next_order: i32 = 1;
        let mut updated: u64 = 0;
        for part_id in ordered_ids {
            let result = sqlx::query(
                "UPDATE route_parts SET part_order = $1 WHERE id = $2 AND route_id = $3",
            )
            .bind(next_order)
            .bind(*part_id)
            .bind(route_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                next_order += 1;
                updated += result.rows_affected();
            }
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Destinations plantilla obligatorias de toda la ruta, en orden de paso.
    /// Es la base del cálculo de distancia a pie.
    pub async fn mandatory_destinations_of_route(
        &self,
        route_id: i64,
    ) -> AppResult<Vec<(f64, f64)>> {
        let rows: Vec<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT d.lat, d.lng FROM destinations d
            JOIN route_parts rp ON d.route_part_id = rp.id
            WHERE rp.route_id = $1 AND d.destination_type = 'mandatory'
            ORDER BY rp.part_order, d.id
            "#,
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Helper: la ruta debe existir o la operación falla con NotFound
    pub async fn require(&self, route_id: i64) -> AppResult<Route> {
        self.find_by_id(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))
    }
}
