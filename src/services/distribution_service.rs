//! Motor de distribución
//!
//! Clona los pasos y destinations de una ruta plantilla en registros de
//! avance por equipo. La operación es idempotente y re-ejecutable: la
//! clave por paso es (route_part_id, team_id) y las destinations se
//! buscan por su tupla completa de valores, de modo que repetir la
//! distribución nunca duplica filas. Toda la ruta se distribuye dentro
//! de una única transacción.

use crate::dto::distribution_dto::DistributionResult;
use crate::models::{Destination, RoutePart, Team, TeamRoutePart};
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::team_route_part_repository::TeamRoutePartRepository;
use crate::utils::errors::AppResult;
use sqlx::PgPool;
use tracing::info;

pub struct DistributionService {
    pool: PgPool,
}

impl DistributionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distribuir una ruta a todos los equipos de su edición
    pub async fn distribute(&self, route_id: i64) -> AppResult<DistributionResult> {
        let route = RouteRepository::new(self.pool.clone()).require(route_id).await?;

        let mut tx = self.pool.begin().await?;

        let teams = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE edition_id = $1")
            .bind(route.edition_id)
            .fetch_all(&mut *tx)
            .await?;

        let parts = sqlx::query_as::<_, RoutePart>(
            "SELECT * FROM route_parts WHERE route_id = $1 ORDER BY part_order, id",
        )
        .bind(route_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut result = DistributionResult::default();

        for part in &parts {
            let template_destinations = sqlx::query_as::<_, Destination>(
                "SELECT * FROM destinations WHERE route_part_id = $1 ORDER BY id",
            )
            .bind(part.id)
            .fetch_all(&mut *tx)
            .await?;

            for team in &teams {
                let team_part =
                    Self::get_or_create_part(&mut tx, part, team, &mut result).await?;

                for destination in &template_destinations {
                    Self::get_or_create_destination(&mut tx, team_part.id, destination, &mut result)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        info!(
            route_id,
            parts_created = result.parts_created,
            parts_reused = result.parts_reused,
            destinations_created = result.destinations_created,
            "route distributed"
        );

        Ok(result)
    }

    /// Crear el clon de un paso para un equipo, o sincronizar el existente.
    ///
    /// En un clon ya existente sólo se sobreescriben los campos
    /// descriptivos cuando divergen de la plantilla; completed_time y
    /// part_order nunca se tocan.
    async fn get_or_create_part(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        part: &RoutePart,
        team: &Team,
        result: &mut DistributionResult,
    ) -> AppResult<TeamRoutePart> {
        let existing = sqlx::query_as::<_, TeamRoutePart>(
            "SELECT * FROM team_route_parts WHERE route_part_id = $1 AND team_id = $2",
        )
        .bind(part.id)
        .bind(team.id)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            None => {
                let created = sqlx::query_as::<_, TeamRoutePart>(
                    r#"
                    INSERT INTO team_route_parts
                        (route_id, route_part_id, team_id, name, route_type,
                         part_zoom, part_fullscreen, image_id, audio_id,
                         is_final, part_order)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    RETURNING *
                    "#,
                )
                .bind(part.route_id)
                .bind(part.id)
                .bind(team.id)
                .bind(&part.name)
                .bind(&part.route_type)
                .bind(part.part_zoom)
                .bind(part.part_fullscreen)
                .bind(part.image_id)
                .bind(part.audio_id)
                .bind(part.is_final)
                .bind(part.part_order)
                .fetch_one(&mut **tx)
                .await?;

                result.parts_created += 1;
                Ok(created)
            }
            Some(team_part) => {
                result.parts_reused += 1;

                if descriptive_fields_differ(part, &team_part) {
                    let updated = sqlx::query_as::<_, TeamRoutePart>(
                        r#"
                        UPDATE team_route_parts
                        SET name = $1, route_type = $2, part_zoom = $3,
                            part_fullscreen = $4, image_id = $5, audio_id = $6,
                            is_final = $7
                        WHERE id = $8
                        RETURNING *
                        "#,
                    )
                    .bind(&part.name)
                    .bind(&part.route_type)
                    .bind(part.part_zoom)
                    .bind(part.part_fullscreen)
                    .bind(part.image_id)
                    .bind(part.audio_id)
                    .bind(part.is_final)
                    .bind(team_part.id)
                    .fetch_one(&mut **tx)
                    .await?;

                    Ok(updated)
                } else {
                    Ok(team_part)
                }
            }
        }
    }

    /// Clonar una destination plantilla bajo un paso de equipo.
    ///
    /// La clave es la tupla completa de valores: destinations plantilla
    /// con valores idénticos no se colapsan (cada fila plantilla ya es
    /// una fila), pero re-distribuir no duplica clones ya creados.
    async fn get_or_create_destination(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        team_part_id: i64,
        destination: &Destination,
        result: &mut DistributionResult,
    ) -> AppResult<()> {
        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM destinations
            WHERE team_route_part_id = $1 AND lat = $2 AND lng = $3
              AND radius = $4 AND destination_type = $5
              AND confirm_by_user = $6 AND hide_for_user = $7
            LIMIT 1
            "#,
        )
        .bind(team_part_id)
        .bind(destination.lat)
        .bind(destination.lng)
        .bind(destination.radius)
        .bind(&destination.destination_type)
        .bind(destination.confirm_by_user)
        .bind(destination.hide_for_user)
        .fetch_optional(&mut **tx)
        .await?;

        if existing.is_none() {
            sqlx::query(
                r#"
                INSERT INTO destinations
                    (team_route_part_id, lat, lng, radius, destination_type,
                     confirm_by_user, hide_for_user)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(team_part_id)
            .bind(destination.lat)
            .bind(destination.lng)
            .bind(destination.radius)
            .bind(&destination.destination_type)
            .bind(destination.confirm_by_user)
            .bind(destination.hide_for_user)
            .execute(&mut **tx)
            .await?;

            result.destinations_created += 1;
        }

        Ok(())
    }

    /// Eliminar toda la distribución de una ruta
    pub async fn clear(&self, route_id: i64) -> AppResult<u64> {
        RouteRepository::new(self.pool.clone()).require(route_id).await?;

        let deleted = TeamRoutePartRepository::new(self.pool.clone())
            .clear_for_route(route_id)
            .await?;

        info!(route_id, deleted, "distribution cleared");

        Ok(deleted)
    }
}

/// True si el clon divergió de la plantilla en algún campo descriptivo.
/// Identidad, orden y completion quedan explícitamente fuera.
pub fn descriptive_fields_differ(part: &RoutePart, team_part: &TeamRoutePart) -> bool {
    part.name != team_part.name
        || part.route_type != team_part.route_type
        || part.part_zoom != team_part.part_zoom
        || part.part_fullscreen != team_part.part_fullscreen
        || part.image_id != team_part.image_id
        || part.audio_id != team_part.audio_id
        || part.is_final != team_part.is_final
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROUTE_TYPE_COORDINATE;

    fn template_part() -> RoutePart {
        RoutePart {
            id: 1,
            route_id: 1,
            name: "Start".to_string(),
            route_type: ROUTE_TYPE_COORDINATE.to_string(),
            part_zoom: true,
            part_fullscreen: true,
            image_id: None,
            audio_id: Some(7),
            is_final: false,
            part_order: 1,
        }
    }

    fn cloned_part() -> TeamRoutePart {
        TeamRoutePart {
            id: 10,
            route_id: 1,
            route_part_id: 1,
            team_id: 3,
            name: "Start".to_string(),
            route_type: ROUTE_TYPE_COORDINATE.to_string(),
            part_zoom: true,
            part_fullscreen: true,
            image_id: None,
            audio_id: Some(7),
            is_final: false,
            part_order: 1,
            completed_time: None,
        }
    }

    #[test]
    fn identical_clone_is_not_dirty() {
        assert!(!descriptive_fields_differ(&template_part(), &cloned_part()));
    }

    #[test]
    fn template_edit_marks_clone_dirty() {
        let mut part = template_part();
        part.name = "Startpunt".to_string();
        assert!(descriptive_fields_differ(&part, &cloned_part()));
    }

    #[test]
    fn order_and_completion_do_not_count_as_drift() {
        let part = template_part();
        let mut clone = cloned_part();
        clone.part_order = 99;
        clone.completed_time = Some(chrono::Utc::now());
        assert!(!descriptive_fields_differ(&part, &clone));
    }

    #[test]
    fn media_swap_marks_clone_dirty() {
        let mut part = template_part();
        part.audio_id = None;
        part.image_id = Some(2);
        assert!(descriptive_fields_differ(&part, &cloned_part()));
    }
}

#[cfg(test)]
mod db_tests {
    use super::*;
    use sqlx::PgPool;

    /// Edición con dos equipos y una ruta de un paso con una destination
    async fn seed_route(pool: &PgPool) -> i64 {
        let (edition_id,): (i64,) =
            sqlx::query_as("INSERT INTO editions (name) VALUES ('Test') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();

        for (name, code) in [("Alpha", "ALPHA1"), ("Bravo", "BRAVO1")] {
            sqlx::query("INSERT INTO teams (edition_id, name, code) VALUES ($1, $2, $3)")
                .bind(edition_id)
                .bind(name)
                .bind(code)
                .execute(pool)
                .await
                .unwrap();
        }

        let (route_id,): (i64,) =
            sqlx::query_as("INSERT INTO routes (edition_id, name) VALUES ($1, 'City') RETURNING id")
                .bind(edition_id)
                .fetch_one(pool)
                .await
                .unwrap();

        let (part_id,): (i64,) = sqlx::query_as(
            "INSERT INTO route_parts (route_id, name, part_order) VALUES ($1, 'Part 1', 1) RETURNING id",
        )
        .bind(route_id)
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO destinations (route_part_id, lat, lng, radius) VALUES ($1, 52.37, 4.89, 20)",
        )
        .bind(part_id)
        .execute(pool)
        .await
        .unwrap();

        route_id
    }

    #[sqlx::test]
    async fn distribute_twice_creates_nothing_new(pool: PgPool) {
        let route_id = seed_route(&pool).await;
        let service = DistributionService::new(pool.clone());

        let first = service.distribute(route_id).await.unwrap();
        assert_eq!(first.parts_created, 2);
        assert_eq!(first.parts_reused, 0);
        assert_eq!(first.destinations_created, 2);

        let second = service.distribute(route_id).await.unwrap();
        assert_eq!(second.parts_created, 0);
        assert_eq!(second.parts_reused, 2);
        assert_eq!(second.destinations_created, 0);

        let (clones,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM destinations WHERE team_route_part_id IS NOT NULL",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(clones, 2);
    }
}
