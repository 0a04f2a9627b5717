//! Máquina de estados de avance
//!
//! Un TeamRoutePart está Abierto (completed_time nulo) o Completado.
//! El cierre es un latch de una sola dirección con un escape explícito:
//! el undo de la última completion. Las transiciones mutantes corren
//! cada una dentro de una transacción; o se aplican enteras o no se
//! observan.

use crate::models::{Destination, Team, TeamRoutePart};
use crate::repositories::team_route_part_repository::TeamRoutePartRepository;
use crate::services::media_service::MediaService;
use crate::socket::messages::{DestinationPayload, NextPartData, NextPartPayload};
use crate::utils::errors::{AppError, AppResult};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};

pub struct ProgressionService {
    pool: PgPool,
}

impl ProgressionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marcar una destination como completada y reevaluar el cierre del paso.
    ///
    /// Falla con NotFound si la destination no pertenece a ningún paso
    /// del equipo. La completion recibe un número de secuencia monótono
    /// por equipo; ese número, no el timestamp, es la clave del undo.
    pub async fn complete_destination(&self, team: &Team, destination_id: i64) -> AppResult<()> {
        let complete_time = Utc::now();

        let mut tx = self.pool.begin().await?;

        let part = sqlx::query_as::<_, TeamRoutePart>(
            r#"
            SELECT trp.* FROM team_route_parts trp
            JOIN destinations d ON d.team_route_part_id = trp.id
            WHERE d.id = $1 AND trp.team_id = $2
            "#,
        )
        .bind(destination_id)
        .bind(team.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Destination '{}' does not belong to team '{}'",
                destination_id, team.id
            ))
        })?;

        sqlx::query(
            r#"
            UPDATE destinations
            SET completed_time = $1,
                completion_seq = (
                    SELECT COALESCE(MAX(d2.completion_seq), 0) + 1
                    FROM destinations d2
                    JOIN team_route_parts t2 ON d2.team_route_part_id = t2.id
                    WHERE t2.team_id = $2
                )
            WHERE id = $3
            "#,
        )
        .bind(complete_time)
        .bind(team.id)
        .bind(destination_id)
        .execute(&mut *tx)
        .await?;

        // Reevaluar el cierre sólo mientras el paso siga abierto: un paso ya
        // completado conserva su completed_time original aunque lleguen
        // confirmaciones tardías de destinations restantes.
        if part.completed_time.is_none() {
            let destinations = sqlx::query_as::<_, Destination>(
                "SELECT * FROM destinations WHERE team_route_part_id = $1 ORDER BY id",
            )
            .bind(part.id)
            .fetch_all(&mut *tx)
            .await?;

            if part_is_complete(&destinations) {
                sqlx::query(
                    "UPDATE team_route_parts SET completed_time = $1 \
                     WHERE id = $2 AND completed_time IS NULL",
                )
                .bind(complete_time)
                .bind(part.id)
                .execute(&mut *tx)
                .await?;

                info!(team_id = team.id, part_id = part.id, "route part completed");
            }
        }

        tx.commit().await?;

        debug!(team_id = team.id, destination_id, "destination completed");

        Ok(())
    }

    /// Paso abierto de menor orden; None significa ruta terminada
    pub async fn next_open_part(&self, team: &Team) -> AppResult<Option<TeamRoutePart>> {
        TeamRoutePartRepository::new(self.pool.clone())
            .next_open_part(team.id)
            .await
    }

    /// True si hay al menos una completion que se pueda deshacer
    pub async fn check_undoable(&self, team: &Team) -> AppResult<bool> {
        TeamRoutePartRepository::new(self.pool.clone())
            .has_completed_destinations(team.id)
            .await
    }

    /// Deshacer la completion más reciente del equipo.
    ///
    /// Se localiza la destination con el número de secuencia más alto,
    /// se reabre, y el paso dueño se reabre sólo si fue esa completion
    /// la que lo cerró (timestamps iguales). No-op sin completions.
    pub async fn undo_last_completion(&self, team: &Team) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let last = sqlx::query_as::<_, Destination>(
            r#"
            SELECT d.* FROM destinations d
            JOIN team_route_parts trp ON d.team_route_part_id = trp.id
            WHERE trp.team_id = $1 AND d.completed_time IS NOT NULL
            ORDER BY d.completion_seq DESC NULLS LAST, d.completed_time DESC
            LIMIT 1
            "#,
        )
        .bind(team.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(destination) = last else {
            tx.commit().await?;
            return Ok(());
        };

        sqlx::query(
            "UPDATE destinations SET completed_time = NULL, completion_seq = NULL WHERE id = $1",
        )
        .bind(destination.id)
        .execute(&mut *tx)
        .await?;

        if let (Some(part_id), Some(completed_time)) =
            (destination.team_route_part_id, destination.completed_time)
        {
            sqlx::query(
                r#"
                UPDATE team_route_parts SET completed_time = NULL
                WHERE id = $1 AND completed_time = $2
                "#,
            )
            .bind(part_id)
            .bind(completed_time)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            team_id = team.id,
            destination_id = destination.id,
            "last completion undone"
        );

        Ok(())
    }

    /// Construir el payload del siguiente paso abierto para el cliente.
    ///
    /// Falla con NotFound cuando no queda ningún paso abierto; el caller
    /// decide qué enviar en ese caso (indicador de ruta terminada).
    pub async fn format_next_part(
        &self,
        team: &Team,
        media: &MediaService,
    ) -> AppResult<NextPartPayload> {
        let part = self.next_open_part(team).await?.ok_or_else(|| {
            AppError::NotFound(format!("No open route part left for team '{}'", team.id))
        })?;

        let repository = TeamRoutePartRepository::new(self.pool.clone());
        let open_destinations = repository.open_destinations_of_part(part.id).await?;
        let has_undoable = self.check_undoable(team).await?;

        let image = media.resolve(part.image_id).await?;
        let audio = media.resolve(part.audio_id).await?;

        Ok(NextPartPayload {
            route_type: part.route_type.clone(),
            data: NextPartData {
                fullscreen: part.part_fullscreen,
                zoom_enabled: part.part_zoom,
                image,
                audio,
                has_undoable_completions: has_undoable,
                coordinates: open_destinations
                    .iter()
                    .map(DestinationPayload::from)
                    .collect(),
            },
        })
    }
}

/// Puerta de cierre de un paso: todas las obligatorias completadas y,
/// si existen destinations de elección, al menos una de ellas completada.
pub fn part_is_complete(destinations: &[Destination]) -> bool {
    let mandatory_open = destinations
        .iter()
        .any(|d| d.is_mandatory() && !d.completed());
    if mandatory_open {
        return false;
    }

    let choices: Vec<_> = destinations.iter().filter(|d| d.is_choice()).collect();
    if !choices.is_empty() && !choices.iter().any(|d| d.completed()) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DESTINATION_TYPE_CHOICE, DESTINATION_TYPE_MANDATORY};

    fn destination(id: i64, destination_type: &str, completed: bool) -> Destination {
        Destination {
            id,
            route_part_id: None,
            team_route_part_id: Some(1),
            lat: 52.37,
            lng: 4.89,
            radius: 20,
            destination_type: destination_type.to_string(),
            confirm_by_user: false,
            hide_for_user: false,
            completed_time: completed.then(Utc::now),
            completion_seq: completed.then_some(1),
        }
    }

    #[test]
    fn empty_part_counts_as_complete() {
        // un paso "final" no tiene destinations; la puerta no lo bloquea
        assert!(part_is_complete(&[]));
    }

    #[test]
    fn open_mandatory_blocks_completion() {
        let destinations = vec![
            destination(1, DESTINATION_TYPE_MANDATORY, true),
            destination(2, DESTINATION_TYPE_MANDATORY, false),
        ];
        assert!(!part_is_complete(&destinations));
    }

    #[test]
    fn all_mandatory_completed_closes_part() {
        let destinations = vec![
            destination(1, DESTINATION_TYPE_MANDATORY, true),
            destination(2, DESTINATION_TYPE_MANDATORY, true),
        ];
        assert!(part_is_complete(&destinations));
    }

    #[test]
    fn choice_set_requires_at_least_one() {
        let destinations = vec![
            destination(1, DESTINATION_TYPE_MANDATORY, true),
            destination(2, DESTINATION_TYPE_CHOICE, false),
            destination(3, DESTINATION_TYPE_CHOICE, false),
        ];
        assert!(!part_is_complete(&destinations));
    }

    #[test]
    fn one_completed_choice_is_enough() {
        let destinations = vec![
            destination(1, DESTINATION_TYPE_MANDATORY, true),
            destination(2, DESTINATION_TYPE_CHOICE, true),
            destination(3, DESTINATION_TYPE_CHOICE, false),
        ];
        assert!(part_is_complete(&destinations));
    }

    #[test]
    fn choices_alone_do_not_close_without_completion() {
        let destinations = vec![destination(1, DESTINATION_TYPE_CHOICE, false)];
        assert!(!part_is_complete(&destinations));
    }
}

#[cfg(test)]
mod db_tests {
    use super::*;
    use crate::models::{DESTINATION_TYPE_CHOICE, DESTINATION_TYPE_MANDATORY};
    use chrono::DateTime;
    use sqlx::PgPool;

    struct Fixture {
        team: Team,
        part_id: i64,
    }

    /// Equipo con un único paso distribuido, sin destinations todavía
    async fn seed_team_part(pool: &PgPool) -> Fixture {
        let (edition_id,): (i64,) =
            sqlx::query_as("INSERT INTO editions (name) VALUES ('Test') RETURNING id")
                .fetch_one(pool)
                .await
                .unwrap();

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (edition_id, name, code) VALUES ($1, 'Alpha', 'ALPHA1') RETURNING *",
        )
        .bind(edition_id)
        .fetch_one(pool)
        .await
        .unwrap();

        let (route_id,): (i64,) =
            sqlx::query_as("INSERT INTO routes (edition_id, name) VALUES ($1, 'City') RETURNING id")
                .bind(edition_id)
                .fetch_one(pool)
                .await
                .unwrap();

        let (template_part_id,): (i64,) = sqlx::query_as(
            "INSERT INTO route_parts (route_id, name, part_order) VALUES ($1, 'Part 1', 1) RETURNING id",
        )
        .bind(route_id)
        .fetch_one(pool)
        .await
        .unwrap();

        let (part_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO team_route_parts (route_id, route_part_id, team_id, name, part_order)
            VALUES ($1, $2, $3, 'Part 1', 1)
            RETURNING id
            "#,
        )
        .bind(route_id)
        .bind(template_part_id)
        .bind(team.id)
        .fetch_one(pool)
        .await
        .unwrap();

        Fixture { team, part_id }
    }

    async fn seed_destination(pool: &PgPool, part_id: i64, destination_type: &str) -> i64 {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO destinations (team_route_part_id, lat, lng, radius, destination_type)
            VALUES ($1, 52.37, 4.89, 20, $2)
            RETURNING id
            "#,
        )
        .bind(part_id)
        .bind(destination_type)
        .fetch_one(pool)
        .await
        .unwrap();

        id
    }

    async fn part_completed_time(pool: &PgPool, part_id: i64) -> Option<DateTime<Utc>> {
        let (completed_time,): (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT completed_time FROM team_route_parts WHERE id = $1")
                .bind(part_id)
                .fetch_one(pool)
                .await
                .unwrap();

        completed_time
    }

    async fn destination_completed_time(
        pool: &PgPool,
        destination_id: i64,
    ) -> Option<DateTime<Utc>> {
        let (completed_time,): (Option<DateTime<Utc>>,) =
            sqlx::query_as("SELECT completed_time FROM destinations WHERE id = $1")
                .bind(destination_id)
                .fetch_one(pool)
                .await
                .unwrap();

        completed_time
    }

    #[sqlx::test]
    async fn gate_holds_until_a_choice_is_completed(pool: PgPool) {
        let fixture = seed_team_part(&pool).await;
        let mandatory = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_MANDATORY).await;
        let choice = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_CHOICE).await;

        let service = ProgressionService::new(pool.clone());

        service
            .complete_destination(&fixture.team, mandatory)
            .await
            .unwrap();
        assert!(part_completed_time(&pool, fixture.part_id).await.is_none());

        service
            .complete_destination(&fixture.team, choice)
            .await
            .unwrap();
        assert!(part_completed_time(&pool, fixture.part_id).await.is_some());
    }

    #[sqlx::test]
    async fn late_choice_confirmation_keeps_completion_time(pool: PgPool) {
        let fixture = seed_team_part(&pool).await;
        let mandatory = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_MANDATORY).await;
        let choice_a = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_CHOICE).await;
        let choice_b = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_CHOICE).await;

        let service = ProgressionService::new(pool.clone());

        service
            .complete_destination(&fixture.team, mandatory)
            .await
            .unwrap();
        service
            .complete_destination(&fixture.team, choice_a)
            .await
            .unwrap();

        let latched = part_completed_time(&pool, fixture.part_id).await;
        assert!(latched.is_some());

        // confirmación tardía de la otra choice: input válido del equipo,
        // pero el paso ya cerrado conserva su completed_time original
        service
            .complete_destination(&fixture.team, choice_b)
            .await
            .unwrap();

        assert_eq!(part_completed_time(&pool, fixture.part_id).await, latched);

        // deshacerla quita la completion tardía sin reabrir el paso
        service.undo_last_completion(&fixture.team).await.unwrap();
        assert!(destination_completed_time(&pool, choice_b).await.is_none());
        assert_eq!(part_completed_time(&pool, fixture.part_id).await, latched);
    }

    #[sqlx::test]
    async fn undo_reopens_the_part_its_completion_closed(pool: PgPool) {
        let fixture = seed_team_part(&pool).await;
        let mandatory = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_MANDATORY).await;
        let choice = seed_destination(&pool, fixture.part_id, DESTINATION_TYPE_CHOICE).await;

        let service = ProgressionService::new(pool.clone());

        service
            .complete_destination(&fixture.team, mandatory)
            .await
            .unwrap();
        service
            .complete_destination(&fixture.team, choice)
            .await
            .unwrap();
        assert!(part_completed_time(&pool, fixture.part_id).await.is_some());

        // la choice cerró el paso; deshacerla lo reabre
        service.undo_last_completion(&fixture.team).await.unwrap();
        assert!(destination_completed_time(&pool, choice).await.is_none());
        assert!(part_completed_time(&pool, fixture.part_id).await.is_none());

        // la mandatory anterior sigue completada y sigue habiendo undo posible
        assert!(destination_completed_time(&pool, mandatory).await.is_some());
        assert!(service.check_undoable(&fixture.team).await.unwrap());

        let next = service.next_open_part(&fixture.team).await.unwrap();
        assert_eq!(next.map(|p| p.id), Some(fixture.part_id));
    }

    #[sqlx::test]
    async fn foreign_destination_is_not_found(pool: PgPool) {
        let fixture = seed_team_part(&pool).await;

        let service = ProgressionService::new(pool.clone());
        let error = service
            .complete_destination(&fixture.team, 424242)
            .await
            .unwrap_err();

        assert!(error.is_not_found());
    }
}
