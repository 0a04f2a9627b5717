use crate::models::Team;
use crate::utils::errors::AppResult;
use sqlx::PgPool;

pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolver un equipo por su código de acceso
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(team)
    }

    pub async fn set_online(&self, id: i64, online: bool) -> AppResult<()> {
        sqlx::query("UPDATE teams SET online = $1 WHERE id = $2")
            .bind(online)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
