//! Resolver de URLs de media
//!
//! Convierte ids de media_files en URLs absolutas para el cliente.
//! El serving de los archivos en sí es responsabilidad de otro sistema.

use crate::models::MediaFile;
use crate::utils::errors::AppResult;
use sqlx::PgPool;

pub struct MediaService {
    pool: PgPool,
    server_uri: String,
}

impl MediaService {
    pub fn new(pool: PgPool, server_uri: String) -> Self {
        Self { pool, server_uri }
    }

    /// id de media → URL absoluta, o None sin media / id desconocido
    pub async fn resolve(&self, media_id: Option<i64>) -> AppResult<Option<String>> {
        let Some(media_id) = media_id else {
            return Ok(None);
        };

        let file = sqlx::query_as::<_, MediaFile>("SELECT * FROM media_files WHERE id = $1")
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(file.map(|f| absolute_media_url(&self.server_uri, &f.path)))
    }
}

pub fn absolute_media_url(server_uri: &str, path: &str) -> String {
    format!(
        "{}/media/{}",
        server_uri.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        assert_eq!(
            absolute_media_url("http://example.org", "pins/start.png"),
            "http://example.org/media/pins/start.png"
        );
    }

    #[test]
    fn tolerates_redundant_slashes() {
        assert_eq!(
            absolute_media_url("http://example.org/", "/pins/start.png"),
            "http://example.org/media/pins/start.png"
        );
    }
}
