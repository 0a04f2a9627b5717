//! Cálculo de distancia a pie via Google Directions
//!
//! Estadística consultiva para staff, no crítica para el juego: cualquier
//! fallo del proveedor degrada a 0.0 en lugar de propagar el error.

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
/// Directions acepta como mucho ~10 coordenadas por request
const CHUNK_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: DirectionsDistance,
}

#[derive(Debug, Deserialize)]
struct DirectionsDistance {
    /// metros
    value: i64,
}

pub struct DistanceService {
    client: Client,
    api_key: Option<String>,
}

impl DistanceService {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Distancia a pie en km sobre la lista ordenada de coordenadas.
    /// Sin API key o ante cualquier error del proveedor devuelve 0.0.
    pub async fn walking_distance_km(&self, coordinates: &[(f64, f64)]) -> f64 {
        let Some(api_key) = &self.api_key else {
            return 0.0;
        };
        if coordinates.len() < 2 {
            return 0.0;
        }

        let mut total_meters: i64 = 0;

        for chunk in coordinates.chunks(CHUNK_SIZE) {
            if chunk.len() < 2 {
                continue;
            }

            match self.chunk_distance_meters(api_key, chunk).await {
                Ok(meters) => total_meters += meters,
                Err(e) => {
                    warn!("walking distance lookup failed, degrading to 0: {}", e);
                    return 0.0;
                }
            }
        }

        (total_meters as f64 / 1000.0 * 100.0).round() / 100.0
    }

    async fn chunk_distance_meters(
        &self,
        api_key: &str,
        chunk: &[(f64, f64)],
    ) -> Result<i64, reqwest::Error> {
        let format = |(lat, lng): &(f64, f64)| format!("{},{}", lat, lng);

        let origin = format(&chunk[0]);
        let destination = format(&chunk[chunk.len() - 1]);
        let waypoints = chunk[1..chunk.len() - 1]
            .iter()
            .map(format)
            .collect::<Vec<_>>()
            .join("|");

        let mut query = vec![
            ("origin", origin),
            ("destination", destination),
            ("mode", "walking".to_string()),
            ("key", api_key.to_string()),
        ];
        if !waypoints.is_empty() {
            query.push(("waypoints", waypoints));
        }

        let response: DirectionsResponse = self
            .client
            .get(DIRECTIONS_URL)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let meters = response
            .routes
            .first()
            .map(|r| r.legs.iter().map(|l| l.distance.value).sum())
            .unwrap_or(0);

        Ok(meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_api_key_degrades_to_zero() {
        let service = DistanceService::new(Client::new(), None);
        let km = service
            .walking_distance_km(&[(52.37, 4.89), (52.38, 4.90)])
            .await;
        assert_eq!(km, 0.0);
    }

    #[tokio::test]
    async fn single_coordinate_is_zero() {
        let service = DistanceService::new(Client::new(), Some("key".to_string()));
        assert_eq!(service.walking_distance_km(&[(52.37, 4.89)]).await, 0.0);
    }

    #[test]
    fn directions_response_parses() {
        let body = r#"{"routes":[{"legs":[{"distance":{"value":1200,"text":"1.2 km"}},
                       {"distance":{"value":800,"text":"0.8 km"}}]}]}"#;
        let parsed: DirectionsResponse = serde_json::from_str(body).unwrap();
        let meters: i64 = parsed.routes[0].legs.iter().map(|l| l.distance.value).sum();
        assert_eq!(meters, 2000);
    }
}
