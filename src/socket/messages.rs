//! Protocolo de mensajes del socket de equipos
//!
//! Entrante: `{ "endpoint": <string>, "data": <object|null> }`.
//! Saliente: `{ "type": "auth"|"route", "data": ... }`.
//!
//! El dispatch es un enum cerrado sobre los endpoints conocidos; un
//! endpoint desconocido se rechaza explícitamente (y la sesión lo
//! descarta sin cerrar la conexión).

use crate::models::Destination;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Close code reservado: autenticación fallida
pub const CLOSE_AUTH_FAILED: u16 = 4001;
/// Close code reservado: sign-off deliberado (el equipo ya quedó offline)
pub const CLOSE_SIGN_OFF: u16 = 4002;

/// Sobre crudo de todo mensaje entrante
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub endpoint: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AuthData {
    #[serde(rename = "authStr")]
    auth_str: String,
}

#[derive(Debug, Deserialize)]
struct LocationData {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ConfirmData {
    id: i64,
}

/// Mensaje entrante ya tipado
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Authenticate { auth_str: String },
    UpdateLocation { lat: f64, lng: f64 },
    NewLocation,
    DestinationConfirmed { id: i64 },
    UndoCompletion,
}

/// Fallos de parseo, separados porque la sesión los trata distinto:
/// un endpoint desconocido se descarta sin más; un payload malformado
/// cuenta como fallo de autenticación mientras la sesión no autenticó.
#[derive(Debug)]
pub enum ParseError {
    Malformed(String),
    UnknownEndpoint(String),
}

pub fn parse_message(text: &str) -> Result<InboundMessage, ParseError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let data = envelope.data.unwrap_or(Value::Null);

    match envelope.endpoint.as_str() {
        "authenticate" => serde_json::from_value::<AuthData>(data)
            .map(|d| InboundMessage::Authenticate {
                auth_str: d.auth_str,
            })
            .map_err(|e| ParseError::Malformed(e.to_string())),
        "updateLocation" => serde_json::from_value::<LocationData>(data)
            .map(|d| InboundMessage::UpdateLocation {
                lat: d.lat,
                lng: d.lng,
            })
            .map_err(|e| ParseError::Malformed(e.to_string())),
        "newLocation" => Ok(InboundMessage::NewLocation),
        "destinationConfirmed" => serde_json::from_value::<ConfirmData>(data)
            .map(|d| InboundMessage::DestinationConfirmed { id: d.id })
            .map_err(|e| ParseError::Malformed(e.to_string())),
        "undoCompletion" => Ok(InboundMessage::UndoCompletion),
        other => Err(ParseError::UnknownEndpoint(other.to_string())),
    }
}

/// Mensaje saliente hacia el cliente
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum OutboundMessage {
    Auth(AuthResult),
    /// None = indicador de ruta terminada
    Route(Option<NextPartPayload>),
}

#[derive(Debug, Serialize)]
pub struct AuthResult {
    pub result: u8,
}

impl OutboundMessage {
    pub fn auth_success() -> Self {
        OutboundMessage::Auth(AuthResult { result: 1 })
    }

    pub fn auth_failure() -> Self {
        OutboundMessage::Auth(AuthResult { result: 0 })
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Payload del siguiente paso abierto
#[derive(Debug, Serialize)]
pub struct NextPartPayload {
    #[serde(rename = "type")]
    pub route_type: String,
    pub data: NextPartData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPartData {
    pub fullscreen: bool,
    pub zoom_enabled: bool,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub has_undoable_completions: bool,
    pub coordinates: Vec<DestinationPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationPayload {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "type")]
    pub destination_type: String,
    pub radius: i32,
    pub confirm_by_user: bool,
    pub hide_for_user: bool,
}

impl From<&Destination> for DestinationPayload {
    fn from(destination: &Destination) -> Self {
        Self {
            id: destination.id,
            latitude: destination.lat,
            longitude: destination.lng,
            destination_type: destination.destination_type.clone(),
            radius: destination.radius,
            confirm_by_user: destination.confirm_by_user,
            hide_for_user: destination.hide_for_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authenticate() {
        let message =
            parse_message(r#"{"endpoint":"authenticate","data":{"authStr":"ABC123"}}"#).unwrap();
        assert_eq!(
            message,
            InboundMessage::Authenticate {
                auth_str: "ABC123".to_string()
            }
        );
    }

    #[test]
    fn parses_empty_auth_str_as_sign_off_request() {
        let message =
            parse_message(r#"{"endpoint":"authenticate","data":{"authStr":""}}"#).unwrap();
        assert_eq!(
            message,
            InboundMessage::Authenticate {
                auth_str: String::new()
            }
        );
    }

    #[test]
    fn parses_update_location() {
        let message =
            parse_message(r#"{"endpoint":"updateLocation","data":{"lat":52.37,"lng":4.89}}"#)
                .unwrap();
        assert_eq!(
            message,
            InboundMessage::UpdateLocation {
                lat: 52.37,
                lng: 4.89
            }
        );
    }

    #[test]
    fn parses_new_location_without_data() {
        let message = parse_message(r#"{"endpoint":"newLocation"}"#).unwrap();
        assert_eq!(message, InboundMessage::NewLocation);
    }

    #[test]
    fn parses_destination_confirmed() {
        let message =
            parse_message(r#"{"endpoint":"destinationConfirmed","data":{"id":1}}"#).unwrap();
        assert_eq!(message, InboundMessage::DestinationConfirmed { id: 1 });
    }

    #[test]
    fn parses_undo_completion_with_null_data() {
        let message = parse_message(r#"{"endpoint":"undoCompletion","data":null}"#).unwrap();
        assert_eq!(message, InboundMessage::UndoCompletion);
    }

    #[test]
    fn unknown_endpoint_is_rejected_explicitly() {
        let error = parse_message(r#"{"endpoint":"selfDestruct","data":{}}"#).unwrap_err();
        assert!(matches!(error, ParseError::UnknownEndpoint(e) if e == "selfDestruct"));
    }

    #[test]
    fn non_json_is_malformed() {
        let error = parse_message("not json at all").unwrap_err();
        assert!(matches!(error, ParseError::Malformed(_)));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let error = parse_message(r#"{"endpoint":"destinationConfirmed","data":{}}"#).unwrap_err();
        assert!(matches!(error, ParseError::Malformed(_)));
    }

    #[test]
    fn auth_ack_wire_format() {
        assert_eq!(
            OutboundMessage::auth_success().to_text(),
            r#"{"type":"auth","data":{"result":1}}"#
        );
        assert_eq!(
            OutboundMessage::auth_failure().to_text(),
            r#"{"type":"auth","data":{"result":0}}"#
        );
    }

    #[test]
    fn finished_indicator_wire_format() {
        assert_eq!(
            OutboundMessage::Route(None).to_text(),
            r#"{"type":"route","data":null}"#
        );
    }

    #[test]
    fn route_payload_wire_format() {
        let payload = NextPartPayload {
            route_type: "coordinate".to_string(),
            data: NextPartData {
                fullscreen: true,
                zoom_enabled: false,
                image: None,
                audio: Some("http://example.org/media/a.mp3".to_string()),
                has_undoable_completions: false,
                coordinates: vec![DestinationPayload {
                    id: 1,
                    latitude: 52.37,
                    longitude: 4.89,
                    destination_type: "mandatory".to_string(),
                    radius: 20,
                    confirm_by_user: true,
                    hide_for_user: false,
                }],
            },
        };

        let value: serde_json::Value =
            serde_json::from_str(&OutboundMessage::Route(Some(payload)).to_text()).unwrap();
        assert_eq!(value["type"], "route");
        assert_eq!(value["data"]["type"], "coordinate");
        assert_eq!(value["data"]["data"]["zoomEnabled"], false);
        assert_eq!(value["data"]["data"]["hasUndoableCompletions"], false);
        let coordinate = &value["data"]["data"]["coordinates"][0];
        assert_eq!(coordinate["id"], 1);
        assert_eq!(coordinate["type"], "mandatory");
        assert_eq!(coordinate["confirmByUser"], true);
        assert_eq!(coordinate["hideForUser"], false);
    }
}
