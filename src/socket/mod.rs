//! Socket persistente de equipos
//!
//! El cliente de un equipo se conecta a /ws/app, se autentica con su
//! código y recibe los pasos de ruta a medida que avanza.

pub mod messages;
pub mod registry;
pub mod session;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

use crate::state::AppState;

/// Upgrade HTTP → WebSocket; una task por conexión
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| session::handle_socket(socket, state))
}
