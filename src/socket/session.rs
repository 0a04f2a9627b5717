//! Sesión de conexión de un equipo
//!
//! FSM por conexión: Unauthenticated → Authenticated → Closed. La sesión
//! es un valor propiedad exclusiva de la task de su conexión; el flag
//! `online` del equipo se persiste como estado observable por otras
//! vistas, pero la FSM local es la autoridad para el dispatch.
//!
//! Cada mensaje entrante se procesa hasta el final antes de leer el
//! siguiente; conexiones distintas avanzan en paralelo sin ordenación
//! cruzada.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::Team;
use crate::repositories::location_log_repository::LocationLogRepository;
use crate::repositories::team_repository::TeamRepository;
use crate::services::media_service::MediaService;
use crate::services::progression_service::ProgressionService;
use crate::socket::messages::{
    parse_message, InboundMessage, OutboundMessage, ParseError, CLOSE_AUTH_FAILED, CLOSE_SIGN_OFF,
};
use crate::state::AppState;

type WsSink = SplitSink<WebSocket, Message>;

/// Resultado del procesamiento de un mensaje
enum Flow {
    Continue,
    Close(Option<(u16, &'static str)>),
}

struct Session {
    state: AppState,
    id: Uuid,
    /// Some = autenticada y ligada a este equipo
    team: Option<Team>,
}

/// Task por conexión: leer, despachar, limpiar al cerrar
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (evict_tx, mut evict_rx) = mpsc::unbounded_channel();

    let mut session = Session::new(state);
    info!(session_id = %session.id, "socket connected");

    let mut evicted = false;

    loop {
        tokio::select! {
            _ = evict_rx.recv() => {
                // otra conexión se autenticó como el mismo equipo
                evicted = true;
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            inbound = stream.next() => {
                let Some(Ok(message)) = inbound else { break };

                match message {
                    Message::Text(text) => {
                        match session.handle_text(&text, &mut sink, &evict_tx).await {
                            Flow::Continue => {}
                            Flow::Close(frame) => {
                                let close = frame.map(|(code, reason)| CloseFrame {
                                    code,
                                    reason: reason.into(),
                                });
                                let _ = sink.send(Message::Close(close)).await;
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    // pings los contesta la capa de transporte; binario se ignora
                    _ => {}
                }
            }
        }
    }

    session.teardown(evicted).await;
}

impl Session {
    fn new(state: AppState) -> Self {
        Self {
            state,
            id: Uuid::new_v4(),
            team: None,
        }
    }

    async fn handle_text(
        &mut self,
        text: &str,
        sink: &mut WsSink,
        evict_tx: &mpsc::UnboundedSender<()>,
    ) -> Flow {
        match parse_message(text) {
            Ok(message) => {
                if self.team.is_some() {
                    self.dispatch_authenticated(message, sink, evict_tx).await
                } else {
                    self.dispatch_unauthenticated(message, sink, evict_tx).await
                }
            }
            Err(ParseError::UnknownEndpoint(endpoint)) => {
                // no fatal: se descarta sin cerrar la conexión
                warn!(session_id = %self.id, endpoint, "unknown endpoint dropped");
                Flow::Continue
            }
            Err(ParseError::Malformed(reason)) => {
                if self.team.is_none() {
                    // credenciales malformadas cuentan como fallo de auth
                    warn!(session_id = %self.id, reason, "malformed message before auth");
                    self.fail_authentication(sink).await
                } else {
                    warn!(session_id = %self.id, reason, "malformed message dropped");
                    Flow::Continue
                }
            }
        }
    }

    /// Antes de autenticar sólo se procesa el endpoint `authenticate`;
    /// cualquier otro se rechaza sin procesar y sin mutar estado.
    async fn dispatch_unauthenticated(
        &mut self,
        message: InboundMessage,
        sink: &mut WsSink,
        evict_tx: &mpsc::UnboundedSender<()>,
    ) -> Flow {
        match message {
            InboundMessage::Authenticate { auth_str } => {
                if auth_str.is_empty() {
                    return self.fail_authentication(sink).await;
                }
                self.try_authenticate(&auth_str, sink, evict_tx).await
            }
            other => {
                warn!(session_id = %self.id, ?other, "endpoint rejected before authentication");
                Flow::Continue
            }
        }
    }

    async fn dispatch_authenticated(
        &mut self,
        message: InboundMessage,
        sink: &mut WsSink,
        evict_tx: &mpsc::UnboundedSender<()>,
    ) -> Flow {
        match message {
            InboundMessage::Authenticate { auth_str } if auth_str.is_empty() => {
                self.sign_off().await
            }
            InboundMessage::Authenticate { auth_str } => {
                // re-autenticación explícita: se desliga el equipo actual
                self.unbind_team().await;
                self.try_authenticate(&auth_str, sink, evict_tx).await
            }
            InboundMessage::UpdateLocation { lat, lng } => {
                self.log_location(lat, lng).await;
                Flow::Continue
            }
            InboundMessage::NewLocation => {
                self.push_next_part(sink).await;
                Flow::Continue
            }
            InboundMessage::DestinationConfirmed { id } => {
                self.confirm_destination(id).await;
                self.push_next_part(sink).await;
                Flow::Continue
            }
            InboundMessage::UndoCompletion => {
                self.undo_completion().await;
                self.push_next_part(sink).await;
                Flow::Continue
            }
        }
    }

    async fn try_authenticate(
        &mut self,
        auth_str: &str,
        sink: &mut WsSink,
        evict_tx: &mpsc::UnboundedSender<()>,
    ) -> Flow {
        let repository = TeamRepository::new(self.state.pool.clone());

        let team = match repository.find_by_code(auth_str).await {
            Ok(Some(team)) => team,
            Ok(None) => {
                warn!(session_id = %self.id, "authentication with unknown team code");
                return self.fail_authentication(sink).await;
            }
            Err(e) => {
                error!(session_id = %self.id, "team lookup failed: {}", e);
                return self.fail_authentication(sink).await;
            }
        };

        self.state
            .sessions
            .register(team.id, self.id, evict_tx.clone())
            .await;

        if let Err(e) = repository.set_online(team.id, true).await {
            error!(session_id = %self.id, team_id = team.id, "failed to set team online: {}", e);
        }

        info!(session_id = %self.id, team_id = team.id, team = %team.name, "team authenticated");
        self.team = Some(team);

        // el ack de auth siempre precede al primer push de ruta
        self.send(sink, OutboundMessage::auth_success()).await;
        self.push_next_part(sink).await;

        Flow::Continue
    }

    async fn fail_authentication(&mut self, sink: &mut WsSink) -> Flow {
        self.send(sink, OutboundMessage::auth_failure()).await;
        Flow::Close(Some((CLOSE_AUTH_FAILED, "authentication failed")))
    }

    /// Sign-off deliberado: el equipo queda offline antes de cerrar, y el
    /// close code reservado evita repetir el side effect en el teardown.
    async fn sign_off(&mut self) -> Flow {
        self.unbind_team().await;
        Flow::Close(Some((CLOSE_SIGN_OFF, "signed off")))
    }

    async fn unbind_team(&mut self) {
        if let Some(team) = self.team.take() {
            self.state.sessions.release(team.id, self.id).await;
            if let Err(e) = TeamRepository::new(self.state.pool.clone())
                .set_online(team.id, false)
                .await
            {
                error!(session_id = %self.id, team_id = team.id, "failed to set team offline: {}", e);
            }
            info!(session_id = %self.id, team_id = team.id, "team went offline");
        }
    }

    async fn log_location(&self, lat: f64, lng: f64) {
        let Some(team) = &self.team else { return };

        if let Err(e) = LocationLogRepository::new(self.state.pool.clone())
            .log(team.id, lat, lng)
            .await
        {
            error!(session_id = %self.id, team_id = team.id, "failed to log location: {}", e);
        }
    }

    async fn confirm_destination(&self, destination_id: i64) {
        let Some(team) = &self.team else { return };

        let progression = ProgressionService::new(self.state.pool.clone());
        match progression.complete_destination(team, destination_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                // id desincronizado con el cliente: se ignora sin cerrar
                warn!(
                    session_id = %self.id,
                    team_id = team.id,
                    destination_id,
                    "confirmation for destination not owned by team"
                );
            }
            Err(e) => {
                error!(session_id = %self.id, team_id = team.id, "destination completion failed: {}", e);
            }
        }
    }

    async fn undo_completion(&self) {
        let Some(team) = &self.team else { return };

        let progression = ProgressionService::new(self.state.pool.clone());
        match progression.check_undoable(team).await {
            Ok(true) => {
                if let Err(e) = progression.undo_last_completion(team).await {
                    error!(session_id = %self.id, team_id = team.id, "undo failed: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => {
                error!(session_id = %self.id, team_id = team.id, "undoable check failed: {}", e);
            }
        }
    }

    /// Enviar el siguiente paso abierto, o el indicador de ruta terminada
    async fn push_next_part(&self, sink: &mut WsSink) {
        let Some(team) = &self.team else { return };

        let progression = ProgressionService::new(self.state.pool.clone());
        let media = MediaService::new(
            self.state.pool.clone(),
            self.state.config.server_uri.clone(),
        );

        match progression.format_next_part(team, &media).await {
            Ok(payload) => {
                self.send(sink, OutboundMessage::Route(Some(payload))).await;
            }
            Err(e) if e.is_not_found() => {
                self.send(sink, OutboundMessage::Route(None)).await;
            }
            Err(e) => {
                error!(session_id = %self.id, team_id = team.id, "failed to build route payload: {}", e);
            }
        }
    }

    async fn send(&self, sink: &mut WsSink, message: OutboundMessage) {
        // con el transporte cerrado el send falla; el loop lo observará al leer
        if let Err(e) = sink.send(Message::Text(message.to_text())).await {
            warn!(session_id = %self.id, "outbound send failed: {}", e);
        }
    }

    /// Limpieza terminal de la conexión.
    ///
    /// Una sesión desalojada no toca el flag `online`: la conexión nueva
    /// del mismo equipo es ahora la dueña. El sign-off ya dejó `team`
    /// en None, así que tampoco repite el side effect.
    async fn teardown(mut self, evicted: bool) {
        if let Some(team) = self.team.take() {
            self.state.sessions.release(team.id, self.id).await;

            if !evicted {
                if let Err(e) = TeamRepository::new(self.state.pool.clone())
                    .set_online(team.id, false)
                    .await
                {
                    error!(session_id = %self.id, team_id = team.id, "failed to set team offline: {}", e);
                }
                info!(session_id = %self.id, team_id = team.id, "team went offline on disconnect");
            }
        }

        info!(session_id = %self.id, "socket closed");
    }
}
