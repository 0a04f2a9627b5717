//! Registro de sesiones vivas por equipo
//!
//! El diseño asume como mucho una conexión autenticada viva por equipo
//! y lo hace cumplir aquí: autenticarse registra la sesión y desaloja
//! cualquier sesión anterior del mismo equipo. La sesión desalojada
//! recibe la señal por su canal y se cierra sin marcar al equipo
//! offline (la conexión nueva es ahora la dueña del flag).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<i64, (Uuid, mpsc::UnboundedSender<()>)>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar la sesión como dueña del equipo, desalojando la anterior
    pub async fn register(
        &self,
        team_id: i64,
        session_id: Uuid,
        evict_tx: mpsc::UnboundedSender<()>,
    ) {
        let mut sessions = self.inner.write().await;
        if let Some((previous_session, previous_tx)) =
            sessions.insert(team_id, (session_id, evict_tx))
        {
            if previous_session != session_id {
                info!(team_id, %previous_session, "evicting previous session for team");
                // la sesión anterior puede haber muerto ya; el send fallido es inocuo
                let _ = previous_tx.send(());
            }
        }
    }

    /// Quitar la entrada del equipo sólo si esta sesión sigue siendo la dueña
    pub async fn release(&self, team_id: i64, session_id: Uuid) {
        let mut sessions = self.inner.write().await;
        if let Some((owner, _)) = sessions.get(&team_id) {
            if *owner == session_id {
                sessions.remove(&team_id);
            }
        }
    }

    /// Cantidad de sesiones autenticadas vivas
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_evicts_previous_owner() {
        let registry = SessionRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();

        registry.register(7, first, first_tx).await;
        registry.register(7, second, second_tx).await;

        assert!(first_rx.try_recv().is_ok());
        assert!(second_rx.try_recv().is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn release_ignores_stale_owner() {
        let registry = SessionRegistry::new();
        let old_owner = Uuid::new_v4();
        let new_owner = Uuid::new_v4();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, _new_rx) = mpsc::unbounded_channel();

        registry.register(7, old_owner, old_tx).await;
        registry.register(7, new_owner, new_tx).await;

        // la sesión desalojada intenta limpiar al morir; no debe tocar al nuevo dueño
        registry.release(7, old_owner).await;
        assert_eq!(registry.len().await, 1);

        registry.release(7, new_owner).await;
        assert!(registry.is_empty().await);
    }
}
