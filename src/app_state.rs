use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::{
    agents::MinutesCrew,
    config::AppConfig,
    models::{PipelineStage, SessionId},
    workspace,
};

/// Acta exportada de la última ejecución completada, lista para descarga.
#[derive(Debug, Clone)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub download_name: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub crew: MinutesCrew,
    pub session: Arc<Mutex<Option<SessionId>>>,
    pub status: Arc<Mutex<Status>>,
    pub artifact: Arc<Mutex<Option<ArtifactInfo>>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub fn new(config: AppConfig, crew: MinutesCrew, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self {
            config,
            crew,
            session: Arc::new(Mutex::new(None)),
            status: Arc::new(Mutex::new(Status {
                is_busy: false,
                stage: PipelineStage::Idle,
                message: "Servidor listo.".to_string(),
                progress: 0.0,
                log: String::new(),
            })),
            artifact: Arc::new(Mutex::new(None)),
            shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
        }
    }

    /// Devuelve el id de sesión, generándolo la primera vez. Idempotente
    /// para toda la vida del proceso: una sesión, un id.
    pub fn ensure_session_id(&self) -> SessionId {
        let mut guard = self.session.lock().unwrap();
        guard.get_or_insert_with(SessionId::generate).clone()
    }

    /// Ruta del workspace de la sesión actual: `<base>/<session-id>`.
    pub fn workspace_dir(&self) -> PathBuf {
        let session = self.ensure_session_id();
        workspace::workspace_path(&self.config.upload_base_dir, &session)
    }
}

/// Estado compartido que el frontend sondea durante la ejecución.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub stage: PipelineStage,
    pub message: String,
    pub progress: f32, // Valor entre 0.0 y 1.0
    /// Registro de progreso de sólo-añadir, mostrado en el área de salida.
    pub log: String,
}

impl Status {
    pub fn append_log(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let config = AppConfig {
            server_addr: "127.0.0.1:0".into(),
            upload_base_dir: "dir".into(),
            llm_chat_model: "o3-mini".into(),
        };
        let crew = MinutesCrew::from_config(&config);
        let (tx, _rx) = oneshot::channel();
        AppState::new(config, crew, tx)
    }

    #[test]
    fn session_id_is_idempotent() {
        let state = test_state();
        let first = state.ensure_session_id();
        let second = state.ensure_session_id();
        assert_eq!(first, second);
    }

    #[test]
    fn workspace_dir_is_stable_for_the_session() {
        let state = test_state();
        assert_eq!(state.workspace_dir(), state.workspace_dir());
        assert!(state.workspace_dir().starts_with("dir"));
    }

    #[test]
    fn log_is_append_only() {
        let state = test_state();
        let mut status = state.status.lock().unwrap();
        status.append_log("línea 1");
        status.append_log("línea 2");
        assert_eq!(status.log, "línea 1\nlínea 2\n");
    }
}
