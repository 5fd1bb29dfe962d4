use axum::{
    extract::{Json, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::spawn;
use tracing::{error, info};

use crate::{
    app_state::{AppState, Status},
    models::{MeetingRequest, PipelineStage},
    pipeline,
    workspace::{self, WorkspaceError},
};

// --- Payloads y Respuestas de la API ---

#[derive(Serialize)]
struct FilesResponse {
    files: Vec<String>,
}

/// Snapshot del estado más el nombre de descarga del acta, si ya hay una.
#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    status: Status,
    download_name: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": err.to_string()})),
    )
}

fn bad_request(message: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": message.to_string()})),
    )
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(upload_handler))
        .route("/api/files", get(files_handler))
        .route("/api/delete-folder", post(delete_folder_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/status", get(status_handler))
        .route("/api/download", get(download_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

/// Recibe un fichero (multipart) y lo guarda en el workspace de la sesión.
/// La puerta de entrada sólo admite pdf, docx y txt.
#[axum::debug_handler]
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let dir = state.workspace_dir();
    workspace::ensure_dir(&dir).map_err(internal_error)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Multipart inválido: {e}")))?
    {
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| bad_request(format!("No se pudo leer el fichero: {e}")))?;

        return match workspace::save_document(&dir, &filename, &data) {
            Ok(_) => Ok((
                StatusCode::OK,
                Json(json!({ "message": format!("¡Fichero subido! ({filename})") })),
            )),
            Err(err @ WorkspaceError::UnsupportedExtension { .. }) => Err(bad_request(err)),
            Err(err) => Err(internal_error(err)),
        };
    }

    Err(bad_request("La petición no contiene ningún fichero."))
}

/// Inventario de documentos del workspace, en orden de listado.
#[axum::debug_handler]
async fn files_handler(State(state): State<AppState>) -> Result<Json<FilesResponse>, ApiError> {
    let files = workspace::list_documents(&state.workspace_dir()).map_err(internal_error)?;
    Ok(Json(FilesResponse { files }))
}

/// Vacía el workspace de la sesión (el workspace sigue existiendo).
#[axum::debug_handler]
async fn delete_folder_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    workspace::delete_contents(&state.workspace_dir()).map_err(internal_error)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "📂 Se han borrado todos los ficheros subidos." })),
    ))
}

/// Arranca el pipeline. La cadena de validación se ejecuta aquí, antes de
/// lanzar nada: un fallo de validación devuelve 400 y no llama al
/// colaborador externo.
#[axum::debug_handler]
async fn generate_handler(
    State(state): State<AppState>,
    Json(payload): Json<MeetingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Comprobación y reserva de la ejecución en la misma toma del lock:
    // dos peticiones simultáneas no pueden pasar las dos la puerta.
    {
        let mut status = state.status.lock().unwrap();
        if status.is_busy {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Ya hay una redacción en curso."})),
            ));
        }
        status.is_busy = true;
        status.stage = PipelineStage::Validating;
    }
    let release_busy = || state.status.lock().unwrap().is_busy = false;

    let documents = match workspace::list_documents(&state.workspace_dir()) {
        Ok(documents) => documents,
        Err(err) => {
            release_busy();
            return Err(internal_error(err));
        }
    };
    let validated = match pipeline::validate(&payload, &documents) {
        Ok(validated) => validated,
        Err(warning) => {
            let mut status = state.status.lock().unwrap();
            status.is_busy = false;
            status.stage = PipelineStage::Failed;
            status.message = warning.to_string();
            status.append_log(&warning.to_string());
            return Err(bad_request(warning));
        }
    };

    {
        let mut status = state.status.lock().unwrap();
        status.progress = 0.0;
        status.log.clear();
    }

    spawn(async move {
        let result = pipeline::run(&state, &validated).await;
        if let Err(err) = result {
            pipeline::record_failure(&state.status, &err);
        }

        state.status.lock().unwrap().is_busy = false;
    });

    Ok(StatusCode::ACCEPTED)
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.status.lock().unwrap().clone();
    let download_name = state
        .artifact
        .lock()
        .unwrap()
        .as_ref()
        .map(|a| a.download_name.clone());
    Json(StatusResponse {
        status,
        download_name,
    })
}

/// Descarga del acta de la última ejecución completada. 404 hasta que
/// exista una. El nombre de descarga (con caracteres no ASCII) lo aplica
/// el frontend; aquí sólo servimos los bytes como adjunto.
#[axum::debug_handler]
async fn download_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let artifact = state.artifact.lock().unwrap().clone();
    let Some(artifact) = artifact else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Todavía no hay ningún acta generada."})),
        ));
    };

    // Reapertura en binario inmediatamente después de la escritura.
    let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
        error!("No se pudo leer el acta {}: {e}", artifact.path.display());
        internal_error(e)
    })?;

    let mime = mime_guess::from_path(&artifact.path)
        .first_or_text_plain()
        .to_string();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        format!("{mime}; charset=utf-8").parse().map_err(internal_error)?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        "attachment".parse().map_err(internal_error)?,
    );

    Ok((headers, bytes))
}

// --- Handler de Apagado ---

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{agents::MinutesCrew, config::AppConfig};
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn test_state(tmp: &TempDir) -> AppState {
        let config = AppConfig {
            server_addr: "127.0.0.1:0".into(),
            upload_base_dir: tmp.path().to_string_lossy().to_string(),
            llm_chat_model: "o3-mini".into(),
        };
        let crew = MinutesCrew::from_config(&config);
        let (tx, _rx) = oneshot::channel();
        AppState::new(config, crew, tx)
    }

    fn request(name: &str, topic: &str) -> MeetingRequest {
        MeetingRequest {
            meeting_name: name.into(),
            meeting_topic: topic.into(),
        }
    }

    #[tokio::test]
    async fn second_start_while_busy_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);
        let dir = state.workspace_dir();
        workspace::ensure_dir(&dir).unwrap();
        workspace::save_document(&dir, "notas.txt", b"Presupuesto aprobado.").unwrap();

        let first = generate_handler(
            State(state.clone()),
            Json(request("Sync", "Presupuesto")),
        )
        .await;
        assert!(first.is_ok());

        // La primera petición reserva la ejecución antes de devolver 202;
        // una segunda inmediata debe chocar con la puerta, no arrancar otra.
        let second = generate_handler(
            State(state.clone()),
            Json(request("Sync", "Presupuesto")),
        )
        .await;
        let (code, _) = second.err().expect("la segunda petición debe rechazarse");
        assert_eq!(code, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn zero_files_start_writes_no_artifact() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);
        workspace::ensure_dir(&state.workspace_dir()).unwrap();

        let name = "Reunión sin ficheros";
        let result = generate_handler(
            State(state.clone()),
            Json(request(name, "Presupuesto")),
        )
        .await;
        let (code, _) = result.err().expect("sin ficheros debe rechazarse");
        assert_eq!(code, StatusCode::BAD_REQUEST);

        // Ni se crea ni se toca ningún acta como efecto colateral.
        assert!(!crate::export::artifact_path(name).exists());
        // Y el fallo de validación libera la puerta para el reintento.
        assert!(!state.status.lock().unwrap().is_busy);
    }
}
