//! Pipeline secuencial de redacción de actas:
//! `Validating → Gathering → Researching → Editing → Completed`.
//!
//! La validación se hace antes de lanzar la tarea (un fallo de validación
//! no arranca nada ni llama al proveedor). Las dos etapas de agente son
//! estrictamente secuenciales: el editor consume la salida del researcher
//! como única entrada. Los fallos del colaborador externo (API del LLM) no
//! se reintentan; quedan registrados como ejecución fallida.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    app_state::{AppState, ArtifactInfo, Status},
    export, extract,
    models::{MeetingRequest, PipelineStage, ValidationError},
    workspace,
};

/// Cadena de validación previa al arranque, en orden fijo: nombre de la
/// reunión, tema, inventario de documentos no vacío. Devuelve la petición
/// con los campos recortados.
pub fn validate(
    request: &MeetingRequest,
    documents: &[String],
) -> Result<MeetingRequest, ValidationError> {
    let validated = request.validated()?;
    if documents.is_empty() {
        return Err(ValidationError::NoDocuments);
    }
    Ok(validated)
}

/// Ejecuta el pipeline completo para una petición ya validada y devuelve
/// el acta exportada. Actualiza el `Status` compartido etapa a etapa para
/// el registro de progreso que sondea el frontend.
pub async fn run(state: &AppState, request: &MeetingRequest) -> Result<ArtifactInfo> {
    let run_id = Uuid::new_v4();
    let dir = state.workspace_dir();
    info!("Ejecución {run_id}: acta '{}' sobre '{}'", request.meeting_name, request.meeting_topic);

    // --- Gathering: extraer el texto de los documentos del workspace ---
    set_stage(
        &state.status,
        PipelineStage::Gathering,
        &format!("🔹 Iniciando la redacción del acta sobre '{}'...", request.meeting_topic),
        0.05,
    );

    let documents = workspace::list_documents(&dir)?;
    {
        let mut status = state.status.lock().unwrap();
        status.append_log(&format!("📄 Analizando {} ficheros...", documents.len()));
    }

    let corpus = gather_corpus(&dir, &documents, &state.status)?;
    if corpus.trim().is_empty() {
        let mut status = state.status.lock().unwrap();
        status.append_log("⚠️ No se pudo extraer texto de ningún documento.");
    }

    // --- Researching ---
    set_stage(
        &state.status,
        PipelineStage::Researching,
        "🔍 Análisis IA en curso (tarda 1-2 minutos)...",
        0.4,
    );
    let research = state
        .crew
        .run_researcher(&request.meeting_topic, &corpus)
        .await?;

    // --- Editing: dependencia secuencial estricta sobre la investigación ---
    set_stage(
        &state.status,
        PipelineStage::Editing,
        "✍️ Redactando el acta definitiva...",
        0.75,
    );
    let minutes = state
        .crew
        .run_editor(&request.meeting_name, &request.meeting_topic, &research)
        .await?;

    // --- Completed: exportar y habilitar la descarga ---
    let path = export::export(&minutes, &request.meeting_name)?;
    let artifact = ArtifactInfo {
        path,
        download_name: export::artifact_filename(&request.meeting_name),
    };
    *state.artifact.lock().unwrap() = Some(artifact.clone());

    {
        let mut status = state.status.lock().unwrap();
        status.stage = PipelineStage::Completed;
        status.progress = 1.0;
        status.append_log(&format!("\n🔹 Resultado:\n{minutes}"));
        status.append_log(&format!(
            "✅ Acta sobre '{}' completada.",
            request.meeting_topic
        ));
        status.message = format!("Acta '{}' lista para descargar.", artifact.download_name);
    }

    info!("Ejecución {run_id} completada: {}", artifact.path.display());
    Ok(artifact)
}

/// Concatena el texto extraído de cada documento del workspace, una
/// sección por fichero. Un fallo de extracción no aborta la ejecución:
/// se registra y el fichero se omite.
fn gather_corpus(
    dir: &std::path::Path,
    documents: &[String],
    status_arc: &Arc<Mutex<Status>>,
) -> Result<String> {
    let total = documents.len();
    let mut corpus = String::new();

    for (index, name) in documents.iter().enumerate() {
        {
            let mut status = status_arc.lock().unwrap();
            status.message = format!("[{}/{}] Procesando: {}...", index + 1, total, name);
            status.progress = 0.05 + 0.3 * (index + 1) as f32 / total as f32;
        }

        match extract::extract_text(&dir.join(name)) {
            Ok(text) => {
                corpus.push_str(&format!("### {name}\n\n{text}\n\n"));
            }
            Err(err) => {
                warn!("Omitiendo {name}: {err:#}");
                let mut status = status_arc.lock().unwrap();
                status.append_log(&format!("⚠️ Omitido '{name}': no se pudo extraer el texto."));
            }
        }
    }

    Ok(corpus)
}

/// Marca el fallo de una ejecución en el estado compartido. El error del
/// colaborador externo se registra tal cual; no hay reintento ni acta
/// parcial.
pub fn record_failure(status_arc: &Arc<Mutex<Status>>, err: &anyhow::Error) {
    error!("Pipeline fallido: {err:#}");
    let mut status = status_arc.lock().unwrap();
    status.stage = PipelineStage::Failed;
    status.append_log(&format!("❌ Error en la ejecución: {err:#}"));
    status.message = format!("Error en la ejecución: {err}");
}

fn set_stage(status_arc: &Arc<Mutex<Status>>, stage: PipelineStage, message: &str, progress: f32) {
    let mut status = status_arc.lock().unwrap();
    status.stage = stage;
    status.message = message.to_string();
    status.progress = progress;
    status.append_log(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn request(name: &str, topic: &str) -> MeetingRequest {
        MeetingRequest {
            meeting_name: name.into(),
            meeting_topic: topic.into(),
        }
    }

    fn empty_status() -> Arc<Mutex<Status>> {
        Arc::new(Mutex::new(Status {
            is_busy: false,
            stage: PipelineStage::Idle,
            message: String::new(),
            progress: 0.0,
            log: String::new(),
        }))
    }

    #[test]
    fn validation_checks_in_order() {
        let docs = vec!["notas.txt".to_string()];

        // Nombre antes que tema, tema antes que inventario.
        assert_eq!(
            validate(&request(" ", ""), &[]).unwrap_err(),
            ValidationError::EmptyName
        );
        assert_eq!(
            validate(&request("Sync", "  "), &[]).unwrap_err(),
            ValidationError::EmptyTopic
        );
        assert_eq!(
            validate(&request("Sync", "Presupuesto"), &[]).unwrap_err(),
            ValidationError::NoDocuments
        );

        let ok = validate(&request(" Sync ", " Presupuesto "), &docs).unwrap();
        assert_eq!(ok.meeting_name, "Sync");
        assert_eq!(ok.meeting_topic, "Presupuesto");
    }

    #[test]
    fn gather_corpus_concatenates_documents() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "Presupuesto aprobado.").unwrap();
        fs::write(tmp.path().join("b.txt"), "Próxima revisión en marzo.").unwrap();

        let docs = vec!["a.txt".to_string(), "b.txt".to_string()];
        let corpus = gather_corpus(tmp.path(), &docs, &empty_status()).unwrap();

        assert!(corpus.contains("### a.txt"));
        assert!(corpus.contains("Presupuesto aprobado."));
        assert!(corpus.contains("### b.txt"));
        assert!(corpus.contains("Próxima revisión en marzo."));
    }

    #[test]
    fn gather_corpus_skips_broken_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bueno.txt"), "Contenido útil.").unwrap();
        // Un PDF corrupto no se puede extraer; debe omitirse sin abortar.
        fs::write(tmp.path().join("roto.pdf"), b"no soy un pdf").unwrap();

        let docs = vec!["bueno.txt".to_string(), "roto.pdf".to_string()];
        let status = empty_status();
        let corpus = gather_corpus(tmp.path(), &docs, &status).unwrap();

        assert!(corpus.contains("Contenido útil."));
        assert!(!corpus.contains("roto.pdf\n"));
        assert!(status.lock().unwrap().log.contains("Omitido 'roto.pdf'"));
    }

    #[test]
    fn record_failure_marks_the_run_as_failed() {
        let status = empty_status();
        record_failure(&status, &anyhow::anyhow!("límite de peticiones"));
        let status = status.lock().unwrap();
        assert_eq!(status.stage, PipelineStage::Failed);
        assert!(status.log.contains("límite de peticiones"));
    }
}
