//! Modelos de dominio (sesión, documentos y petición de acta).

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Identificador de una sesión de trabajo.
///
/// Se deriva del instante de arranque de la sesión (ISO-8601) sustituyendo
/// los dos puntos, que algunos sistemas de ficheros no admiten en nombres
/// de directorio. Inmutable una vez generado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Local::now().to_rfc3339().replace(':', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tipos de documento admitidos en el workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Clasifica un nombre de fichero por su extensión (sin distinguir
    /// mayúsculas). `None` para extensiones no admitidas.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)?;
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Los ficheros de texto plano se escriben validando el contenido como
    /// UTF-8; el resto se persiste como bytes sin tocar.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Txt)
    }
}

/// Petición de redacción de un acta: nombre y tema de la reunión.
#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRequest {
    pub meeting_name: String,
    pub meeting_topic: String,
}

impl MeetingRequest {
    /// Valida la petición en el orden definido: primero el nombre, después
    /// el tema. Devuelve la petición con ambos campos ya recortados.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let meeting_name = self.meeting_name.trim();
        if meeting_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let meeting_topic = self.meeting_topic.trim();
        if meeting_topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        Ok(Self {
            meeting_name: meeting_name.to_string(),
            meeting_topic: meeting_topic.to_string(),
        })
    }
}

/// Fallos de validación previos al arranque del pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("⚠️ Introduce el nombre de la reunión")]
    EmptyName,
    #[error("⚠️ Introduce el tema de la reunión")]
    EmptyTopic,
    #[error("⚠️ No hay ficheros subidos. Sube primero algún documento")]
    NoDocuments,
}

/// Etapas del pipeline de redacción del acta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Idle,
    Validating,
    Gathering,
    Researching,
    Editing,
    Completed,
    Failed,
}
