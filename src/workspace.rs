//! Workspace de sesión: un directorio por sesión bajo el directorio base,
//! con las operaciones de intake, listado y vaciado de documentos.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::models::{DocumentKind, SessionId};

/// Errores de la capa de ficheros del workspace.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Un `.txt` subido no es UTF-8 válido. Se propaga sin recuperación.
    #[error("el fichero '{filename}' no es texto UTF-8 válido")]
    Decode { filename: String },

    #[error("extensión no admitida para '{filename}' (se aceptan pdf, docx y txt)")]
    UnsupportedExtension { filename: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compone la ruta del workspace: `<base>/<session-id>`.
pub fn workspace_path(base: &str, session: &SessionId) -> PathBuf {
    Path::new(base).join(session.as_str())
}

/// Crea el directorio (con sus padres) si no existe. No falla si ya existe.
pub fn ensure_dir(path: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Vacía el workspace: si el directorio existe, lo elimina recursivamente y
/// lo recrea vacío en el acto. Si no existe, no hace nada (tampoco lo crea:
/// eso es cosa de `ensure_dir`). Seguro de llamar repetidamente.
pub fn delete_contents(path: &Path) -> Result<(), WorkspaceError> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        fs::create_dir_all(path)?;
        info!("Workspace vaciado: {}", path.display());
    }
    Ok(())
}

/// Persiste un documento subido en el workspace.
///
/// Los `.txt` se validan como UTF-8 y se escriben como texto; el resto
/// (pdf, docx) se escribe como bytes sin modificar. Un fichero con el mismo
/// nombre se sobrescribe en silencio.
pub fn save_document(
    directory: &Path,
    filename: &str,
    content: &[u8],
) -> Result<DocumentKind, WorkspaceError> {
    let kind = DocumentKind::from_filename(filename).ok_or_else(|| {
        WorkspaceError::UnsupportedExtension {
            filename: filename.to_string(),
        }
    })?;

    let file_path = directory.join(filename);

    if kind.is_text() {
        let text = std::str::from_utf8(content).map_err(|_| WorkspaceError::Decode {
            filename: filename.to_string(),
        })?;
        fs::write(&file_path, text)?;
    } else {
        fs::write(&file_path, content)?;
    }

    info!("Documento guardado: {}", file_path.display());
    Ok(kind)
}

/// Inventario de documentos: nombres de fichero en orden de listado del
/// directorio (sin garantía de orden). Vacío si el directorio no existe.
/// Lectura pura, sin mutación.
pub fn list_documents(directory: &Path) -> Result<Vec<String>, WorkspaceError> {
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}
