//! Exportación del acta final a fichero.
//!
//! El nombre del fichero es función pura del nombre de la reunión (el tema
//! no interviene) y se escribe en el directorio de trabajo del proceso, no
//! en el workspace de sesión. Dos ejecuciones con el mismo nombre de
//! reunión sobrescriben el mismo fichero; gana el último escritor.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use tracing::info;

/// Nombre de descarga del acta: `회의록_<nombre>.txt`.
pub fn artifact_filename(meeting_name: &str) -> String {
    format!("회의록_{meeting_name}.txt")
}

/// Ruta determinista del acta en el directorio de trabajo del proceso.
pub fn artifact_path(meeting_name: &str) -> PathBuf {
    Path::new(".").join(artifact_filename(meeting_name))
}

/// Escribe el texto del acta (UTF-8, sobrescribiendo cualquier fichero
/// previo del mismo nombre) y devuelve la ruta escrita.
pub fn export(text: &str, meeting_name: &str) -> Result<PathBuf> {
    let path = artifact_path(meeting_name);
    write_artifact(&path, text)?;
    Ok(path)
}

fn write_artifact(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text)?;
    info!("Acta exportada en {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn filename_depends_only_on_meeting_name() {
        assert_eq!(artifact_filename("Sync semanal"), "회의록_Sync semanal.txt");
        // El mismo nombre con temas distintos produce la misma ruta.
        assert_eq!(artifact_path("Sync semanal"), artifact_path("Sync semanal"));
    }

    #[test]
    fn write_overwrites_previous_artifact() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(artifact_filename("Sync semanal"));

        write_artifact(&path, "primera versión").unwrap();
        write_artifact(&path, "segunda versión").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "segunda versión");
    }

    #[test]
    fn artifact_is_readable_right_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(artifact_filename("Retro"));

        write_artifact(&path, "Acta de la retro.").unwrap();
        // La descarga reabre el fichero en binario inmediatamente después
        // de escribirlo.
        let bytes = fs::read(&path).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "Acta de la retro.");
    }
}
