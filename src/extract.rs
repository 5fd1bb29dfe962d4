//! Extracción de texto por formato (pdf, docx, txt) para alimentar a los
//! agentes. Cada función cubre una de las capacidades de búsqueda de
//! contenido sobre el workspace.

use std::{fs, io::Read, path::Path};

use anyhow::{anyhow, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::models::DocumentKind;

/// Extrae el texto de un documento del workspace según su extensión.
pub fn extract_text(path: &Path) -> Result<String> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let kind = DocumentKind::from_filename(&filename)
        .ok_or_else(|| anyhow!("Extensión no admitida: {}", filename))?;

    match kind {
        DocumentKind::Pdf => pdf_extract::extract_text(path)
            .map_err(|e| anyhow!("No se pudo extraer texto del PDF {}: {e}", path.display())),
        DocumentKind::Txt => fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el fichero de texto {}", path.display())),
        DocumentKind::Docx => extract_docx_text(path)
            .with_context(|| format!("No se pudo extraer texto del DOCX {}", path.display())),
    }
}

/// Un DOCX es un contenedor OOXML: abrimos el zip, sacamos
/// `word/document.xml` y recogemos los nodos de texto, emitiendo una línea
/// por párrafo (`w:p`).
fn extract_docx_text(path: &Path) -> Result<String> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| anyhow!("DOCX sin word/document.xml: {e}"))?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut out = String::new();
    let mut buf = Vec::new();
    // Sólo nos interesa el texto dentro de los runs (`w:t`); el resto del
    // XML (formato, estilos, espaciado entre nodos) se descarta.
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text_run = false,
            Event::End(e) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Event::Text(t) if in_text_run => out.push_str(&t.xml_content()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
