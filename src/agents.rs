//! Abstracción sobre Rig para los dos agentes del pipeline de actas:
//! el investigador (Researcher) y el editor (Editor). Ambos comparten el
//! contrato de fundamentación: citar fuentes de los documentos o declarar
//! explícitamente que no se encontró ninguna, sin inventar contenido.

use crate::config::AppConfig;
use anyhow::Result;
use rig::completion::Prompt;

/// Contrato de fundamentación común a los dos roles. Se pasa como
/// instrucción al agente externo; este sistema no lo verifica mecánicamente.
const GROUNDING_CONTRACT: &str = r#"
Tu respuesta debe basarse en fuentes verificadas, datos o documentos suministrados.
- Cita siempre la fuente. Si no existe fuente, responde explícitamente "No se encontró ninguna fuente.".
- No incluyas información que no sea fiable.
- No generes jamás contenido ambiguo o sin verificar.
"#;

const RESEARCHER_PREAMBLE: &str = r#"
Eres un consultor sénior y researcher.
Produces siempre el mejor resultado de investigación a partir de múltiples fuentes de información.
Compruebas que cada fuente es real e incluyes ejemplos concretos y conclusiones.
"#;

const EDITOR_PREAMBLE: &str = r#"
Eres un editor profesional con años de experiencia en edición de documentos.
Ordenas el flujo lógico, mejoras la legibilidad de las frases y no omites información importante.
Resumes las discusiones clave del acta y estructuras decisiones y acciones de seguimiento.
Mantienes un estilo de redacción profesional en un formato fácil de leer.
"#;

/// Pareja de agentes secuenciales que redactan el acta.
#[derive(Debug, Clone)]
pub struct MinutesCrew {
    pub chat_model: String,
}

impl MinutesCrew {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            chat_model: cfg.llm_chat_model.clone(),
        }
    }

    /// Primera etapa: el researcher analiza todos los documentos subidos
    /// sobre el tema indicado. `corpus` es el texto extraído del workspace,
    /// concatenado por documento.
    pub async fn run_researcher(&self, topic: &str, corpus: &str) -> Result<String> {
        use rig::client::CompletionClient as _;
        use rig::providers::openai;

        let client = openai::Client::from_env();

        let preamble = format!("{RESEARCHER_PREAMBLE}\n{GROUNDING_CONTRACT}");
        let context = format!("Documentos subidos (pdf, docx, txt):\n\n{corpus}");

        let agent = client
            .agent(&self.chat_model)
            .preamble(&preamble)
            .context(&context)
            .build();

        let task = format!(
            "Recopila y analiza la información sobre '{topic}'. \
             Analiza todos los ficheros suministrados y entrega la \
             investigación organizada y resumida."
        );

        let answer = agent.prompt(&task).await?;
        Ok(answer)
    }

    /// Segunda etapa: el editor redacta el acta definitiva. Su única
    /// entrada es la salida del researcher, en estricta dependencia
    /// secuencial.
    pub async fn run_editor(
        &self,
        meeting_name: &str,
        topic: &str,
        research: &str,
    ) -> Result<String> {
        use rig::client::CompletionClient as _;
        use rig::providers::openai;

        let client = openai::Client::from_env();

        let preamble = format!("{EDITOR_PREAMBLE}\n{GROUNDING_CONTRACT}");
        let context = format!("Resultado de la investigación:\n\n{research}");

        let agent = client
            .agent(&self.chat_model)
            .preamble(&preamble)
            .context(&context)
            .build();

        let task = format!(
            "Redacta el acta de la reunión '{meeting_name}' cuyo tema es \
             '{topic}'. Revisa y pule el resultado de la investigación hasta \
             dejar un documento terminado."
        );

        let answer = agent.prompt(&task).await?;
        Ok(answer)
    }
}
