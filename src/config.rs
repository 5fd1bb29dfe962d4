//! Carga y gestión de configuración de la aplicación (OpenAI + directorios).

use std::env;
use anyhow::{anyhow, Result};

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    /// Directorio base bajo el que se crean los workspaces de sesión.
    pub upload_base_dir: String,

    /// Modelo de chat fijado para todo el proceso.
    pub llm_chat_model: String,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    ///
    /// `OPENAI_API_KEY` es obligatoria: el cliente de Rig la lee directamente
    /// del entorno, pero validamos su presencia aquí para fallar en el arranque
    /// y no en mitad de una ejecución del pipeline.
    pub fn from_env() -> Result<Self> {
        env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("Falta OPENAI_API_KEY en el entorno"))?;

        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3322".to_string());

        let upload_base_dir =
            env::var("UPLOAD_BASE_DIR").unwrap_or_else(|_| "dir".to_string());

        let llm_chat_model =
            env::var("OPENAI_MODEL_NAME").unwrap_or_else(|_| "o3-mini".to_string());

        Ok(Self {
            server_addr,
            upload_base_dir,
            llm_chat_model,
        })
    }
}
