// Módulos de la aplicación
mod agents;
mod api;
mod app_state;
mod config;
mod export;
mod extract;
mod models;
mod pipeline;
mod workspace;

use crate::agents::MinutesCrew;
use crate::app_state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tokio::sync::oneshot;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Los documentos de reunión (pdf/docx) pueden ser grandes; subimos el
// límite por defecto de axum para el multipart.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración (valida la presencia de OPENAI_API_KEY)
    let cfg = config::AppConfig::from_env().expect("Error al cargar la configuración");

    // 3. Inicializar los agentes de redacción
    let crew = MinutesCrew::from_config(&cfg);

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 4. Crear estado compartido de la aplicación
    let app_state = AppState::new(cfg, crew, shutdown_tx);

    // 5. Fijar la sesión y crear su workspace (una sesión por proceso)
    let workspace_dir = app_state.workspace_dir();
    workspace::ensure_dir(&workspace_dir).expect("Error creando el workspace de la sesión");
    info!(
        "Sesión {} con workspace en {}",
        app_state.ensure_session_id(),
        workspace_dir.display()
    );

    // 6. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .fallback_service(ServeDir::new("frontend"))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 7. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .unwrap();
    let server_url = format!("http://{}", server_addr);
    info!("🚀 Servidor escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if webbrowser::open(&server_url).is_err() {
        info!("No se pudo abrir el navegador. Por favor, accede a {} manualmente.", server_url);
    }

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await
        .unwrap();

    info!("✅ Servidor cerrado correctamente.");
}
