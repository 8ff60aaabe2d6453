//! # HTTP Server for the Template Editor
//!
//! Drives one editor session over a JSON API and renders sheet previews.
//!
//! ## Usage
//!
//! ```bash
//! cardstock serve --listen 0.0.0.0:8080 --font DejaVuSans.ttf
//! ```

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::error::CardstockError;

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use cardstock::server::{ServerConfig, serve};
///
/// # async fn example() -> Result<(), cardstock::error::CardstockError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     font_path: None,
///     data_dir: None,
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CardstockError> {
    let app_state = Arc::new(AppState::new(config.clone())?);

    let app = Router::new()
        // Template and editor API
        .route("/api/template", get(handlers::template::current))
        .route("/api/template/open", post(handlers::template::open))
        .route("/api/template/reset", post(handlers::template::reset))
        .route("/api/selection", post(handlers::template::select))
        .route("/api/selection/all", post(handlers::template::select_all))
        .route("/api/groups/color", post(handlers::template::master_color))
        .route("/api/fields/move", post(handlers::template::move_field))
        .route("/api/fields/drag", post(handlers::template::drag))
        .route("/api/ui/collapse", post(handlers::template::collapse))
        .route("/api/export", get(handlers::template::export))
        // Print pipeline API
        .route("/api/sheets/preview", post(handlers::render::preview))
        .with_state(app_state);

    log::info!("cardstock server starting");
    log::info!("listening on {}", config.listen_addr);
    if config.font_path.is_none() {
        log::info!("no --font given; sheet previews are disabled");
    }

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            CardstockError::Server(format!("Failed to bind to {}: {e}", config.listen_addr))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| CardstockError::Server(e.to_string()))?;

    Ok(())
}
