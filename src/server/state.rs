//! Server state and configuration.

use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::editor::{EditorSession, SnapshotStore};
use crate::error::CardstockError;
use crate::render::raster::Rasterizer;
use crate::render::resolve::ImageResolver;
use crate::template::Template;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// TTF font for sheet previews; previews are disabled without one.
    pub font_path: Option<PathBuf>,
    /// Snapshot directory; defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// The one editor session this server instance drives.
    pub session: RwLock<EditorSession>,
    pub resolver: RwLock<ImageResolver>,
    pub rasterizer: Option<Rasterizer>,
    pub snapshots: Option<SnapshotStore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, CardstockError> {
        let snapshots = config
            .data_dir
            .clone()
            .or_else(SnapshotStore::default_dir)
            .map(SnapshotStore::new);
        let rasterizer = match &config.font_path {
            Some(path) => Some(Rasterizer::from_font_file(path)?),
            None => None,
        };
        // Boot with an empty placeholder session; no store attached so the
        // placeholder never overwrites a real saved snapshot.
        let session = EditorSession::new("", "", Template::empty(), None);
        Ok(Self {
            config,
            session: RwLock::new(session),
            resolver: RwLock::new(ImageResolver::new()?),
            rasterizer,
            snapshots,
        })
    }
}
