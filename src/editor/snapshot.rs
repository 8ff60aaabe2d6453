//! Snapshot persistence for the editor session.
//!
//! One keyed slot on disk holding the full working state, including
//! non-exported bookkeeping (field ids, the id generator, UI collapse
//! flags). A snapshot is only restored when its recorded
//! `(idType, templateType)` pair matches the caller's current selection;
//! anything else falls through to a fresh fetch. Unparseable files are
//! deleted and treated as absent.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::{SelectionState, UiState};
use crate::error::CardstockError;
use crate::template::{FieldIdGen, Template};

const SNAPSHOT_FILE_NAME: &str = "editor-snapshot.json";

/// The persisted working state of an editor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id_type: String,
    pub template_type: String,
    pub template: Template,
    pub selection: SelectionState,
    pub ui: UiState,
    pub ids: FieldIdGen,
}

/// Single-slot snapshot store in a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE_NAME),
        }
    }

    /// Per-user default data directory, when the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("cardstock"))
    }

    /// Write the snapshot, creating the directory if needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), CardstockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, snapshot)?;
        Ok(())
    }

    /// Load the snapshot recorded for this exact key.
    ///
    /// Returns `None` when there is no snapshot, when the stored key does
    /// not match, or when the file cannot be parsed (in which case it is
    /// removed so the next load does not trip over it again).
    pub fn load(&self, id_type: &str, template_type: &str) -> Option<Snapshot> {
        if !self.path.exists() {
            return None;
        }
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return None,
        };
        let reader = BufReader::new(file);
        let snapshot: Snapshot = match serde_json::from_reader(reader) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("discarding corrupt editor snapshot: {e}");
                let _ = fs::remove_file(&self.path);
                return None;
            }
        };
        if snapshot.id_type != id_type || snapshot.template_type != template_type {
            return None;
        }
        Some(snapshot)
    }

    /// Delete any saved snapshot, regardless of its key.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("failed to clear editor snapshot: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorSession;
    use crate::template::{Face, Px};
    use pretty_assertions::assert_eq;

    fn template() -> Template {
        let mut ids = FieldIdGen::new();
        Template::from_json(
            r#"{"front": {"items": [
                {"type": "text", "text": "Name:", "left": "10px", "top": "10px"},
                {"type": "text", "text": "{{name}}"}
            ]}}"#,
            &mut ids,
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let session = EditorSession::new("student", "1", template(), Some(store.clone()));
        let expected = session.snapshot();

        let loaded = store.load("student", "1").unwrap();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_key_mismatch_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let _session = EditorSession::new("student", "1", template(), Some(store.clone()));

        assert!(store.load("staff", "1").is_none());
        assert!(store.load("student", "2").is_none());
        assert!(store.load("student", "1").is_some());
    }

    #[test]
    fn test_corrupt_snapshot_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(dir.path().join(SNAPSHOT_FILE_NAME), "{not json").unwrap();

        assert!(store.load("student", "1").is_none());
        assert!(!dir.path().join(SNAPSHOT_FILE_NAME).exists());
    }

    #[test]
    fn test_clear_is_unconditional() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let _session = EditorSession::new("student", "1", template(), Some(store.clone()));

        store.clear();
        assert!(store.load("student", "1").is_none());
        // Clearing an already-empty store is fine.
        store.clear();
    }

    #[test]
    fn test_restore_resumes_in_progress_edit() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        let id = {
            let mut session = EditorSession::new("student", "1", template(), Some(store.clone()));
            let id = session.template().front.items[0].id;
            session.begin_drag(Face::Front, id, (0.0, 0.0)).unwrap();
            session.update_drag((15.0, 20.0));
            session.end_drag();
            id
        };

        let snapshot = store.load("student", "1").unwrap();
        let restored = EditorSession::restore(snapshot, Some(store));
        let field = restored.template().front.field(id).unwrap();
        assert_eq!(field.left, Px(25.0));
        assert_eq!(field.top, Px(30.0));
    }

    #[test]
    fn test_restored_session_never_reuses_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let _session = EditorSession::new("student", "1", template(), Some(store.clone()));

        let snapshot = store.load("student", "1").unwrap();
        let existing: Vec<_> = snapshot.template.front.items.iter().map(|f| f.id).collect();
        let mut restored = EditorSession::restore(snapshot, None);
        let fresh = restored.add_field(Face::Front, crate::template::Field::text("Class:"));
        assert!(!existing.contains(&fresh));
    }
}
