//! Durable storage for transport credential state across restarts.
//!
//! The state is opaque to the relay: named blobs, written as a directory of
//! session files. As long as one save succeeded, a restart resumes the same
//! authenticated session without re-pairing. A transport that persists
//! credentials internally (e.g. the WhatsApp adapter's SQLite store) simply
//! never emits credential updates.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opaque credential state: session file name -> contents.
#[derive(Debug, Clone, Default)]
pub struct CredentialState {
    pub entries: HashMap<String, Vec<u8>>,
}

impl CredentialState {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load/save of transport credentials. `load` runs on every (re)connect;
/// `save` is invoked for every credential update the transport emits.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<CredentialState>;
    fn save(&self, state: &CredentialState) -> Result<()>;
}

/// Session store backed by a directory of files, one per credential entry.
/// A missing directory loads as the empty (unpaired) state.
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SessionStore for FsSessionStore {
    fn load(&self) -> Result<CredentialState> {
        let mut state = CredentialState::default();
        if !self.dir.exists() {
            return Ok(state);
        }
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("reading session directory {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading session file {}", path.display()))?;
            state.entries.insert(name.to_string(), bytes);
        }
        Ok(state)
    }

    fn save(&self, state: &CredentialState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating session directory {}", self.dir.display()))?;
        for (name, bytes) in &state.entries {
            let path = self.dir.join(name);
            std::fs::write(&path, bytes)
                .with_context(|| format!("writing session file {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session_dir() -> PathBuf {
        std::env::temp_dir().join(format!("warelay-session-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_directory_loads_empty() {
        let store = FsSessionStore::new(temp_session_dir());
        let state = store.load().expect("load");
        assert!(state.is_empty());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = temp_session_dir();
        let store = FsSessionStore::new(&dir);

        let mut state = CredentialState::default();
        state.entries.insert("creds.json".to_string(), b"{\"noiseKey\":\"x\"}".to_vec());
        state.entries.insert("app-state-1".to_string(), vec![0, 1, 2, 3]);
        store.save(&state).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(
            loaded.entries.get("creds.json").map(Vec::as_slice),
            Some(b"{\"noiseKey\":\"x\"}".as_slice())
        );
        assert_eq!(
            loaded.entries.get("app-state-1").map(Vec::as_slice),
            Some([0u8, 1, 2, 3].as_slice())
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_overwrites_existing_entries() {
        let dir = temp_session_dir();
        let store = FsSessionStore::new(&dir);

        let mut state = CredentialState::default();
        state.entries.insert("creds.json".to_string(), b"old".to_vec());
        store.save(&state).expect("save old");

        state.entries.insert("creds.json".to_string(), b"new".to_vec());
        store.save(&state).expect("save new");

        let loaded = store.load().expect("load");
        assert_eq!(
            loaded.entries.get("creds.json").map(Vec::as_slice),
            Some(b"new".as_slice())
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
