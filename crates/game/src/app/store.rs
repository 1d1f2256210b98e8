use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plaza_engine::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub(crate) const DEFAULT_POSITION: Vec2 = Vec2::new(300.0, 300.0);
const MAX_NAME_CHARS: usize = 12;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("failed to write state file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SavedPosition {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl SavedPosition {
    pub(crate) fn from_world(position: Vec2) -> Self {
        Self {
            x: position.x.round() as i32,
            y: position.y.round() as i32,
        }
    }

    fn to_world(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PersistedState {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) player_id: Option<String>,
    #[serde(default)]
    pub(crate) position: Option<SavedPosition>,
}

/// Who the local player is this session.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Identity {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) position: Vec2,
}

/// JSON file holding the local identity and last position between sessions.
#[derive(Debug, Clone)]
pub(crate) struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files yield the defaults.
    pub(crate) fn load(&self) -> PersistedState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state_file_missing");
                return PersistedState::default();
            }
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "state_file_unreadable");
                return PersistedState::default();
            }
        };

        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        match serde_path_to_error::deserialize::<_, PersistedState>(&mut deserializer) {
            Ok(state) => state,
            Err(error) => {
                let path = error.path().to_string();
                warn!(
                    file = %self.path.display(),
                    path = %path,
                    error = %error.into_inner(),
                    "state_file_corrupt"
                );
                PersistedState::default()
            }
        }
    }

    pub(crate) fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        write_text_atomic(&self.path, &json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Fills whatever the persisted state lacks. `name_override` wins over the saved name.
pub(crate) fn resolve_identity(
    state: &PersistedState,
    name_override: Option<&str>,
    rng: &mut impl Rng,
) -> Identity {
    let id = state
        .player_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();
    let name = name_override
        .or(state.name.as_deref())
        .map(clean_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Player{}", rng.random_range(0..1000)));
    let position = state
        .position
        .map(SavedPosition::to_world)
        .unwrap_or(DEFAULT_POSITION);
    Identity { id, name, position }
}

impl Identity {
    pub(crate) fn to_persisted(&self) -> PersistedState {
        PersistedState {
            name: Some(self.name.clone()),
            player_id: Some(self.id.clone()),
            position: Some(SavedPosition::from_world(self.position)),
        }
    }
}

fn clean_name(raw: &str) -> String {
    raw.trim().chars().take(MAX_NAME_CHARS).collect()
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("state");
    path.with_file_name(format!("{file_name}.tmp"))
}
