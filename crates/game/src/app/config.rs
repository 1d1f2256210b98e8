use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub(crate) const BACKEND_URL_ENV_VAR: &str = "PLAZA_BACKEND_URL";
pub(crate) const BACKEND_KEY_ENV_VAR: &str = "PLAZA_BACKEND_KEY";
pub(crate) const PLAYER_NAME_ENV_VAR: &str = "PLAZA_PLAYER_NAME";
pub(crate) const STATE_FILE_ENV_VAR: &str = "PLAZA_STATE_FILE";
pub(crate) const HTTP_TIMEOUT_ENV_VAR: &str = "PLAZA_HTTP_TIMEOUT_MS";
pub(crate) const MAX_FPS_ENV_VAR: &str = "PLAZA_MAX_FPS";

const DEFAULT_STATE_FILE: &str = "plaza_state.json";
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("{var} must be set to the backend base url, e.g. https://project.example.co")]
    MissingBackendUrl { var: &'static str },
    #[error("{var} must be a positive number of milliseconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
    #[error("{var} must be a whole number of frames per second (0 disables the cap), got {value:?}")]
    InvalidFrameCap { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientConfig {
    pub(crate) backend_url: String,
    pub(crate) backend_key: Option<String>,
    /// Overrides the persisted display name when set.
    pub(crate) player_name: Option<String>,
    /// Relative paths resolve against the project root.
    pub(crate) state_file: PathBuf,
    pub(crate) http_timeout: Duration,
    pub(crate) max_render_fps: Option<u32>,
}

impl ClientConfig {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend_url = non_empty(BACKEND_URL_ENV_VAR).ok_or(ConfigError::MissingBackendUrl {
            var: BACKEND_URL_ENV_VAR,
        })?;
        let http_timeout = match non_empty(HTTP_TIMEOUT_ENV_VAR) {
            None => Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: HTTP_TIMEOUT_ENV_VAR,
                        value: raw,
                    })
                }
            },
        };
        let max_render_fps = match non_empty(MAX_FPS_ENV_VAR) {
            None => None,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => None,
                Ok(fps) => Some(fps),
                Err(_) => {
                    return Err(ConfigError::InvalidFrameCap {
                        var: MAX_FPS_ENV_VAR,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            backend_url,
            backend_key: non_empty(BACKEND_KEY_ENV_VAR),
            player_name: non_empty(PLAYER_NAME_ENV_VAR),
            state_file: non_empty(STATE_FILE_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            http_timeout,
            max_render_fps,
        })
    }
}
