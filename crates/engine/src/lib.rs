use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod sprite_sheet;

pub use app::{
    centered_draw_position, run_app, AnimationClip, AnimationPlayer, AppError, BackgroundLayer,
    Camera2D, ChatBubbleView, ClipError, Direction, Drawable, FrameClock, InputLatch,
    InputSnapshot, KeyInput, KeyState, Keyframe, LoopConfig, LoopMetricsSnapshot, Renderer, Scene,
    SceneCommand, SceneFrame, SpriteFrame, StepPlan, Vec2, Viewport, ZoneOverlay,
    SLOW_FRAME_ENV_VAR,
};
pub use sprite_sheet::{SpriteKeyError, SpriteSheet};
pub use winit::keyboard::KeyCode;

pub const ROOT_ENV_VAR: &str = "PLAZA_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "PLAZA_ROOT is set but does not point to a valid project root: {path}\n\
A valid root contains assets/, or Cargo.toml next to crates/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root above {start_dir} or the working directory.\n\
Expected a directory containing assets/, or Cargo.toml next to crates/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/plaza\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    Ok(AppPaths { root, assets_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            let cwd = env::current_dir().ok();

            let candidates = exe_dir
                .ancestors()
                .chain(cwd.iter().flat_map(|dir| dir.ancestors()));
            find_root(candidates).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .find(|candidate| is_root_marker(candidate))
        .map(normalize_path)
}

fn is_root_marker(path: &Path) -> bool {
    let has_assets = path.join("assets").is_dir();
    let is_workspace = path.join("Cargo.toml").is_file() && path.join("crates").is_dir();
    has_assets || is_workspace
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
