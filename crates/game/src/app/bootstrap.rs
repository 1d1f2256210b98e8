use std::path::PathBuf;
use std::sync::Arc;

use plaza_engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{ClientConfig, ConfigError};
use super::net::{BackendError, NetSync, RestBackend, SystemClock};
use super::store::{resolve_identity, LocalStore};
use super::world::{LocalPlayer, WorldScene};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Paths(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to set up backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("failed to start network runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) asset_root: PathBuf,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");
    match dotenv {
        Ok(path) => info!(path = %path.display(), "dotenv_loaded"),
        Err(error) if error.not_found() => {}
        Err(error) => warn!(error = %error, "dotenv_unreadable"),
    }

    let paths = resolve_app_paths()?;
    let client = ClientConfig::from_env()?;
    let state_path = paths.root.join(&client.state_file);
    info!(
        root = %paths.root.display(),
        backend = %client.backend_url,
        state_file = %state_path.display(),
        "client_config"
    );

    let store = LocalStore::new(state_path);
    let identity = resolve_identity(
        &store.load(),
        client.player_name.as_deref(),
        &mut rand::rng(),
    );
    if let Err(error) = store.save(&identity.to_persisted()) {
        warn!(error = %error, "state_save_failed");
    }

    let backend = RestBackend::new(
        &client.backend_url,
        client.backend_key.clone(),
        client.http_timeout,
    )?;
    let net = NetSync::new(Arc::new(backend), Arc::new(SystemClock), identity.id.clone())
        .map_err(BootstrapError::Runtime)?;

    let config = LoopConfig {
        max_render_fps: client.max_render_fps,
        ..LoopConfig::default()
    };
    let local = LocalPlayer::new(identity.id, identity.name, identity.position);
    let scene = WorldScene::new(local, config.canvas())
        .with_network(net)
        .with_store(store);

    Ok(AppWiring {
        config,
        asset_root: paths.assets_dir,
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
